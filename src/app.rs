// SPDX-License-Identifier: MPL-2.0

//! Wires the stores, the repository and the services together for one run.

use crate::api::{HttpSyncClient, SyncClient};
use crate::cache::{KeyValueDb, SnapshotStore};
use crate::config::{PROBE_TIMEOUT_MS, STORE_FILE_NAME};
use crate::messages::AppError;
use crate::reachability::{Reachability, ReachabilityFlag, TcpProbe};
use crate::repository::{CatalogInfo, SignRepository, StaticBundleSource, SyncedRemoteSource};
use crate::state::{AppSettings, CategoryIndex, DataMode, FavoritesStore, SearchController, SyncService};
use crate::video::VideoResolver;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Effective configuration: persisted settings with per-run overrides applied.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub data_mode: DataMode,
    pub bundle_path: Option<PathBuf>,
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Keep favorites and the last sync date in memory only.
    pub ephemeral: bool,
}

impl From<&AppSettings> for AppOptions {
    fn from(settings: &AppSettings) -> Self {
        Self {
            data_mode: settings.data_mode,
            bundle_path: settings.bundle_path.clone(),
            api_base_url: settings.api_base_url.clone(),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            data_dir: None,
            ephemeral: false,
        }
    }
}

/// What is stored locally, gathered without resolving the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatus {
    pub snapshot_path: PathBuf,
    pub on_disk: bool,
    /// Sign and category counts read from the snapshot file.
    pub snapshot_counts: Option<(usize, usize)>,
    /// Always `None` in bundle mode.
    pub last_sync: Option<DateTime<Utc>>,
    /// Only set when a catalog was already in memory.
    pub loaded: Option<CatalogInfo>,
}

pub struct Dictionary {
    pub repository: Arc<SignRepository>,
    pub categories: Arc<CategoryIndex>,
    pub favorites: FavoritesStore,
    pub videos: VideoResolver,
    pub store: SnapshotStore,
    sync: Option<SyncService>,
}

impl Dictionary {
    /// Build everything for `options`. Must run inside a tokio runtime.
    pub fn open(options: &AppOptions) -> Result<Self, AppError> {
        let data_dir = match &options.data_dir {
            Some(dir) => dir.clone(),
            None => SnapshotStore::default_dir()?,
        };
        let store = SnapshotStore::new(&data_dir);
        let kv = if options.ephemeral {
            KeyValueDb::open_in_memory()?
        } else {
            KeyValueDb::open(&data_dir.join(STORE_FILE_NAME))?
        };
        let categories = Arc::new(CategoryIndex::new());

        let (repository, sync) = match options.data_mode {
            DataMode::Bundle => {
                let path = options.bundle_path.clone().ok_or_else(|| {
                    AppError::Usage("Не указан путь к файлу словаря".to_string())
                })?;
                info!(path = %path.display(), "using bundled data");
                (Arc::new(SignRepository::new(StaticBundleSource::new(path))), None)
            }
            DataMode::Sync => {
                let client = HttpSyncClient::with_timeout(
                    &options.api_base_url,
                    options.request_timeout,
                )?;
                let reachability: Arc<dyn Reachability> =
                    match TcpProbe::for_endpoint(client.base(), Duration::from_millis(PROBE_TIMEOUT_MS)) {
                        Some(probe) => Arc::new(probe),
                        // No host to probe; let the transport decide.
                        None => Arc::new(ReachabilityFlag::new(true)),
                    };
                info!(base = %client.base(), "using sync backend");

                let client: Arc<dyn SyncClient> = Arc::new(client);
                let repository = Arc::new(SignRepository::new(SyncedRemoteSource::new(
                    Arc::clone(&client),
                    store.clone(),
                    reachability,
                )));
                let sync = SyncService::new(
                    client,
                    store.clone(),
                    kv.clone(),
                    Arc::clone(&repository),
                    Arc::clone(&categories),
                );
                (repository, Some(sync))
            }
        };

        Ok(Self {
            repository,
            categories,
            favorites: FavoritesStore::spawn(kv)?,
            videos: VideoResolver::new(),
            store,
            sync,
        })
    }

    /// `None` in bundle mode.
    pub fn sync_service(&self) -> Option<&SyncService> {
        self.sync.as_ref()
    }

    pub fn search(&self) -> SearchController {
        SearchController::new(Arc::clone(&self.repository))
    }

    /// Never touches the network.
    pub async fn cache_status(&self) -> CacheStatus {
        let snapshot_counts = match self.store.load_async().await {
            Ok(data) => data.map(|d| (d.signs.len(), d.categories.len())),
            Err(e) => {
                warn!(error = %e, "snapshot unreadable");
                None
            }
        };
        let last_sync = match &self.sync {
            Some(service) => service.last_sync().await,
            None => None,
        };
        CacheStatus {
            snapshot_path: self.store.path(),
            on_disk: self.store.exists(),
            snapshot_counts,
            last_sync,
            loaded: self.repository.loaded_info().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SignsBundle;
    use crate::state::load_favorite_signs;
    use crate::testing::sample_sync_data;
    use tempfile::tempdir;

    fn bundle_options(dir: &std::path::Path) -> AppOptions {
        let data = sample_sync_data();
        let bundle = SignsBundle {
            total_signs: data.signs.len(),
            total_categories: data.categories.len(),
            signs: data.signs,
            categories: data.categories,
            version: None,
            last_updated: None,
        };
        let path = dir.join("signs_data.json");
        std::fs::write(&path, serde_json::to_vec(&bundle).unwrap()).unwrap();

        AppOptions {
            data_mode: DataMode::Bundle,
            bundle_path: Some(path),
            data_dir: Some(dir.join("data")),
            ephemeral: false,
            ..AppOptions::from(&AppSettings::default())
        }
    }

    #[tokio::test]
    async fn test_bundle_mode_end_to_end() {
        let dir = tempdir().unwrap();
        let app = Dictionary::open(&bundle_options(dir.path())).unwrap();
        assert!(app.sync_service().is_none());

        app.categories.load(&app.repository).await.unwrap();
        assert_eq!(app.categories.name("animals"), "Животные");

        app.favorites.add("3").await.unwrap();
        app.favorites.add("gone").await.unwrap();
        let favs = load_favorite_signs(&app.favorites, &app.repository).await.unwrap();
        assert_eq!(favs.signs[0].word, "Кошка");
        assert_eq!(favs.unresolved, ["gone"]);

        let sign = app.repository.get_sign("1").await.unwrap().unwrap();
        assert_eq!(app.videos.video_url(&sign).unwrap().as_str(), "https://cdn.example/1.mp4");
    }

    #[tokio::test]
    async fn test_favorites_persist_across_opens() {
        let dir = tempdir().unwrap();
        let options = bundle_options(dir.path());
        {
            let app = Dictionary::open(&options).unwrap();
            app.favorites.add("2").await.unwrap();
        }
        let app = Dictionary::open(&options).unwrap();
        assert_eq!(app.favorites.list(), ["2"]);
    }

    #[tokio::test]
    async fn test_cache_status_reads_snapshot_without_resolving() {
        let dir = tempdir().unwrap();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let options = AppOptions {
            data_mode: DataMode::Sync,
            api_base_url: format!("http://127.0.0.1:{port}"),
            ephemeral: true,
            ..bundle_options(dir.path())
        };
        SnapshotStore::new(dir.path().join("data"))
            .save(&sample_sync_data())
            .unwrap();
        let app = Dictionary::open(&options).unwrap();

        let status = app.cache_status().await;
        assert!(status.on_disk);
        assert_eq!(status.snapshot_counts, Some((4, 2)));
        assert_eq!(status.last_sync, None);
        assert_eq!(status.loaded, None);
        assert!(!app.repository.is_loaded().await);
        assert!(app.repository.last_fallback().is_none());
    }

    #[tokio::test]
    async fn test_cache_status_reports_loaded_catalog() {
        let dir = tempdir().unwrap();
        let app = Dictionary::open(&bundle_options(dir.path())).unwrap();

        let status = app.cache_status().await;
        assert!(!status.on_disk);
        assert_eq!(status.snapshot_counts, None);
        assert_eq!(status.loaded, None);

        app.repository.load_all_signs().await.unwrap();
        let loaded = app.cache_status().await.loaded.unwrap();
        assert_eq!((loaded.signs, loaded.categories), (4, 2));
    }

    #[tokio::test]
    async fn test_bundle_mode_requires_path() {
        let dir = tempdir().unwrap();
        let options = AppOptions {
            bundle_path: None,
            ..bundle_options(dir.path())
        };
        assert!(matches!(Dictionary::open(&options), Err(AppError::Usage(_))));
    }

    #[tokio::test]
    async fn test_sync_mode_rejects_bad_endpoint() {
        let dir = tempdir().unwrap();
        let options = AppOptions {
            data_mode: DataMode::Sync,
            api_base_url: "mailto:someone@example.com".to_string(),
            ..bundle_options(dir.path())
        };
        assert!(matches!(Dictionary::open(&options), Err(AppError::Sync(_))));
    }
}
