// SPDX-License-Identifier: MPL-2.0

//! Explicit "check for updates, then pull everything" flow.

use crate::api::{SyncClient, SyncError};
use crate::cache::{CacheError, KeyValueDb, SnapshotStore};
use crate::config::LAST_SYNC_KEY;
use crate::messages::UserMessage;
use crate::model::timestamp;
use crate::repository::{Catalog, SignRepository, SignRepositoryError};
use crate::state::CategoryIndex;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SyncRunError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Data(#[from] SignRepositoryError),
}

impl SyncRunError {
    /// Text for the user, or `None` when the failure should stay silent.
    pub fn user_visible(&self) -> Option<String> {
        match self {
            SyncRunError::Sync(e) => user_visible_error(e),
            SyncRunError::Cache(e) => Some(e.user_message()),
            SyncRunError::Data(e) => Some(e.user_message()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    UpToDate {
        last_updated: DateTime<Utc>,
    },
    Updated {
        signs: usize,
        categories: usize,
        last_updated: DateTime<Utc>,
    },
}

pub struct SyncService {
    client: Arc<dyn SyncClient>,
    store: SnapshotStore,
    kv: KeyValueDb,
    repository: Arc<SignRepository>,
    categories: Arc<CategoryIndex>,
    // One sync at a time.
    running: Mutex<()>,
}

impl SyncService {
    pub fn new(
        client: Arc<dyn SyncClient>,
        store: SnapshotStore,
        kv: KeyValueDb,
        repository: Arc<SignRepository>,
        categories: Arc<CategoryIndex>,
    ) -> Self {
        Self {
            client,
            store,
            kv,
            repository,
            categories,
            running: Mutex::new(()),
        }
    }

    /// Ask the server whether anything changed since the last sync and pull
    /// the full data set if so. A missing snapshot always forces a pull.
    pub async fn sync(&self) -> Result<SyncOutcome, SyncRunError> {
        let _guard = self.running.lock().await;

        let last = self.last_sync().await;
        let meta = self.client.check_for_updates(last).await?;
        if !meta.has_updates && self.store.exists() {
            debug!(last_updated = %timestamp::format(&meta.last_updated), "already up to date");
            return Ok(SyncOutcome::UpToDate {
                last_updated: meta.last_updated,
            });
        }
        self.pull().await
    }

    /// Pull everything regardless of what the server says changed.
    pub async fn force_sync(&self) -> Result<SyncOutcome, SyncRunError> {
        let _guard = self.running.lock().await;
        self.pull().await
    }

    async fn pull(&self) -> Result<SyncOutcome, SyncRunError> {
        let data = self.client.fetch_all_data().await?;

        // Reject before anything is written.
        Catalog::from_sync(data.clone())?;

        self.store.save_async(data.clone()).await?;
        let stamp = timestamp::format(&data.last_updated);
        self.kv
            .blocking(move |kv| kv.set(LAST_SYNC_KEY, &stamp))
            .await?;

        let outcome = SyncOutcome::Updated {
            signs: data.signs.len(),
            categories: data.categories.len(),
            last_updated: data.last_updated,
        };
        let categories = data.categories.clone();
        self.repository.install(data).await?;
        self.categories.replace(&categories);

        info!(?outcome, "sync complete");
        Ok(outcome)
    }

    /// When the data was last pulled, by the server's clock.
    pub async fn last_sync(&self) -> Option<DateTime<Utc>> {
        let stored = self
            .kv
            .blocking(|kv| kv.get::<String>(LAST_SYNC_KEY))
            .await;
        let raw = match stored {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "could not read last sync date");
                return None;
            }
        };
        timestamp::parse(&raw)
            .map_err(|e| warn!(value = %raw, error = %e, "ignoring malformed last sync date"))
            .ok()
    }
}

/// `None` for missing connectivity, which is not worth interrupting the user
/// for; the mapped message otherwise.
pub fn user_visible_error(error: &SyncError) -> Option<String> {
    match error {
        SyncError::NoConnectivity => None,
        e => Some(e.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SyncMetadata;
    use crate::repository::SyncedRemoteSource;
    use crate::testing::{FakeSyncClient, FixedReachability, sample_sync_data, sign};
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _dir: TempDir,
        store: SnapshotStore,
        kv: KeyValueDb,
        client: Arc<FakeSyncClient>,
        repository: Arc<SignRepository>,
        categories: Arc<CategoryIndex>,
        service: SyncService,
    }

    fn fixture(client: FakeSyncClient) -> Fixture {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let kv = KeyValueDb::open_in_memory().unwrap();
        let client = Arc::new(client);
        // The repository itself is offline so only the service talks to the client.
        let repository = Arc::new(SignRepository::new(SyncedRemoteSource::new(
            client.clone(),
            store.clone(),
            Arc::new(FixedReachability(false)),
        )));
        let categories = Arc::new(CategoryIndex::new());
        let service = SyncService::new(
            client.clone(),
            store.clone(),
            kv.clone(),
            Arc::clone(&repository),
            Arc::clone(&categories),
        );
        Fixture {
            _dir: dir,
            store,
            kv,
            client,
            repository,
            categories,
            service,
        }
    }

    #[tokio::test]
    async fn test_sync_pulls_and_installs() {
        let f = fixture(FakeSyncClient::serving(sample_sync_data()));
        assert_eq!(f.service.last_sync().await, None);

        let outcome = f.service.sync().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Updated {
                signs: 4,
                categories: 2,
                last_updated: sample_sync_data().last_updated,
            }
        );
        assert_eq!(f.store.load().unwrap(), Some(sample_sync_data()));
        assert_eq!(f.service.last_sync().await, Some(sample_sync_data().last_updated));
        assert!(f.repository.is_loaded().await);
        assert_eq!(f.repository.load_all_signs().await.unwrap().len(), 4);
        assert_eq!(f.categories.name("animals"), "Животные");
        assert_eq!(f.client.fetches(), 1);
    }

    #[tokio::test]
    async fn test_no_updates_skips_fetch() {
        let data = sample_sync_data();
        let f = fixture(FakeSyncClient::serving(data.clone()).with_metadata(SyncMetadata {
            last_updated: data.last_updated,
            has_updates: false,
        }));
        f.store.save(&data).unwrap();

        let outcome = f.service.sync().await.unwrap();
        assert!(matches!(outcome, SyncOutcome::UpToDate { .. }));
        assert_eq!(f.client.checks(), 1);
        assert_eq!(f.client.fetches(), 0);
    }

    #[tokio::test]
    async fn test_missing_snapshot_forces_pull() {
        let data = sample_sync_data();
        let f = fixture(FakeSyncClient::serving(data.clone()).with_metadata(SyncMetadata {
            last_updated: data.last_updated,
            has_updates: false,
        }));

        f.service.sync().await.unwrap();
        assert_eq!(f.client.fetches(), 1);
        assert!(f.store.exists());
    }

    #[tokio::test]
    async fn test_invalid_payload_writes_nothing() {
        let mut bad = sample_sync_data();
        bad.signs.push(sign("1", "Дубликат", "greetings"));
        let f = fixture(FakeSyncClient::serving(bad));

        let err = f.service.force_sync().await.unwrap_err();
        assert!(matches!(
            err,
            SyncRunError::Data(SignRepositoryError::InvalidFormat(_))
        ));
        assert!(!f.store.exists());
        assert_eq!(f.service.last_sync().await, None);
        assert!(!f.categories.is_loaded());
    }

    #[tokio::test]
    async fn test_connectivity_errors_are_silent() {
        let f = fixture(FakeSyncClient::failing(|| SyncError::NoConnectivity));
        let err = f.service.sync().await.unwrap_err();
        assert_eq!(err.user_visible(), None);

        assert!(user_visible_error(&SyncError::Server(503)).is_some());
    }

    #[tokio::test]
    async fn test_last_sync_keeps_server_precision() {
        let mut data = sample_sync_data();
        data.last_updated = timestamp::parse("2025-01-15T10:30:00.123456Z").unwrap();
        let f = fixture(FakeSyncClient::serving(data.clone()));

        f.service.sync().await.unwrap();
        assert_eq!(f.service.last_sync().await, Some(data.last_updated));
        assert_eq!(
            f.kv.get::<String>(LAST_SYNC_KEY).unwrap().as_deref(),
            Some("2025-01-15T10:30:00.123456Z")
        );
    }

    #[tokio::test]
    async fn test_malformed_last_sync_is_ignored() {
        let f = fixture(FakeSyncClient::serving(sample_sync_data()));
        f.kv.set(LAST_SYNC_KEY, "2025-01-15 10:30:00").unwrap();
        assert_eq!(f.service.last_sync().await, None);
    }
}
