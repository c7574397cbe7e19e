// SPDX-License-Identifier: MPL-2.0

//! Network-first source with a disk fallback.
//!
//! Order of attempts: reachability check, `/sync/data`, on-disk snapshot.
//! Network trouble never reaches the caller; only "nothing anywhere" does,
//! as `NoDataAvailable`. The reasons are logged and kept in a
//! `FallbackReport` for diagnosis.

use crate::api::{SyncClient, SyncError};
use crate::cache::SnapshotStore;
use crate::reachability::Reachability;
use crate::repository::{Catalog, EmptyQuery, SignDataSource, SignRepositoryError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Tier that ended up serving the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Network,
    Disk,
}

/// What happened during the most recent resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackReport {
    /// The probe said we were offline; the network was not tried.
    pub offline: bool,
    /// Why the network tier failed.
    pub network: Option<String>,
    /// Why the disk tier failed, or that it was empty.
    pub disk: Option<String>,
    pub served_from: Option<Tier>,
}

pub struct SyncedRemoteSource {
    client: Arc<dyn SyncClient>,
    store: SnapshotStore,
    reachability: Arc<dyn Reachability>,
    last_report: Mutex<Option<FallbackReport>>,
}

impl SyncedRemoteSource {
    pub fn new(
        client: Arc<dyn SyncClient>,
        store: SnapshotStore,
        reachability: Arc<dyn Reachability>,
    ) -> Self {
        Self {
            client,
            store,
            reachability,
            last_report: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Network tier. `Err` carries the reason for the report.
    async fn from_network(&self) -> Result<Catalog, String> {
        let data = match self.client.fetch_all_data().await {
            Ok(data) => data,
            Err(e) => {
                log_sync_failure(&e);
                return Err(e.to_string());
            }
        };

        // Validate before writing: a bad payload must not replace a good snapshot.
        let catalog = Catalog::from_sync(data.clone()).map_err(|e| {
            error!(error = %e, "sync payload failed validation");
            e.to_string()
        })?;

        if let Err(e) = self.store.save_async(data).await {
            warn!(error = %e, "could not persist snapshot, continuing with fresh data");
        }
        Ok(catalog)
    }

    /// Disk tier.
    async fn from_disk(&self) -> Result<Catalog, String> {
        match self.store.load_async().await {
            Ok(Some(data)) => Catalog::from_sync(data).map_err(|e| {
                error!(error = %e, "snapshot failed validation");
                e.to_string()
            }),
            Ok(None) => {
                info!("no snapshot to fall back to");
                Err("no snapshot on disk".to_string())
            }
            Err(e) => {
                error!(error = %e, "snapshot unusable");
                Err(e.to_string())
            }
        }
    }

    fn record(&self, report: FallbackReport) {
        let mut last = self
            .last_report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(report);
    }
}

fn log_sync_failure(e: &SyncError) {
    match e {
        SyncError::NoConnectivity => debug!("sync skipped: no connectivity"),
        e if e.is_malformed() => error!(error = %e, "malformed sync response"),
        e => warn!(error = %e, "sync failed, falling back to snapshot"),
    }
}

#[async_trait]
impl SignDataSource for SyncedRemoteSource {
    async fn load(&self) -> Result<Catalog, SignRepositoryError> {
        let mut report = FallbackReport::default();

        if self.reachability.is_reachable().await {
            match self.from_network().await {
                Ok(catalog) => {
                    report.served_from = Some(Tier::Network);
                    self.record(report);
                    return Ok(catalog);
                }
                Err(reason) => report.network = Some(reason),
            }
        } else {
            debug!("offline, skipping network tier");
            report.offline = true;
        }

        match self.from_disk().await {
            Ok(catalog) => {
                report.served_from = Some(Tier::Disk);
                self.record(report);
                Ok(catalog)
            }
            Err(reason) => {
                report.disk = Some(reason);
                warn!(
                    offline = report.offline,
                    network = report.network.as_deref().unwrap_or("-"),
                    disk = report.disk.as_deref().unwrap_or("-"),
                    "no data available from any tier"
                );
                self.record(report);
                Err(SignRepositoryError::NoDataAvailable)
            }
        }
    }

    fn empty_query(&self) -> EmptyQuery {
        EmptyQuery::All
    }

    fn name(&self) -> &'static str {
        "sync"
    }

    fn last_fallback(&self) -> Option<FallbackReport> {
        self.last_report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SignRepository;
    use crate::testing::{FakeSyncClient, FixedReachability, sample_sync_data, sign};
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _dir: TempDir,
        store: SnapshotStore,
        client: Arc<FakeSyncClient>,
        repo: SignRepository,
    }

    fn fixture(client: FakeSyncClient, online: bool, seed_disk: bool) -> Fixture {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        if seed_disk {
            store.save(&sample_sync_data()).unwrap();
        }
        let client = Arc::new(client);
        let source = SyncedRemoteSource::new(
            Arc::clone(&client) as Arc<dyn SyncClient>,
            store.clone(),
            Arc::new(FixedReachability(online)),
        );
        Fixture {
            _dir: dir,
            store,
            client,
            repo: SignRepository::new(source),
        }
    }

    #[tokio::test]
    async fn test_network_success_writes_through() {
        let f = fixture(FakeSyncClient::serving(sample_sync_data()), true, false);

        assert_eq!(f.repo.load_all_signs().await.unwrap().len(), 4);
        assert!(f.store.exists());
        assert_eq!(f.store.load().unwrap(), Some(sample_sync_data()));
        let report = f.repo.last_fallback().unwrap();
        assert_eq!(report.served_from, Some(Tier::Network));
    }

    #[tokio::test]
    async fn test_failing_network_falls_back_to_disk() {
        let f = fixture(
            FakeSyncClient::failing(|| SyncError::Server(500)),
            true,
            true,
        );

        let signs = f.repo.load_all_signs().await.unwrap();
        assert_eq!(signs, sample_sync_data().signs);

        let report = f.repo.last_fallback().unwrap();
        assert_eq!(report.served_from, Some(Tier::Disk));
        assert_eq!(report.network.as_deref(), Some("server error: 500"));
    }

    #[tokio::test]
    async fn test_total_failure_is_no_data_available() {
        let f = fixture(
            FakeSyncClient::failing(|| SyncError::InvalidResponse("boom".into())),
            true,
            false,
        );

        let err = f.repo.load_all_signs().await.unwrap_err();
        assert!(matches!(err, SignRepositoryError::NoDataAvailable));

        let report = f.repo.last_fallback().unwrap();
        assert!(report.network.is_some());
        assert!(report.disk.is_some());
        assert_eq!(report.served_from, None);
    }

    #[tokio::test]
    async fn test_offline_skips_network() {
        let f = fixture(FakeSyncClient::serving(sample_sync_data()), false, true);

        assert_eq!(f.repo.load_categories().await.unwrap().len(), 2);
        assert_eq!(f.client.fetches(), 0);
        assert!(f.repo.last_fallback().unwrap().offline);
    }

    #[tokio::test]
    async fn test_corrupt_disk_is_not_treated_as_data() {
        let f = fixture(FakeSyncClient::failing(|| SyncError::NoConnectivity), true, false);
        std::fs::write(f.store.path(), b"garbage").unwrap();

        let err = f.repo.load_all_signs().await.unwrap_err();
        assert!(matches!(err, SignRepositoryError::NoDataAvailable));
        assert!(
            f.repo
                .last_fallback()
                .unwrap()
                .disk
                .unwrap()
                .contains("failed to load snapshot")
        );
    }

    #[tokio::test]
    async fn test_invalid_payload_keeps_previous_snapshot() {
        let mut bad = sample_sync_data();
        bad.signs.push(sign("1", "Дубликат", "greetings"));
        let f = fixture(FakeSyncClient::serving(bad), true, true);

        let signs = f.repo.load_all_signs().await.unwrap();
        assert_eq!(signs.len(), 4);
        assert_eq!(f.store.load().unwrap(), Some(sample_sync_data()));
    }

    #[tokio::test]
    async fn test_memory_tier_avoids_io() {
        let f = fixture(FakeSyncClient::serving(sample_sync_data()), true, false);
        f.repo.load_all_signs().await.unwrap();
        f.store.clear().unwrap();

        assert_eq!(f.repo.search_signs("").await.unwrap().len(), 4);
        assert_eq!(f.client.fetches(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loads_fetch_once() {
        let f = fixture(
            FakeSyncClient::serving(sample_sync_data()).with_delay(50),
            true,
            false,
        );
        let repo = Arc::new(f.repo);

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.load_all_signs().await.is_ok() })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap());
        }
        assert_eq!(f.client.fetches(), 1);
    }
}
