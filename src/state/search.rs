// SPDX-License-Identifier: MPL-2.0

//! Search-as-you-type over the loaded catalog.
//!
//! Each `submit` cancels the previous search and waits out the debounce
//! before filtering. A search that was superseded while filtering finishes
//! but never publishes.

use crate::config::SEARCH_DEBOUNCE_MS;
use crate::messages::UserMessage;
use crate::model::Sign;
use crate::repository::{SignRepository, SignRepositoryError, filter_signs};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Sign>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct SearchController {
    repository: Arc<SignRepository>,
    state: Arc<watch::Sender<SearchState>>,
    current: Arc<Mutex<Option<CancellationToken>>>,
    debounce: Duration,
}

impl SearchController {
    pub fn new(repository: Arc<SignRepository>) -> Self {
        Self::with_debounce(repository, Duration::from_millis(SEARCH_DEBOUNCE_MS))
    }

    pub fn with_debounce(repository: Arc<SignRepository>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            repository,
            state: Arc::new(state),
            current: Arc::new(Mutex::new(None)),
            debounce,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Schedule a search for `query`, superseding any pending one.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, query: impl Into<String>) {
        let query = query.into();
        let token = self.replace_token();

        self.state.send_modify(|s| {
            s.query = query.clone();
            s.loading = true;
            s.error = None;
        });

        let this = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(this.debounce) => {}
            }
            let outcome = this.run(&query).await;
            if token.is_cancelled() {
                debug!(%query, "search superseded, dropping results");
                return;
            }
            this.publish(query, outcome);
        });
    }

    /// Search immediately, bypassing the debounce.
    pub async fn search_now(&self, query: &str) {
        let token = self.replace_token();
        let outcome = self.run(query).await;
        if !token.is_cancelled() {
            self.publish(query.to_string(), outcome);
        }
    }

    /// Cancel any pending search and show the full set.
    pub async fn clear(&self) {
        self.search_now("").await;
    }

    async fn run(&self, query: &str) -> Result<Vec<Sign>, SignRepositoryError> {
        let signs = self.repository.load_all_signs().await?;
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(signs);
        }
        Ok(filter_signs(&signs, trimmed))
    }

    fn publish(&self, query: String, outcome: Result<Vec<Sign>, SignRepositoryError>) {
        let next = match outcome {
            Ok(results) => {
                debug!(%query, results = results.len(), "search finished");
                SearchState {
                    query,
                    results,
                    loading: false,
                    error: None,
                }
            }
            Err(e) => SearchState {
                query,
                results: Vec::new(),
                loading: false,
                error: Some(e.user_message()),
            },
        };
        self.state.send_replace(next);
    }

    fn replace_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut current = self.current.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SnapshotStore;
    use crate::repository::{StaticBundleSource, SyncedRemoteSource};
    use crate::testing::{FakeSyncClient, FixedReachability, sample_sync_data};
    use tempfile::tempdir;

    /// Catalog already in memory, so searches never touch the disk.
    async fn controller() -> (SearchController, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let repository = Arc::new(SignRepository::new(SyncedRemoteSource::new(
            Arc::new(FakeSyncClient::serving(sample_sync_data())),
            SnapshotStore::new(dir.path()),
            Arc::new(FixedReachability(false)),
        )));
        repository.install(sample_sync_data()).await.unwrap();
        (SearchController::new(repository), dir)
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_latest_query_is_published() {
        let (search, _dir) = controller().await;
        let mut rx = search.subscribe();

        search.submit("кош");
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.submit("прив");
        assert!(search.state().loading);

        tokio::time::sleep(Duration::from_millis(SEARCH_DEBOUNCE_MS + 50)).await;

        let state = rx.borrow_and_update().clone();
        assert_eq!(state.query, "прив");
        assert!(!state.loading);
        assert_eq!(state.results.len(), 2);
        assert!(state.results.iter().all(|s| s.word.to_lowercase() == "привет"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_runs_before_debounce() {
        let (search, _dir) = controller().await;
        search.submit("кош");
        tokio::time::sleep(Duration::from_millis(SEARCH_DEBOUNCE_MS / 2)).await;

        let state = search.state();
        assert!(state.loading);
        assert!(state.results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_shows_everything() {
        let (search, _dir) = controller().await;
        search.submit("   ");
        tokio::time::sleep(Duration::from_millis(SEARCH_DEBOUNCE_MS + 50)).await;
        assert_eq!(search.state().results.len(), 4);
    }

    #[tokio::test]
    async fn test_clear_cancels_pending() {
        let (search, _dir) = controller().await;
        search.submit("кош");
        search.clear().await;
        assert_eq!(search.state().query, "");
        assert_eq!(search.state().results.len(), 4);
    }

    #[tokio::test]
    async fn test_search_now_matches_description() {
        let (search, _dir) = controller().await;
        search.search_now("животное").await;
        let state = search.state();
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.results[0].word, "Кошка");
    }

    #[tokio::test]
    async fn test_errors_are_published() {
        let dir = tempdir().unwrap();
        let repository = Arc::new(SignRepository::new(StaticBundleSource::new(
            dir.path().join("missing.json"),
        )));
        let search = SearchController::new(repository);

        search.search_now("кошка").await;
        let state = search.state();
        assert!(state.results.is_empty());
        assert!(state.error.is_some());
        assert!(!state.loading);
    }
}
