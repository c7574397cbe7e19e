// SPDX-License-Identifier: MPL-2.0

//! The one query surface the rest of the app talks to.
//!
//! `SignRepository` owns the in-memory catalog and delegates the question
//! "where does the catalog come from" to a `SignDataSource` picked at
//! construction: the static bundle or the synced backend.

mod bundle;
mod error;
mod synced;

pub use bundle::StaticBundleSource;
pub use error::SignRepositoryError;
pub use synced::{FallbackReport, SyncedRemoteSource, Tier};

use crate::model::{Category, Sign, SyncData, sort_by_order};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// What `search_signs("")` returns. Differs per source on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyQuery {
    /// Every sign.
    All,
    /// No signs.
    Nothing,
}

/// Where a catalog comes from.
#[async_trait]
pub trait SignDataSource: Send + Sync {
    /// Produce a fresh catalog. Called at most once per resolution.
    async fn load(&self) -> Result<Catalog, SignRepositoryError>;

    fn empty_query(&self) -> EmptyQuery;

    /// Short label for logs and status output.
    fn name(&self) -> &'static str;

    /// Underlying failures behind the most recent load, if the source keeps them.
    fn last_fallback(&self) -> Option<FallbackReport> {
        None
    }
}

/// A validated, immutable set of signs and categories.
#[derive(Debug, Clone)]
pub struct Catalog {
    signs: Vec<Sign>,
    categories: Vec<Category>,
    last_updated: Option<DateTime<Utc>>,
    version: Option<String>,
}

impl Catalog {
    /// Sorts categories by order and rejects duplicate sign ids.
    pub fn new(
        signs: Vec<Sign>,
        mut categories: Vec<Category>,
        last_updated: Option<DateTime<Utc>>,
        version: Option<String>,
    ) -> Result<Self, SignRepositoryError> {
        let mut seen = HashSet::with_capacity(signs.len());
        for sign in &signs {
            if !seen.insert(sign.id.as_str()) {
                return Err(SignRepositoryError::InvalidFormat(format!(
                    "duplicate sign id {}",
                    sign.id
                )));
            }
        }

        sort_by_order(&mut categories);

        Ok(Self {
            signs,
            categories,
            last_updated,
            version,
        })
    }

    pub fn from_sync(data: SyncData) -> Result<Self, SignRepositoryError> {
        Self::new(data.signs, data.categories, Some(data.last_updated), None)
    }

    pub fn signs(&self) -> &[Sign] {
        &self.signs
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }
}

/// Summary of what is currently loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogInfo {
    pub source: &'static str,
    pub signs: usize,
    pub categories: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub version: Option<String>,
}

/// Filter `signs` by a case-insensitive substring of word, keywords or
/// description. The empty query matches everything.
pub fn filter_signs(signs: &[Sign], query: &str) -> Vec<Sign> {
    let needle = query.to_lowercase();
    signs
        .iter()
        .filter(|s| s.matches_lowercase(&needle))
        .cloned()
        .collect()
}

pub struct SignRepository {
    source: Arc<dyn SignDataSource>,
    // Held across the whole resolution so concurrent callers share one load.
    cache: Mutex<Option<Arc<Catalog>>>,
}

impl SignRepository {
    pub fn new(source: impl SignDataSource + 'static) -> Self {
        Self::with_source(Arc::new(source))
    }

    pub fn with_source(source: Arc<dyn SignDataSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(None),
        }
    }

    async fn catalog(&self) -> Result<Arc<Catalog>, SignRepositoryError> {
        let mut cached = self.cache.lock().await;
        if let Some(catalog) = cached.as_ref() {
            return Ok(Arc::clone(catalog));
        }

        debug!(source = self.source.name(), "memory cache empty, loading");
        let catalog = Arc::new(self.source.load().await?);
        info!(
            source = self.source.name(),
            signs = catalog.signs.len(),
            categories = catalog.categories.len(),
            "catalog loaded"
        );
        *cached = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    pub async fn load_all_signs(&self) -> Result<Vec<Sign>, SignRepositoryError> {
        Ok(self.catalog().await?.signs.clone())
    }

    /// Ascending by `order`; equal orders keep their source order.
    pub async fn load_categories(&self) -> Result<Vec<Category>, SignRepositoryError> {
        Ok(self.catalog().await?.categories.clone())
    }

    pub async fn get_sign(&self, id: &str) -> Result<Option<Sign>, SignRepositoryError> {
        let catalog = self.catalog().await?;
        Ok(catalog.signs.iter().find(|s| s.id == id).cloned())
    }

    pub async fn get_signs_by_category(
        &self,
        category_id: &str,
    ) -> Result<Vec<Sign>, SignRepositoryError> {
        let catalog = self.catalog().await?;
        Ok(catalog
            .signs
            .iter()
            .filter(|s| s.category == category_id)
            .cloned()
            .collect())
    }

    pub async fn search_signs(&self, query: &str) -> Result<Vec<Sign>, SignRepositoryError> {
        if query.is_empty() && self.source.empty_query() == EmptyQuery::Nothing {
            return Ok(Vec::new());
        }
        let catalog = self.catalog().await?;
        Ok(filter_signs(&catalog.signs, query))
    }

    /// Signs actually filed under `category_id`, ignoring `sign_count`.
    pub async fn count_signs(&self, category_id: &str) -> Result<usize, SignRepositoryError> {
        let catalog = self.catalog().await?;
        Ok(catalog
            .signs
            .iter()
            .filter(|s| s.category == category_id)
            .count())
    }

    pub async fn catalog_info(&self) -> Result<CatalogInfo, SignRepositoryError> {
        let catalog = self.catalog().await?;
        Ok(self.describe(&catalog))
    }

    /// Like `catalog_info`, but `None` instead of resolving when nothing is
    /// in memory yet.
    pub async fn loaded_info(&self) -> Option<CatalogInfo> {
        let cached = self.cache.lock().await;
        cached.as_deref().map(|catalog| self.describe(catalog))
    }

    fn describe(&self, catalog: &Catalog) -> CatalogInfo {
        CatalogInfo {
            source: self.source.name(),
            signs: catalog.signs.len(),
            categories: catalog.categories.len(),
            last_updated: catalog.last_updated,
            version: catalog.version.clone(),
        }
    }

    /// Forget the in-memory catalog; the next query resolves again.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    /// Resolve again right away. The current catalog keeps serving until
    /// the new one has loaded, and stays if the load fails.
    pub async fn refresh(&self) -> Result<(), SignRepositoryError> {
        let mut cached = self.cache.lock().await;
        let catalog = self.source.load().await?;
        *cached = Some(Arc::new(catalog));
        Ok(())
    }

    /// Serve freshly synced data without another round trip.
    pub async fn install(&self, data: SyncData) -> Result<(), SignRepositoryError> {
        let catalog = Catalog::from_sync(data)?;
        *self.cache.lock().await = Some(Arc::new(catalog));
        Ok(())
    }

    pub async fn is_loaded(&self) -> bool {
        self.cache.lock().await.is_some()
    }

    pub fn empty_query(&self) -> EmptyQuery {
        self.source.empty_query()
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn last_fallback(&self) -> Option<FallbackReport> {
        self.source.last_fallback()
    }
}
