// SPDX-License-Identifier: MPL-2.0

use crate::model::SignsBundle;
use crate::repository::{Catalog, EmptyQuery, SignDataSource, SignRepositoryError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Serves the JSON document shipped with the app. There is nothing to fall
/// back to, so every failure reaches the caller.
pub struct StaticBundleSource {
    path: PathBuf,
}

impl StaticBundleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SignDataSource for StaticBundleSource {
    async fn load(&self) -> Result<Catalog, SignRepositoryError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SignRepositoryError::FileNotFound(self.path.clone())
            } else {
                SignRepositoryError::UnreadableFile(e)
            }
        })?;

        let bundle: SignsBundle =
            serde_json::from_slice(&bytes).map_err(SignRepositoryError::Decode)?;

        if bundle.total_signs != bundle.signs.len()
            || bundle.total_categories != bundle.categories.len()
        {
            warn!(
                declared_signs = bundle.total_signs,
                signs = bundle.signs.len(),
                declared_categories = bundle.total_categories,
                categories = bundle.categories.len(),
                "bundle totals disagree with contents"
            );
        }
        info!(
            path = %self.path.display(),
            version = bundle.version.as_deref().unwrap_or("-"),
            "bundle decoded"
        );

        // The bundle's date is free text; keep it out of the typed timestamp.
        Catalog::new(bundle.signs, bundle.categories, None, bundle.version)
    }

    fn empty_query(&self) -> EmptyQuery {
        EmptyQuery::Nothing
    }

    fn name(&self) -> &'static str {
        "bundle"
    }
}
