// SPDX-License-Identifier: MPL-2.0

mod db;
mod schema;
mod snapshot;

pub use db::KeyValueDb;
pub use snapshot::SnapshotStore;

use thiserror::Error;

/// Failures of the durable stores. "No snapshot yet" is not one of them.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cannot access storage location: {0}")]
    StorageUnavailable(String),
    #[error("failed to save snapshot: {0}")]
    Save(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to load snapshot: {0}")]
    Load(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
