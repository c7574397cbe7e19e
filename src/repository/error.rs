// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;
use thiserror::Error;

/// What a caller of the repository can see go wrong.
///
/// Sync and cache failures never appear here directly: the synced source
/// either falls back past them or collapses them into `NoDataAvailable`.
#[derive(Error, Debug)]
pub enum SignRepositoryError {
    #[error("bundle not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("unable to read bundle: {0}")]
    UnreadableFile(#[source] std::io::Error),
    #[error("decoding error: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("invalid data format: {0}")]
    InvalidFormat(String),
    #[error("no data available")]
    NoDataAvailable,
}
