// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Routine when offline; callers fall back quietly.
    #[error("no internet connection")]
    NoConnectivity,
    #[error("server error: {0}")]
    Server(u16),
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("decoding error: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl SyncError {
    /// Connectivity loss is expected and never shown to the user.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SyncError::NoConnectivity)
    }

    /// The server answered with something we could not make sense of.
    pub fn is_malformed(&self) -> bool {
        matches!(self, SyncError::Decode(_) | SyncError::InvalidResponse(_))
    }

    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_connect() {
            SyncError::NoConnectivity
        } else {
            SyncError::Network(e)
        }
    }
}
