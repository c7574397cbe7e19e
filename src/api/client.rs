// SPDX-License-Identifier: MPL-2.0

use crate::api::SyncError;
use crate::config::{CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::model::{SyncData, SyncMetadata, timestamp};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// How many bytes of a bad body end up in the log.
const BODY_PREVIEW_BYTES: usize = 500;

/// The two backend calls the repository and sync service rely on.
#[async_trait]
pub trait SyncClient: Send + Sync {
    /// Ask whether anything changed since `last_known` (omitted when `None`).
    async fn check_for_updates(
        &self,
        last_known: Option<DateTime<Utc>>,
    ) -> Result<SyncMetadata, SyncError>;

    /// Pull the full current dataset.
    async fn fetch_all_data(&self) -> Result<SyncData, SyncError>;
}

/// `{success, data, message?}` wrapper around every backend payload.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    // Absent or null when `success` is false.
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

/// Talks to the sync backend over HTTPS.
pub struct HttpSyncClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpSyncClient {
    pub fn new(base: &str) -> Result<Self, SyncError> {
        Self::with_timeout(base, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base: &str, timeout: Duration) -> Result<Self, SyncError> {
        let base = Url::parse(base).map_err(|e| SyncError::InvalidEndpoint(format!("{base}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(SyncError::InvalidEndpoint(base.to_string()));
        }

        // The transport timeout is the only deadline on a sync request.
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .tcp_nodelay(true)
            .build()
            .map_err(SyncError::Network)?;

        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `<base>/sync/<leaf>`, keeping any path prefix of the base.
    fn endpoint(&self, leaf: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["sync", leaf]);
        }
        url
    }

    fn check_url(&self, last_known: Option<DateTime<Utc>>) -> Url {
        let mut url = self.endpoint("check");
        if let Some(ts) = last_known {
            url.query_pairs_mut()
                .append_pair("last_updated", &timestamp::format(&ts));
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, SyncError> {
        info!(url = %url, "sync request");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                let err = SyncError::from_transport(e);
                if err.is_connectivity() {
                    warn!(url = %url, "no internet connection");
                } else {
                    error!(url = %url, error = %err, "network error");
                }
                err
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            error!(url = %url, status = status.as_u16(), "server error");
            return Err(SyncError::Server(status.as_u16()));
        }

        let body = response.bytes().await.map_err(SyncError::from_transport)?;
        debug!(
            bytes = body.len(),
            preview = %preview(&body),
            "sync response"
        );

        let envelope: Envelope<T> = serde_json::from_slice(&body).map_err(|e| {
            error!(
                line = e.line(),
                column = e.column(),
                error = %e,
                preview = %preview(&body),
                "failed to decode sync response"
            );
            SyncError::Decode(e)
        })?;

        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "success flag is false".to_string());
            error!(message = %message, "backend reported failure");
            return Err(SyncError::InvalidResponse(message));
        }

        envelope
            .data
            .ok_or_else(|| SyncError::InvalidResponse("missing data".to_string()))
    }
}

#[async_trait]
impl SyncClient for HttpSyncClient {
    async fn check_for_updates(
        &self,
        last_known: Option<DateTime<Utc>>,
    ) -> Result<SyncMetadata, SyncError> {
        self.get(self.check_url(last_known)).await
    }

    async fn fetch_all_data(&self) -> Result<SyncData, SyncError> {
        let data: SyncData = self.get(self.endpoint("data")).await?;
        info!(
            signs = data.signs.len(),
            categories = data.categories.len(),
            last_updated = %timestamp::format(&data.last_updated),
            "fetched sync data"
        );
        Ok(data)
    }
}

fn preview(body: &[u8]) -> String {
    let end = body.len().min(BODY_PREVIEW_BYTES);
    String::from_utf8_lossy(&body[..end]).into_owned()
}
