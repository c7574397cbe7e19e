// SPDX-License-Identifier: MPL-2.0

//! Sign → playable video URL.
//!
//! Resolution is pure (first video, else the legacy single URL); the result
//! is memoized per sign id in a small LRU.

use crate::config::{DEFAULT_REQUEST_TIMEOUT_SECS, VIDEO_URL_CACHE_CAPACITY};
use crate::model::Sign;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("invalid video URL")]
    InvalidUrl,
    #[error("failed to fetch video")]
    FetchFailed,
    #[error("video storage error: {0}")]
    Storage(String),
}

/// HashMap + access order, most recently used at the end.
struct LruCache {
    map: HashMap<String, Url>,
    order: Vec<String>,
    capacity: usize,
}

impl LruCache {
    fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn get(&mut self, key: &str) -> Option<Url> {
        let url = self.map.get(key).cloned()?;
        self.order.retain(|k| k != key);
        self.order.push(key.to_string());
        Some(url)
    }

    fn insert(&mut self, key: String, value: Url) {
        if !self.map.contains_key(&key) {
            while self.map.len() >= self.capacity && !self.order.is_empty() {
                let oldest = self.order.remove(0);
                self.map.remove(&oldest);
            }
        }
        self.map.insert(key.clone(), value);
        self.order.retain(|k| k != &key);
        self.order.push(key);
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

pub struct VideoResolver {
    cache: Mutex<LruCache>,
    http: reqwest::Client,
}

impl Default for VideoResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoResolver {
    pub fn new() -> Self {
        Self::with_capacity(VIDEO_URL_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity.max(1))),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, LruCache> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn video_url(&self, sign: &Sign) -> Result<Url, VideoError> {
        if let Some(url) = self.cache().get(&sign.id) {
            return Ok(url);
        }

        let raw = sign.playable_url().ok_or_else(|| {
            debug!(sign = %sign.id, "sign has no video");
            VideoError::InvalidUrl
        })?;
        let url = Url::parse(raw).map_err(|e| {
            warn!(sign = %sign.id, url = raw, error = %e, "unparsable video URL");
            VideoError::InvalidUrl
        })?;

        self.cache().insert(sign.id.clone(), url.clone());
        Ok(url)
    }

    /// Resolve ahead of time so a later `video_url` is a cache hit.
    pub fn preload(&self, sign: &Sign) {
        if let Err(e) = self.video_url(sign) {
            debug!(sign = %sign.id, error = %e, "preload skipped");
        }
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub fn cached(&self) -> usize {
        self.cache().len()
    }

    /// Resolve and confirm with a HEAD request that the storage serves it.
    pub async fn check_available(&self, sign: &Sign) -> Result<Url, VideoError> {
        let url = self.video_url(sign)?;
        let response = self.http.head(url.clone()).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "video HEAD request failed");
            VideoError::FetchFailed
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VideoError::Storage(format!("HTTP {}", status.as_u16())));
        }
        Ok(url)
    }
}
