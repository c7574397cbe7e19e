// SPDX-License-Identifier: MPL-2.0

//! Fixtures and fakes shared by the unit tests.

use crate::api::{SyncClient, SyncError};
use crate::model::{Category, Sign, SignMetadata, SyncData, SyncMetadata, timestamp};
use crate::reachability::Reachability;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn sign(id: &str, word: &str, category: &str) -> Sign {
    Sign {
        id: id.to_string(),
        word: word.to_string(),
        description: String::new(),
        category: category.to_string(),
        videos: Vec::new(),
        synonyms: Vec::new(),
        embeddings: None,
        video_id: String::new(),
        storage_path: String::new(),
        public_url: String::new(),
        keywords: Vec::new(),
        metadata: SignMetadata::default(),
    }
}

pub fn category(id: &str, name: &str, order: i32) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        order,
        sign_count: 0,
        icon: None,
        color: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn sample_sync_data() -> SyncData {
    let mut hello = sign("1", "Привет", "greetings");
    hello.description = "Приветствие при встрече".to_string();
    hello.keywords = vec!["здравствуй".to_string()];
    hello.public_url = "https://cdn.example/1.mp4".to_string();

    let mut hello_lower = sign("2", "привет", "greetings");
    hello_lower.public_url = "https://cdn.example/2.mp4".to_string();

    let mut cat = sign("3", "Кошка", "animals");
    cat.description = "Домашнее животное".to_string();

    let dog = sign("4", "Собака", "animals");

    let mut greetings = category("greetings", "Приветствия", 2);
    greetings.icon = Some("hand.wave".to_string());
    greetings.color = Some("#FF9500".to_string());

    SyncData {
        categories: vec![greetings, category("animals", "Животные", 1)],
        signs: vec![hello, hello_lower, cat, dog],
        last_updated: timestamp::parse("2025-01-15T10:30:00.000Z").unwrap(),
    }
}

/// Scripted sync client: returns the configured result and counts calls.
pub struct FakeSyncClient {
    data: Mutex<Result<SyncData, fn() -> SyncError>>,
    metadata: Mutex<Option<SyncMetadata>>,
    fetches: AtomicUsize,
    checks: AtomicUsize,
    delay_ms: u64,
}

impl FakeSyncClient {
    pub fn serving(data: SyncData) -> Self {
        Self {
            data: Mutex::new(Ok(data)),
            metadata: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            checks: AtomicUsize::new(0),
            delay_ms: 0,
        }
    }

    pub fn failing(err: fn() -> SyncError) -> Self {
        Self {
            data: Mutex::new(Err(err)),
            metadata: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            checks: AtomicUsize::new(0),
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_metadata(self, metadata: SyncMetadata) -> Self {
        *self.metadata.lock().unwrap() = Some(metadata);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncClient for FakeSyncClient {
    async fn check_for_updates(
        &self,
        _last_known: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<SyncMetadata, SyncError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let meta = *self.metadata.lock().unwrap();
        match meta {
            Some(meta) => Ok(meta),
            None => match &*self.data.lock().unwrap() {
                Ok(data) => Ok(SyncMetadata {
                    last_updated: data.last_updated,
                    has_updates: true,
                }),
                Err(make) => Err(make()),
            },
        }
    }

    async fn fetch_all_data(&self) -> Result<SyncData, SyncError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        match &*self.data.lock().unwrap() {
            Ok(data) => Ok(data.clone()),
            Err(make) => Err(make()),
        }
    }
}

pub struct FixedReachability(pub bool);

#[async_trait]
impl Reachability for FixedReachability {
    async fn is_reachable(&self) -> bool {
        self.0
    }
}
