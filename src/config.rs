// SPDX-License-Identifier: MPL-2.0

pub const APP_ID: &str = "ru.rsl.Dictionary";
pub const APP_NAME: &str = "RSL Dictionary";

/// Directory name under the platform data dir holding the snapshot and store.
pub const DATA_DIR_NAME: &str = "rsl-dictionary";

pub const DEFAULT_API_BASE: &str = "https://api.rsl-dictionary.ru/api/v1";

/// Snapshot file written by the cache store.
pub const SNAPSHOT_FILE_NAME: &str = "cached_signs_data.json";

/// SQLite file backing the key-value store.
pub const STORE_FILE_NAME: &str = "store.db";

pub const FAVORITES_KEY: &str = "com.rsl.favorites";
pub const LAST_SYNC_KEY: &str = "last_sync_date";

/// Request timeout for the sync transport, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// How long the reachability probe waits for a TCP handshake.
pub const PROBE_TIMEOUT_MS: u64 = 1500;

/// Quiet period before a submitted search query runs.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Resolved video URLs kept in memory.
pub const VIDEO_URL_CACHE_CAPACITY: usize = 100;
