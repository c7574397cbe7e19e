// SPDX-License-Identifier: MPL-2.0

/// SQL schema for the key-value store
pub const SCHEMA: &str = r#"
-- Database version for migrations
PRAGMA user_version = 1;

-- kv: one JSON value per well-known key (favorites list, last sync date)
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
