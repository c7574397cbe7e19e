// SPDX-License-Identifier: MPL-2.0

use crate::model::{Category, Sign, timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A complete, internally consistent pairing of categories and signs.
///
/// This is what the backend returns from `/sync/data` and what the snapshot
/// store writes to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncData {
    pub categories: Vec<Category>,
    pub signs: Vec<Sign>,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
}

/// Answer to `/sync/check`. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetadata {
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
    pub has_updates: bool,
}

/// Root of the bundled JSON asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignsBundle {
    pub signs: Vec<Sign>,
    pub categories: Vec<Category>,
    #[serde(default)]
    pub total_signs: usize,
    #[serde(default)]
    pub total_categories: usize,
    #[serde(default)]
    pub version: Option<String>,
    /// Free-form; the bundle predates the strict timestamp format.
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_sync_data;

    #[test]
    fn test_sync_data_round_trip() {
        let data = sample_sync_data();
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"last_updated\":\"2025-01-15T10:30:00.000Z\""));
        let back: SyncData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_metadata_decodes_snake_case() {
        let meta: SyncMetadata = serde_json::from_str(
            r#"{"last_updated": "2025-03-01T00:00:00.000Z", "has_updates": true}"#,
        )
        .unwrap();
        assert!(meta.has_updates);
    }

    #[test]
    fn test_sync_data_rejects_loose_timestamp() {
        let json = r#"{"categories": [], "signs": [], "last_updated": "2025-03-01"}"#;
        assert!(serde_json::from_str::<SyncData>(json).is_err());
    }

    #[test]
    fn test_bundle_decodes_with_free_form_date() {
        let json = r#"{
            "signs": [],
            "categories": [{"id": "a", "name": "А", "order": 1}],
            "total_signs": 0,
            "total_categories": 1,
            "version": "1.2",
            "last_updated": "2024-11-01"
        }"#;
        let bundle: SignsBundle = serde_json::from_str(json).unwrap();
        assert_eq!(bundle.total_categories, 1);
        assert_eq!(bundle.last_updated.as_deref(), Some("2024-11-01"));
    }
}
