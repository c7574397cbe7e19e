// SPDX-License-Identifier: MPL-2.0

use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One dictionary entry: a word or phrase with its video demonstrations.
///
/// Signs are only ever produced by decoding (bundle, network or disk) and are
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sign {
    pub id: String,
    pub word: String,
    #[serde(default)]
    pub description: String,
    /// Category id. May reference a category that no longer exists.
    pub category: String,
    #[serde(default)]
    pub videos: Vec<SignVideo>,
    #[serde(default)]
    pub synonyms: Vec<SignSynonym>,
    /// Reserved for semantic search; carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f64>>,

    // Flat single-video schema kept for older payloads.
    #[serde(default)]
    pub video_id: String,
    #[serde(default, rename = "supabase_storage_path")]
    pub storage_path: String,
    #[serde(default, rename = "supabase_url")]
    pub public_url: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub metadata: SignMetadata,
}

impl Sign {
    /// The URL a player should open for this sign.
    ///
    /// The first video wins; the legacy public URL is the fallback when there
    /// are no videos or the first one carries an empty URL.
    pub fn playable_url(&self) -> Option<&str> {
        self.videos
            .first()
            .map(|v| v.url.as_str())
            .filter(|url| !url.is_empty())
            .or_else(|| Some(self.public_url.as_str()).filter(|url| !url.is_empty()))
    }

    /// Case-insensitive substring match on word, keywords and description.
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.word.to_lowercase().contains(needle)
            || self
                .keywords
                .iter()
                .any(|k| k.to_lowercase().contains(needle))
            || self.description.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignVideo {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub context_description: String,
    #[serde(default)]
    pub order: i32,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignSynonym {
    pub id: String,
    pub word: String,
}

/// Technical details of the legacy video file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignMetadata {
    /// Seconds
    pub duration: Option<f64>,
    /// Bytes
    pub file_size: Option<i64>,
    /// e.g. "1080x1920"
    pub resolution: Option<String>,
    pub format: Option<String>,
    pub fps: Option<i32>,
}
