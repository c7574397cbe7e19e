// SPDX-License-Identifier: MPL-2.0

use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named group of signs with a display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Display position; ties keep their original order.
    pub order: i32,
    /// Server-computed and advisory only. Count the signs instead.
    #[serde(default)]
    pub sign_count: u32,
    /// SF Symbol name
    #[serde(default)]
    pub icon: Option<String>,
    /// Hex color, e.g. "#FF9500"
    #[serde(default)]
    pub color: Option<String>,
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

/// Stable ascending sort by `order`.
pub fn sort_by_order(categories: &mut [Category]) {
    categories.sort_by_key(|c| c.order);
}
