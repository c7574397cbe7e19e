// SPDX-License-Identifier: MPL-2.0

mod category;
mod sign;
mod sync;
pub mod timestamp;

pub use category::{Category, sort_by_order};
pub use sign::{Sign, SignMetadata, SignSynonym, SignVideo};
pub use sync::{SignsBundle, SyncData, SyncMetadata};
