// SPDX-License-Identifier: MPL-2.0

mod client;
mod error;

pub use client::{HttpSyncClient, SyncClient};
pub use error::SyncError;
