// SPDX-License-Identifier: MPL-2.0

//! Data core of the Russian Sign Language dictionary: the sign catalog and
//! where it comes from, offline fallback, favorites, search and sync.

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod messages;
pub mod model;
pub mod reachability;
pub mod repository;
pub mod runtime;
pub mod state;
pub mod video;

#[cfg(test)]
mod testing;

pub use app::{AppOptions, CacheStatus, Dictionary};
pub use messages::{AppError, UserMessage};
