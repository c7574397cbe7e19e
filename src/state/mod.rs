// SPDX-License-Identifier: MPL-2.0

mod categories;
pub mod favorites;
pub mod search;
pub mod settings;
pub mod sync;

pub use categories::CategoryIndex;
pub use favorites::{
    FavoriteSigns, FavoritesError, FavoritesSort, FavoritesStore, load_favorite_signs,
};
pub use search::{SearchController, SearchState};
pub use settings::{AppSettings, DataMode, SettingsChange, SettingsError};
pub use sync::{SyncOutcome, SyncRunError, SyncService, user_visible_error};
