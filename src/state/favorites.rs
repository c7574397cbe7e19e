// SPDX-License-Identifier: MPL-2.0

//! User-marked sign ids.
//!
//! One actor task owns the list and its storage. Handles send it commands and
//! await the reply; every committed change is published on a watch channel
//! before the reply goes out, so an awaited `add` is already visible to
//! subscribers.

use crate::cache::{CacheError, KeyValueDb};
use crate::config::FAVORITES_KEY;
use crate::model::Sign;
use crate::repository::{SignRepository, SignRepositoryError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, warn};

const COMMAND_BUFFER: usize = 32;

#[derive(Error, Debug)]
pub enum FavoritesError {
    #[error("favorites storage error: {0}")]
    Storage(#[from] CacheError),
    #[error("favorites store is closed")]
    Closed,
}

enum Command {
    Add(String, oneshot::Sender<Result<bool, FavoritesError>>),
    Remove(String, oneshot::Sender<Result<bool, FavoritesError>>),
    Clear(oneshot::Sender<Result<(), FavoritesError>>),
}

/// Cheap to clone; all clones talk to the same actor.
#[derive(Clone)]
pub struct FavoritesStore {
    commands: mpsc::Sender<Command>,
    updates: watch::Receiver<Vec<String>>,
}

impl FavoritesStore {
    /// Load the persisted list and start the actor on the current runtime.
    pub fn spawn(db: KeyValueDb) -> Result<Self, FavoritesError> {
        let stored = db.string_list(FAVORITES_KEY)?;
        let favorites = dedup_in_order(stored);

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (updates_tx, updates_rx) = watch::channel(favorites.clone());

        let actor = FavoritesActor {
            db,
            favorites,
            updates: updates_tx,
            commands: commands_rx,
        };
        tokio::spawn(actor.run());

        Ok(Self {
            commands: commands_tx,
            updates: updates_rx,
        })
    }

    /// Insertion order, oldest first.
    pub fn list(&self) -> Vec<String> {
        self.updates.borrow().clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.updates.borrow().iter().any(|f| f == id)
    }

    /// Returns `false` when the id was already a favorite.
    pub async fn add(&self, id: impl Into<String>) -> Result<bool, FavoritesError> {
        let id = id.into();
        self.request(|reply| Command::Add(id, reply)).await
    }

    /// Returns `false` when the id was not a favorite.
    pub async fn remove(&self, id: impl Into<String>) -> Result<bool, FavoritesError> {
        let id = id.into();
        self.request(|reply| Command::Remove(id, reply)).await
    }

    pub async fn clear(&self) -> Result<(), FavoritesError> {
        self.request(Command::Clear).await
    }

    /// Receives the full list after every committed change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.updates.clone()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, FavoritesError>>) -> Command,
    ) -> Result<T, FavoritesError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(make(reply_tx))
            .await
            .map_err(|_| FavoritesError::Closed)?;
        reply_rx.await.map_err(|_| FavoritesError::Closed)?
    }
}

struct FavoritesActor {
    db: KeyValueDb,
    favorites: Vec<String>,
    updates: watch::Sender<Vec<String>>,
    commands: mpsc::Receiver<Command>,
}

impl FavoritesActor {
    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Add(id, reply) => {
                    let _ = reply.send(self.add(id).await);
                }
                Command::Remove(id, reply) => {
                    let _ = reply.send(self.remove(&id).await);
                }
                Command::Clear(reply) => {
                    let _ = reply.send(self.clear().await);
                }
            }
        }
        debug!("favorites actor stopped");
    }

    async fn add(&mut self, id: String) -> Result<bool, FavoritesError> {
        if self.favorites.contains(&id) {
            return Ok(false);
        }
        let mut next = self.favorites.clone();
        next.push(id);
        self.commit(next).await?;
        Ok(true)
    }

    async fn remove(&mut self, id: &str) -> Result<bool, FavoritesError> {
        if !self.favorites.iter().any(|f| f == id) {
            return Ok(false);
        }
        let next = self.favorites.iter().filter(|f| *f != id).cloned().collect();
        self.commit(next).await?;
        Ok(true)
    }

    async fn clear(&mut self) -> Result<(), FavoritesError> {
        self.db
            .blocking(|db| db.remove(FAVORITES_KEY))
            .await
            .map_err(|e| {
                error!(error = %e, "failed to clear favorites");
                e
            })?;
        self.favorites.clear();
        self.updates.send_replace(Vec::new());
        Ok(())
    }

    /// Write, then swap in memory, then notify.
    async fn commit(&mut self, next: Vec<String>) -> Result<(), FavoritesError> {
        let stored = next.clone();
        self.db
            .blocking(move |db| db.set(FAVORITES_KEY, &stored))
            .await
            .map_err(|e| {
                error!(error = %e, "failed to persist favorites");
                e
            })?;
        self.favorites = next;
        self.updates.send_replace(self.favorites.clone());
        Ok(())
    }
}

fn dedup_in_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let before = ids.len();
    let ids: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
    if ids.len() != before {
        warn!(dropped = before - ids.len(), "stored favorites had duplicates");
    }
    ids
}

/// Display order for the favorites screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoritesSort {
    #[default]
    NewestFirst,
    OldestFirst,
    /// А → Я
    Alphabetical,
    /// Я → А
    ReverseAlphabetical,
}

/// Favorites resolved against the loaded catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoriteSigns {
    /// Insertion order unless sorted.
    pub signs: Vec<Sign>,
    /// Favorite ids with no matching sign.
    pub unresolved: Vec<String>,
}

impl FavoriteSigns {
    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }

    pub fn sort(&mut self, order: FavoritesSort) {
        match order {
            // Stored oldest first.
            FavoritesSort::OldestFirst => {}
            FavoritesSort::NewestFirst => self.signs.reverse(),
            FavoritesSort::Alphabetical => self
                .signs
                .sort_by_cached_key(|s| s.word.to_lowercase()),
            FavoritesSort::ReverseAlphabetical => {
                self.signs.sort_by_cached_key(|s| s.word.to_lowercase());
                self.signs.reverse();
            }
        }
    }
}

pub fn resolve_favorites(ids: &[String], signs: &[Sign]) -> FavoriteSigns {
    let by_id: HashMap<&str, &Sign> = signs.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut resolved = FavoriteSigns::default();
    for id in ids {
        match by_id.get(id.as_str()) {
            Some(sign) => resolved.signs.push((*sign).clone()),
            None => resolved.unresolved.push(id.clone()),
        }
    }
    if !resolved.unresolved.is_empty() {
        warn!(missing = ?resolved.unresolved, "favorites reference unknown signs");
    }
    resolved
}

/// Current favorites as signs. Ids that no longer resolve are reported, not
/// treated as an error.
pub async fn load_favorite_signs(
    favorites: &FavoritesStore,
    repository: &SignRepository,
) -> Result<FavoriteSigns, SignRepositoryError> {
    let ids = favorites.list();
    if ids.is_empty() {
        return Ok(FavoriteSigns::default());
    }
    let signs = repository.load_all_signs().await?;
    Ok(resolve_favorites(&ids, &signs))
}
