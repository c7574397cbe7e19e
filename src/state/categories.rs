// SPDX-License-Identifier: MPL-2.0

//! Category id → display name / icon / color lookups.

use crate::model::Category;
use crate::repository::{SignRepository, SignRepositoryError};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct CategoryIndex {
    by_id: RwLock<Option<HashMap<String, Category>>>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate from the repository. A no-op once loaded.
    pub async fn load(&self, repository: &SignRepository) -> Result<(), SignRepositoryError> {
        if self.is_loaded() {
            return Ok(());
        }
        self.reload(repository).await
    }

    /// Rebuild from the repository even if already loaded.
    pub async fn reload(&self, repository: &SignRepository) -> Result<(), SignRepositoryError> {
        let categories = repository.load_categories().await?;
        self.replace(&categories);
        Ok(())
    }

    pub fn replace(&self, categories: &[Category]) {
        let map: HashMap<_, _> = categories
            .iter()
            .map(|c| (c.id.clone(), c.clone()))
            .collect();
        debug!(count = map.len(), "category index rebuilt");
        *self.write() = Some(map);
    }

    /// Forget everything; the next `load` hits the repository again.
    pub fn reset(&self) {
        *self.write() = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.read().is_some()
    }

    /// Display name, or a humanized id when the category is unknown.
    pub fn name(&self, id: &str) -> String {
        self.read()
            .as_ref()
            .and_then(|m| m.get(id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| humanize(id))
    }

    pub fn icon(&self, id: &str) -> Option<String> {
        self.read().as_ref()?.get(id)?.icon.clone()
    }

    pub fn color(&self, id: &str) -> Option<String> {
        self.read().as_ref()?.get(id)?.color.clone()
    }

    pub fn category(&self, id: &str) -> Option<Category> {
        self.read().as_ref()?.get(id).cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<HashMap<String, Category>>> {
        self.by_id.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<HashMap<String, Category>>> {
        self.by_id.write().unwrap_or_else(|p| p.into_inner())
    }
}

/// "food_drinks" → "Food Drinks"
fn humanize(id: &str) -> String {
    id.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
