// SPDX-License-Identifier: MPL-2.0

use crate::cache::CacheError;
use crate::cache::schema::SCHEMA;
use crate::config::{DATA_DIR_NAME, STORE_FILE_NAME};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Small durable key-value store, the local stand-in for platform defaults.
///
/// Values are JSON text so string lists and timestamps share one table.
#[derive(Clone)]
pub struct KeyValueDb {
    conn: Arc<Mutex<Connection>>,
}

impl KeyValueDb {
    /// Open or create the store in the platform data directory
    /// Path: ~/.local/share/rsl-dictionary/store.db
    pub fn open_default() -> Result<Self, CacheError> {
        Self::open(&Self::default_path()?)
    }

    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::StorageUnavailable(format!("failed to create store dir: {}", e))
            })?;
        }

        let conn = Connection::open(path)?;
        Self::migrate(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Throwaway store, used by tests and `--ephemeral` runs.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn default_path() -> Result<PathBuf, CacheError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| CacheError::StorageUnavailable("could not find data directory".into()))?;
        Ok(data_dir.join(DATA_DIR_NAME).join(STORE_FILE_NAME))
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(CacheError::from)
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, json, Self::now()],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        let conn = self.conn();
        conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }

    pub fn string_list(&self, key: &str) -> Result<Vec<String>, CacheError> {
        Ok(self.get::<Vec<String>>(key)?.unwrap_or_default())
    }

    /// Run `f` against this store on the blocking pool.
    pub async fn blocking<F, R>(&self, f: F) -> Result<R, CacheError>
    where
        F: FnOnce(&KeyValueDb) -> Result<R, CacheError> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| CacheError::StorageUnavailable(format!("store task failed: {e}")))?
    }

    /// Hold the connection lock, stalling every other caller.
    #[cfg(test)]
    pub(crate) fn hold(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}
