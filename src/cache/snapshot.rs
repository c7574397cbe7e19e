// SPDX-License-Identifier: MPL-2.0

//! On-disk snapshot of the last successful sync.
//!
//! One JSON document, replaced atomically: the new content goes to a temp file
//! in the same directory and is renamed over the old one, so a crash mid-write
//! leaves the previous snapshot readable.

use crate::cache::CacheError;
use crate::config::{DATA_DIR_NAME, SNAPSHOT_FILE_NAME};
use crate::model::SyncData;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at `dir`; the directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory, e.g. ~/.local/share/rsl-dictionary
    pub fn default_location() -> Result<Self, CacheError> {
        Self::default_dir().map(Self::new)
    }

    pub fn default_dir() -> Result<PathBuf, CacheError> {
        dirs::data_dir()
            .map(|d| d.join(DATA_DIR_NAME))
            .ok_or_else(|| CacheError::StorageUnavailable("could not find data directory".into()))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE_NAME)
    }

    pub fn save(&self, data: &SyncData) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            CacheError::StorageUnavailable(format!("{}: {e}", self.dir.display()))
        })?;

        let result = self.write_atomically(data);
        match &result {
            Ok(()) => info!(
                signs = data.signs.len(),
                categories = data.categories.len(),
                "snapshot saved"
            ),
            Err(e) => error!(error = %e, "snapshot save failed"),
        }
        result
    }

    fn write_atomically<T: Serialize + ?Sized>(&self, data: &T) -> Result<(), CacheError> {
        let tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| CacheError::Save(Box::new(e)))?;

        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, data).map_err(|e| CacheError::Save(Box::new(e)))?;
            writer.flush().map_err(|e| CacheError::Save(Box::new(e)))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| CacheError::Save(Box::new(e)))?;

        tmp.persist(self.path())
            .map_err(|e| CacheError::Save(Box::new(e.error)))?;
        Ok(())
    }

    /// `Ok(None)` when nothing was ever saved. A file that exists but does not
    /// decode is an error, not an empty cache.
    pub fn load(&self) -> Result<Option<SyncData>, CacheError> {
        let path = self.path();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot on disk");
                return Ok(None);
            }
            Err(e) => return Err(CacheError::Load(Box::new(e))),
        };

        let data: SyncData = serde_json::from_slice(&bytes).map_err(|e| {
            error!(path = %path.display(), error = %e, "snapshot is corrupt");
            CacheError::Load(Box::new(e))
        })?;

        info!(
            signs = data.signs.len(),
            categories = data.categories.len(),
            "snapshot loaded"
        );
        Ok(Some(data))
    }

    /// `save` on the blocking pool, keeping fsync and encoding off async workers.
    pub async fn save_async(&self, data: SyncData) -> Result<(), CacheError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save(&data))
            .await
            .map_err(|e| CacheError::Save(Box::new(e)))?
    }

    /// `load` on the blocking pool.
    pub async fn load_async(&self) -> Result<Option<SyncData>, CacheError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| CacheError::Load(Box::new(e)))?
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        match std::fs::remove_file(self.path()) {
            Ok(()) => {
                info!("snapshot removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::StorageUnavailable(e.to_string())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
