//! Snapshot persistence.
//!
//! Applications describe writes as [`WriteSnapshot`] effects; the
//! [`storage_interpreter`] persists the latest one per commit. A store that
//! fails to write logs a warning and carries on.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::StorageConfig;
use crate::queue::{with_accum_vec, Process, QueueHandle};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON file holding one serialized snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.resolved_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored snapshot; `None` if nothing was stored yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let value = serde_json::from_str(&content).map_err(|e| StorageError::Json {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(Some(value))
    }

    /// Replace the stored snapshot. The new content is written next to the
    /// target and renamed over it, so readers never see a partial file.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let content = serde_json::to_string_pretty(value).map_err(|e| StorageError::Json {
            path: self.path.clone(),
            source: e,
        })?;
        let tmp = self.tmp_path();
        fs::write(&tmp, content).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Effect: persist `snapshot`.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteSnapshot<T> {
    pub snapshot: T,
}

impl<T> WriteSnapshot<T> {
    pub fn new(snapshot: T) -> Self {
        Self { snapshot }
    }
}

/// Interpreter for [`WriteSnapshot`] effects. Writes arriving in one drain
/// are collapsed: only the last is persisted at commit. Emits no actions.
pub fn storage_interpreter<T, A>(store: SnapshotStore) -> Process<WriteSnapshot<T>, A>
where
    T: Serialize + 'static,
    A: 'static,
{
    with_accum_vec(move |_: QueueHandle<A>| {
        move |mut batch: Vec<WriteSnapshot<T>>| {
            let count = batch.len();
            let Some(last) = batch.pop() else {
                return;
            };
            match store.save(&last.snapshot) {
                Ok(()) => {
                    tracing::debug!(path = %store.path().display(), collapsed = count, "snapshot saved")
                }
                Err(err) => tracing::warn!(error = %err, "failed to persist snapshot"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_path_sits_next_to_target() {
        let store = SnapshotStore::new("/data/todos.json");
        assert_eq!(store.tmp_path(), PathBuf::from("/data/todos.json.tmp"));
    }
}
