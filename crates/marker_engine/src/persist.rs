use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::storage_filename;
use crate::ports::KeyValueStore;
use crate::StorageError;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage directory unusable: {0}")]
    StorageDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Make sure `dir` can hold a storage area, creating it on first use.
pub fn ensure_storage_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::StorageDir(format!(
            "{} is not a directory",
            dir.display()
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => fs::create_dir_all(dir)
            .map_err(|err| PersistError::StorageDir(format!("{}: {err}", dir.display()))),
        Err(err) => Err(PersistError::StorageDir(format!("{}: {err}", dir.display()))),
    }
}

/// File access for one storage area. A value file is replaced as a whole,
/// so a reader sees either the old value or the new one.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replace the value file of one key through a synced sibling temp file.
    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_storage_dir(&self.dir)?;

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(content.as_bytes())?;
        staged.as_file().sync_all()?;

        let target = self.dir.join(filename);
        staged
            .persist(&target)
            .map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }

    /// Contents of `{dir}/{filename}`, `None` when it was never written.
    pub fn read(&self, filename: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.dir.join(filename)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn remove(&self, filename: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.dir.join(filename)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Persistent storage area: one JSON file per key.
#[derive(Clone)]
pub struct JsonFileStore {
    writer: Arc<AtomicFileWriter>,
}

impl JsonFileStore {
    pub fn open(dir: PathBuf) -> Result<Self, PersistError> {
        ensure_storage_dir(&dir)?;
        Ok(Self {
            writer: Arc::new(AtomicFileWriter::new(dir)),
        })
    }

    fn get_blocking(
        writer: &AtomicFileWriter,
        keys: &[String],
    ) -> Result<BTreeMap<String, Value>, StorageError> {
        let mut found = BTreeMap::new();
        for key in keys {
            let Some(content) = writer.read(&storage_filename(key))? else {
                continue;
            };
            let value = serde_json::from_str(&content).map_err(|source| StorageError::Malformed {
                key: key.clone(),
                source,
            })?;
            found.insert(key.clone(), value);
        }
        Ok(found)
    }

    fn set_blocking(
        writer: &AtomicFileWriter,
        entries: &BTreeMap<String, Value>,
    ) -> Result<(), StorageError> {
        for (key, value) in entries {
            let content = serde_json::to_string(value).map_err(|source| StorageError::Malformed {
                key: key.clone(),
                source,
            })?;
            writer.write(&storage_filename(key), &content)?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[String]) -> Result<BTreeMap<String, Value>, StorageError> {
        let writer = self.writer.clone();
        let keys = keys.to_vec();
        tokio::task::spawn_blocking(move || Self::get_blocking(&writer, &keys))
            .await
            .map_err(|err| StorageError::Backend(err.to_string()))?
    }

    async fn set(&self, entries: BTreeMap<String, Value>) -> Result<(), StorageError> {
        let writer = self.writer.clone();
        tokio::task::spawn_blocking(move || Self::set_blocking(&writer, &entries))
            .await
            .map_err(|err| StorageError::Backend(err.to_string()))?
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        let writer = self.writer.clone();
        let keys = keys.to_vec();
        tokio::task::spawn_blocking(move || {
            keys.iter()
                .try_for_each(|key| writer.remove(&storage_filename(key)))
                .map_err(StorageError::from)
        })
        .await
        .map_err(|err| StorageError::Backend(err.to_string()))?
    }
}
