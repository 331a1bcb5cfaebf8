use super::{KeyValueStore, KvError};
use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File-based key-value storage: one file per key under a root directory.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Platform data directory for the application, when resolvable.
    pub fn default_root() -> Option<PathBuf> {
        ProjectDirs::from("", "", "phrasebook").map(|dirs| dirs.data_dir().to_path_buf())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn ensure_root(&self) -> Result<(), KvError> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        self.ensure_root()?;
        fs::write(self.key_path(key), value).map_err(|e| {
            if e.kind() == io::ErrorKind::StorageFull {
                KvError::QuotaExceeded {
                    key: key.to_string(),
                    attempted: value.len(),
                }
            } else {
                KvError::Io(e)
            }
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), KvError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KvError::Io(e)),
        }
    }
}
