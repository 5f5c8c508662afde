//! Persistent storage for the encrypted keyring blob
//!
//! Stores are opaque: they never see plaintext, only the bytes the keyring
//! hands them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors from store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Opaque encrypted-blob storage.
pub trait KeyStore: Send + Sync {
    /// Read the stored blob, if any.
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the stored blob.
    fn save(&self, blob: &[u8]) -> Result<(), StoreError>;

    /// Erase the stored blob. Succeeds if nothing was stored.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Keeps the blob in a single file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for FileKeyStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, blob: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to temp file first, then rename (atomic on most filesystems)
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, blob)?;
        fs::rename(&temp_path, &self.path)?;

        log::debug!("Saved keyring to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("Removed keyring file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    blob: Mutex<Option<Vec<u8>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `blob`, as if written by an earlier process.
    pub fn with_blob(blob: Vec<u8>) -> Self {
        Self {
            blob: Mutex::new(Some(blob)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Vec<u8>>> {
        self.blob.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyStore for MemoryKeyStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.slot().clone())
    }

    fn save(&self, blob: &[u8]) -> Result<(), StoreError> {
        *self.slot() = Some(blob.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot() = None;
        Ok(())
    }
}
