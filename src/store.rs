use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Durable text sink holding the clipboard history.
///
/// Every call completes its write before returning, so awaiting calls one
/// after another gives in-order completion against the same path.
#[async_trait]
pub trait TextStore: Send + Sync {
    /// Append `text` to the end of the file at `path`, creating it if absent.
    async fn append(&self, path: &Path, text: &str) -> Result<()>;

    /// Replace the whole content of `path` with `text`.
    async fn overwrite(&self, path: &Path, text: &str) -> Result<()>;

    /// Read the whole content of `path`. Fails with [`StoreError::NotFound`]
    /// when nothing has been written yet.
    async fn read_all(&self, path: &Path) -> Result<String>;

    /// Create an empty file at `path` unless one already exists.
    async fn create_if_absent(&self, path: &Path) -> Result<()>;
}

/// UTF-8 text file store backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTextStore;

impl FileTextStore {
    pub fn new() -> Self {
        Self
    }

    async fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::from_io(parent, e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl TextStore for FileTextStore {
    async fn append(&self, path: &Path, text: &str) -> Result<()> {
        Self::ensure_parent(path).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| StoreError::from_io(path, e))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| StoreError::from_io(path, e))?;
        file.flush().await.map_err(|e| StoreError::from_io(path, e))?;
        Ok(())
    }

    async fn overwrite(&self, path: &Path, text: &str) -> Result<()> {
        Self::ensure_parent(path).await?;
        tokio::fs::write(path, text)
            .await
            .map_err(|e| StoreError::from_io(path, e))
    }

    async fn read_all(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::from_io(path, e))
    }

    async fn create_if_absent(&self, path: &Path) -> Result<()> {
        Self::ensure_parent(path).await?;
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_io(path, e))
    }
}

/// In-process store keyed by path. Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemoryTextStore {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryTextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a permission error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Release);
    }

    /// Snapshot of a file's content, `None` if it was never created.
    pub fn contents(&self, path: &Path) -> Option<String> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, String>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if self.fail_writes.load(Ordering::Acquire) {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "store is read-only",
                ),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TextStore for MemoryTextStore {
    async fn append(&self, path: &Path, text: &str) -> Result<()> {
        self.check_writable(path)?;
        self.lock()
            .entry(path.to_path_buf())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn overwrite(&self, path: &Path, text: &str) -> Result<()> {
        self.check_writable(path)?;
        self.lock().insert(path.to_path_buf(), text.to_string());
        Ok(())
    }

    async fn read_all(&self, path: &Path) -> Result<String> {
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    async fn create_if_absent(&self, path: &Path) -> Result<()> {
        self.check_writable(path)?;
        self.lock().entry(path.to_path_buf()).or_default();
        Ok(())
    }
}
