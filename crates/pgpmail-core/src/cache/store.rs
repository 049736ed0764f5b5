//! Durable content cache.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::{Mutex as AsyncMutex, OnceCell, OwnedMutexGuard};
use tracing::{debug, warn};

use super::key::CacheKey;

/// File-backed cache of folder snapshots, renderings and ciphertext blobs.
///
/// The cache is best-effort: read failures and corrupt entries are misses,
/// write failures are logged and swallowed.
#[derive(Debug)]
pub struct ContentCache {
    root: PathBuf,
    root_ready: OnceCell<()>,
    folder_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ContentCache {
    /// Creates a cache rooted at `root`. Nothing is created until first use.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            root_ready: OnceCell::new(),
            folder_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of an entry.
    #[must_use]
    pub fn path_of(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Creates the root directory once per cache instance.
    async fn ensure_root(&self) -> io::Result<()> {
        self.root_ready
            .get_or_try_init(|| async {
                fs::create_dir_all(&self.root).await?;
                debug!("Cache root ready at {}", self.root.display());
                Ok::<(), io::Error>(())
            })
            .await?;
        Ok(())
    }

    /// Returns true if an entry is present.
    pub async fn exists(&self, key: &CacheKey) -> bool {
        fs::try_exists(self.path_of(key)).await.unwrap_or(false)
    }

    /// Reads an entry's bytes. Missing or unreadable entries are `None`.
    pub async fn read(&self, key: &CacheKey) -> Option<Vec<u8>> {
        match fs::read(self.path_of(key)).await {
            Ok(bytes) => {
                debug!("Cache hit for {key}");
                Some(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Cache miss for {key}");
                None
            }
            Err(e) => {
                warn!("Failed to read cache entry {key}: {e}");
                None
            }
        }
    }

    /// Reads and decodes a JSON entry. Corrupt entries are `None`.
    pub async fn read_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let bytes = self.read(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring corrupt cache entry {key}: {e}");
                None
            }
        }
    }

    /// Replaces an entry. Failures are logged, never returned.
    pub async fn write(&self, key: &CacheKey, bytes: &[u8]) {
        if let Err(e) = self.try_write(key, bytes).await {
            warn!("Failed to write cache entry {key}: {e}");
        }
    }

    /// Encodes and replaces a JSON entry. Failures are logged, never returned.
    pub async fn write_json<T: Serialize + Sync>(&self, key: &CacheKey, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.write(key, &bytes).await,
            Err(e) => warn!("Failed to encode cache entry {key}: {e}"),
        }
    }

    /// Stages into a uniquely named sibling temp file, then renames it over
    /// the entry.
    async fn try_write(&self, key: &CacheKey, bytes: &[u8]) -> io::Result<()> {
        self.ensure_root().await?;

        let path = self.path_of(key);
        let parent = path
            .parent()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        fs::create_dir_all(&parent).await?;

        let data = bytes.to_vec();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut staged = tempfile::NamedTempFile::new_in(&parent)?;
            staged.as_file_mut().write_all(&data)?;
            staged.as_file_mut().sync_all()?;
            staged.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)??;

        debug!("Cached {key} ({} bytes)", bytes.len());
        Ok(())
    }

    /// Removes an entry if present.
    pub async fn remove(&self, key: &CacheKey) {
        match fs::remove_file(self.path_of(key)).await {
            Ok(()) => debug!("Removed cache entry {key}"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove cache entry {key}: {e}"),
        }
    }

    /// Removes every entry under the cache root.
    pub async fn clear(&self) {
        if let Err(e) = self.try_clear().await {
            warn!("Failed to clear cache: {e}");
        }
    }

    async fn try_clear(&self) -> io::Result<()> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                fs::remove_dir_all(entry.path()).await?;
            } else {
                fs::remove_file(entry.path()).await?;
            }
            removed += 1;
        }

        debug!("Cleared {removed} cache entries");
        Ok(())
    }

    /// Ensures the per-folder directory exists.
    pub async fn ensure_folder(&self, folder: &str) {
        let result = async {
            self.ensure_root().await?;
            fs::create_dir_all(self.root.join(folder)).await
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to create cache folder {folder}: {e}");
        }
    }

    /// Acquires the exclusive write lock of a folder's snapshot.
    pub async fn lock_folder(&self, folder: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .folder_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(folder.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
