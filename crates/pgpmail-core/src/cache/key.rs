//! Cache entry naming.

use std::fmt;

/// Identifies one persisted cache entry.
///
/// The relative paths are stable and shared with other readers of the
/// cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Folder listing snapshot: `{folder}.data`.
    Snapshot {
        /// Folder name.
        folder: String,
    },
    /// Finished rendering: `{folder}/{id}.data`.
    Rendered {
        /// Folder name.
        folder: String,
        /// Message identifier.
        id: u32,
    },
    /// Undecrypted ciphertext: `{folder}/{id}_pgp.data`.
    RawBlob {
        /// Folder name.
        folder: String,
        /// Message identifier.
        id: u32,
    },
}

impl CacheKey {
    /// Key of a folder snapshot.
    #[must_use]
    pub fn snapshot(folder: impl Into<String>) -> Self {
        Self::Snapshot {
            folder: folder.into(),
        }
    }

    /// Key of a finished rendering.
    #[must_use]
    pub fn rendered(folder: impl Into<String>, id: u32) -> Self {
        Self::Rendered {
            folder: folder.into(),
            id,
        }
    }

    /// Key of a cached ciphertext blob.
    #[must_use]
    pub fn raw_blob(folder: impl Into<String>, id: u32) -> Self {
        Self::RawBlob {
            folder: folder.into(),
            id,
        }
    }

    /// Folder this entry belongs to.
    #[must_use]
    pub fn folder(&self) -> &str {
        match self {
            Self::Snapshot { folder }
            | Self::Rendered { folder, .. }
            | Self::RawBlob { folder, .. } => folder,
        }
    }

    /// Path relative to the cache root.
    #[must_use]
    pub fn relative_path(&self) -> String {
        match self {
            Self::Snapshot { folder } => format!("{folder}.data"),
            Self::Rendered { folder, id } => format!("{folder}/{id}.data"),
            Self::RawBlob { folder, id } => format!("{folder}/{id}_pgp.data"),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_path())
    }
}
