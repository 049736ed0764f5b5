//! Cached private key material.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::secret::{SecretStore, keys};

/// Private key plus passphrase as read from secret storage.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Armored private key.
    pub armor: String,
    /// Key passphrase, empty if none was stored.
    pub passphrase: String,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("armor", &format_args!("<{} bytes>", self.armor.len()))
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Last validated key material, re-read from secret storage on demand.
pub struct KeyState {
    store: Arc<dyn SecretStore>,
    cached: RwLock<Option<KeyMaterial>>,
}

impl std::fmt::Debug for KeyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyState")
            .field("cached", &self.has_cached_key())
            .finish_non_exhaustive()
    }
}

impl KeyState {
    /// Creates an empty state reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            cached: RwLock::new(None),
        }
    }

    /// Returns true if a key was validated earlier and is still cached.
    #[must_use]
    pub fn has_cached_key(&self) -> bool {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Reports whether a usable private key is available.
    ///
    /// Without `force_recheck` a cached key answers immediately. Otherwise
    /// the key is re-read from secret storage; a missing or empty key
    /// clears the cache.
    pub fn is_key_valid(&self, force_recheck: bool) -> bool {
        if !force_recheck && self.has_cached_key() {
            return true;
        }

        let loaded = self.load();
        let valid = loaded.is_some();
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = loaded;
        debug!("Private key check (forced: {force_recheck}): valid={valid}");
        valid
    }

    /// Returns the key material, loading it if nothing is cached.
    #[must_use]
    pub fn material(&self) -> Option<KeyMaterial> {
        if !self.is_key_valid(false) {
            return None;
        }
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drops the cached key so the next check re-reads secret storage.
    pub fn invalidate(&self) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn load(&self) -> Option<KeyMaterial> {
        let armor = match self.store.get_string(keys::PRIVATE_KEY) {
            Ok(Some(armor)) if !armor.trim().is_empty() => armor,
            Ok(_) => return None,
            Err(e) => {
                warn!("Failed to read private key: {e}");
                return None;
            }
        };

        let passphrase = match self.store.get_string(keys::KEY_PASSWORD) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read key passphrase: {e}");
                String::new()
            }
        };

        Some(KeyMaterial { armor, passphrase })
    }
}
