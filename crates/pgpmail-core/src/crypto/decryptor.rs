//! Key-aware message decryption.

use std::sync::Arc;

use super::DecryptError;
use super::cipher::{Cipher, RpgpCipher};
use super::key_state::KeyState;

/// Decrypts ciphertext with the currently configured private key.
#[derive(Clone)]
pub struct Decryptor {
    keys: Arc<KeyState>,
    cipher: Arc<dyn Cipher>,
}

impl std::fmt::Debug for Decryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decryptor")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl Decryptor {
    /// Creates a decryptor over an explicit cipher.
    #[must_use]
    pub fn new(keys: Arc<KeyState>, cipher: Arc<dyn Cipher>) -> Self {
        Self { keys, cipher }
    }

    /// Creates a decryptor using [`RpgpCipher`].
    #[must_use]
    pub fn with_rpgp(keys: Arc<KeyState>) -> Self {
        Self::new(keys, Arc::new(RpgpCipher))
    }

    /// Key state shared with this decryptor.
    #[must_use]
    pub const fn keys(&self) -> &Arc<KeyState> {
        &self.keys
    }

    /// See [`KeyState::is_key_valid`].
    #[must_use]
    pub fn is_key_valid(&self, force_recheck: bool) -> bool {
        self.keys.is_key_valid(force_recheck)
    }

    /// Decrypts `ciphertext` to UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptError::KeyUnavailable`] without a usable key, and
    /// [`DecryptError::InvalidPlaintext`] for empty or non-UTF-8 output.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<String, DecryptError> {
        let key = self.keys.material().ok_or(DecryptError::KeyUnavailable)?;
        let plaintext = self
            .cipher
            .decrypt(&key.armor, &key.passphrase, ciphertext)?;

        if plaintext.is_empty() {
            return Err(DecryptError::InvalidPlaintext("empty output".to_string()));
        }

        String::from_utf8(plaintext).map_err(|e| DecryptError::InvalidPlaintext(e.to_string()))
    }

    /// Checks the key on the blocking pool.
    pub async fn check_key(&self, force_recheck: bool) -> bool {
        let keys = Arc::clone(&self.keys);
        tokio::task::spawn_blocking(move || keys.is_key_valid(force_recheck))
            .await
            .unwrap_or(false)
    }

    /// Decrypts on the blocking pool.
    ///
    /// # Errors
    ///
    /// See [`Decryptor::decrypt`].
    pub async fn decrypt_blocking(&self, ciphertext: Vec<u8>) -> Result<String, DecryptError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.decrypt(&ciphertext))
            .await
            .map_err(|e| DecryptError::Decrypt(format!("decrypt task failed: {e}")))?
    }
}
