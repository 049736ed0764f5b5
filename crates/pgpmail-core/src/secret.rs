//! Secret storage for server credentials and the private key.
//!
//! [`KeyringSecretStore`] uses the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use keyring::Entry;
use tracing::{debug, warn};

/// Names of the recognised secrets.
pub mod keys {
    /// IMAP server hostname.
    pub const IMAP_SERVER: &str = "imapServer";
    /// IMAP server port, stored as a decimal string.
    pub const IMAP_PORT: &str = "imapPort";
    /// IMAP login name.
    pub const IMAP_ACCOUNT: &str = "imapAccount";
    /// IMAP password.
    pub const IMAP_PASSWORD: &str = "imapPassword";
    /// SMTP server hostname.
    pub const SMTP_SERVER: &str = "smtpServer";
    /// SMTP server port, stored as a decimal string.
    pub const SMTP_PORT: &str = "smtpPort";
    /// SMTP login name, also used as the sender address.
    pub const SMTP_ACCOUNT: &str = "smtpAccount";
    /// SMTP password.
    pub const SMTP_PASSWORD: &str = "smtpPassword";
    /// `"true"` once the account has been set up.
    pub const ENABLE: &str = "enable";
    /// Armored OpenPGP private key.
    pub const PRIVATE_KEY: &str = "privateKey";
    /// Passphrase of the private key.
    pub const KEY_PASSWORD: &str = "keyPassword";

    /// Every recognised secret name.
    pub const ALL: [&str; 11] = [
        IMAP_SERVER,
        IMAP_PORT,
        IMAP_ACCOUNT,
        IMAP_PASSWORD,
        SMTP_SERVER,
        SMTP_PORT,
        SMTP_ACCOUNT,
        SMTP_PASSWORD,
        ENABLE,
        PRIVATE_KEY,
        KEY_PASSWORD,
    ];
}

/// Default keyring service name.
const SERVICE_NAME: &str = "pgpmail";

/// Error type for secret storage operations.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type for secret storage operations.
pub type SecretResult<T> = std::result::Result<T, SecretError>;

/// Named string secrets.
pub trait SecretStore: Send + Sync {
    /// Reads a secret; `None` if it was never set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn get_string(&self, name: &str) -> SecretResult<Option<String>>;

    /// Writes a secret, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn set_string(&self, name: &str, value: &str) -> SecretResult<()>;

    /// Deletes a secret. Missing secrets are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    fn delete(&self, name: &str) -> SecretResult<()>;

    /// Deletes every recognised secret.
    ///
    /// # Errors
    ///
    /// Returns the first backend error encountered.
    fn delete_all(&self) -> SecretResult<()> {
        for name in keys::ALL {
            self.delete(name)?;
        }
        Ok(())
    }
}

/// Secret store backed by the system keyring.
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

impl KeyringSecretStore {
    /// Creates a store under the given keyring service name.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, name: &str) -> SecretResult<Entry> {
        Ok(Entry::new(&self.service, name)?)
    }
}

impl SecretStore for KeyringSecretStore {
    fn get_string(&self, name: &str) -> SecretResult<Option<String>> {
        match self.entry(name)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => {
                debug!("No secret stored for {name}");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_string(&self, name: &str, value: &str) -> SecretResult<()> {
        self.entry(name)?.set_password(value)?;
        debug!("Stored secret {name}");
        Ok(())
    }

    fn delete(&self, name: &str) -> SecretResult<()> {
        match self.entry(name)?.delete_credential() {
            Ok(()) => {
                debug!("Deleted secret {name}");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => {
                warn!("Failed to delete secret {name}: {e}");
                Err(e.into())
            }
        }
    }
}

/// In-process secret store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `(name, value)` pairs.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }
}

impl SecretStore for MemorySecretStore {
    fn get_string(&self, name: &str) -> SecretResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(name).cloned())
    }

    fn set_string(&self, name: &str, value: &str) -> SecretResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> SecretResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(name);
        Ok(())
    }
}
