//! Account settings read from secret storage.

use crate::secret::{SecretResult, SecretStore, keys};

/// Security/encryption mode for connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Implicit TLS (connect directly with TLS).
    #[default]
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    StartTls,
}

impl Security {
    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Tls => "SSL/TLS",
            Self::StartTls => "STARTTLS",
        }
    }
}

/// Connection settings for one server.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server hostname.
    pub host: String,
    /// Server port, 0 if unset or unparsable.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// IMAP and SMTP settings of the single configured account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSettings {
    /// Incoming server, always implicit TLS.
    pub imap: ServerConfig,
    /// Outgoing server, always STARTTLS.
    pub smtp: ServerConfig,
    /// Sender address, taken from the SMTP login.
    pub email: String,
}

impl AccountSettings {
    /// Reads settings from secret storage. Missing entries read as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret store cannot be reached.
    pub fn load(store: &dyn SecretStore) -> SecretResult<Self> {
        let get = |name: &str| -> SecretResult<String> {
            Ok(store.get_string(name)?.unwrap_or_default())
        };

        let imap = ServerConfig {
            host: get(keys::IMAP_SERVER)?,
            port: parse_port(&get(keys::IMAP_PORT)?),
            security: Security::Tls,
            username: get(keys::IMAP_ACCOUNT)?,
            password: get(keys::IMAP_PASSWORD)?,
        };

        let smtp = ServerConfig {
            host: get(keys::SMTP_SERVER)?,
            port: parse_port(&get(keys::SMTP_PORT)?),
            security: Security::StartTls,
            username: get(keys::SMTP_ACCOUNT)?,
            password: get(keys::SMTP_PASSWORD)?,
        };

        let email = smtp.username.clone();
        Ok(Self { imap, smtp, email })
    }

    /// Writes settings to secret storage.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails.
    pub fn save(&self, store: &dyn SecretStore) -> SecretResult<()> {
        store.set_string(keys::IMAP_SERVER, &self.imap.host)?;
        store.set_string(keys::IMAP_PORT, &self.imap.port.to_string())?;
        store.set_string(keys::IMAP_ACCOUNT, &self.imap.username)?;
        store.set_string(keys::IMAP_PASSWORD, &self.imap.password)?;
        store.set_string(keys::SMTP_SERVER, &self.smtp.host)?;
        store.set_string(keys::SMTP_PORT, &self.smtp.port.to_string())?;
        store.set_string(keys::SMTP_ACCOUNT, &self.smtp.username)?;
        store.set_string(keys::SMTP_PASSWORD, &self.smtp.password)?;
        tracing::debug!("Saved account settings for {}", self.smtp.username);
        Ok(())
    }
}

/// Returns true once the account has been enabled.
///
/// # Errors
///
/// Returns an error if the secret store cannot be reached.
pub fn is_enabled(store: &dyn SecretStore) -> SecretResult<bool> {
    Ok(store.get_string(keys::ENABLE)?.as_deref() == Some("true"))
}

/// Marks the account enabled or disabled.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn set_enabled(store: &dyn SecretStore, enabled: bool) -> SecretResult<()> {
    store.set_string(keys::ENABLE, if enabled { "true" } else { "false" })
}

fn parse_port(value: &str) -> u16 {
    value.trim().parse().unwrap_or(0)
}
