//! Application configuration file.
//!
//! Server credentials never live here; they are read from the
//! [`SecretStore`](crate::SecretStore).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Directory name used under the platform config and data directories.
const APP_DIR: &str = "pgpmail";

/// Config file name.
const CONFIG_FILE: &str = "config.json";

/// Default bound on every remote operation.
pub const DEFAULT_TRANSPORT_TIMEOUT_SECS: u64 = 30;

/// Persistent application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the content cache.
    pub cache_dir: PathBuf,
    /// Timeout applied to each transport call, in seconds.
    pub transport_timeout_secs: u64,
    /// Base URL of the decrypt-and-summarize push endpoint.
    pub push_endpoint: Option<String>,
    /// Device token registered with the push endpoint.
    pub push_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            transport_timeout_secs: DEFAULT_TRANSPORT_TIMEOUT_SECS,
            push_endpoint: None,
            push_token: None,
        }
    }
}

impl Config {
    /// Path of the config file.
    #[must_use]
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    /// Loads the config file, falling back to defaults when it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_from(Self::path()).await
    }

    /// Loads configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_from(path: PathBuf) -> Result<Self> {
        if !tokio::fs::try_exists(&path).await? {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config file, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save(&self) -> Result<()> {
        self.save_to(Self::path()).await
    }

    /// Writes configuration to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, contents).await?;

        tracing::info!("Config saved to {}", path.display());
        Ok(())
    }

    /// Transport timeout as a [`Duration`].
    #[must_use]
    pub const fn transport_timeout(&self) -> Duration {
        Duration::from_secs(self.transport_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.transport_timeout_secs == 0 {
            return Err(Error::Config(
                "transport_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("cache")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.transport_timeout(), Duration::from_secs(30));
        assert!(config.cache_dir.ends_with("pgpmail/cache"));
        assert!(config.push_endpoint.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            cache_dir: dir.path().join("cache"),
            transport_timeout_secs: 10,
            push_endpoint: Some("https://push.example.com".to_string()),
            push_token: Some("token".to_string()),
        };
        config.save_to(path.clone()).await.unwrap();

        let loaded = Config::load_from(path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"push_token":"abc"}"#).await.unwrap();

        let loaded = Config::load_from(path).await.unwrap();
        assert_eq!(loaded.push_token.as_deref(), Some("abc"));
        assert_eq!(loaded.transport_timeout_secs, DEFAULT_TRANSPORT_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, r#"{"transport_timeout_secs":0}"#)
            .await
            .unwrap();

        let err = Config::load_from(path).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
