//! Error types for the core library.

use thiserror::Error;

use crate::crypto::DecryptError;
use crate::pipeline::ContentError;
use crate::push::PushError;
use crate::secret::SecretError;
use crate::transport::TransportError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Remote mail operation failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Secret storage failed.
    #[error("Secret storage error: {0}")]
    Secret(#[from] SecretError),

    /// Decryption failed.
    #[error("Decryption error: {0}")]
    Decrypt(#[from] DecryptError),

    /// Message content could not be produced.
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Push side channel failed.
    #[error("Push error: {0}")]
    Push(#[from] PushError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
