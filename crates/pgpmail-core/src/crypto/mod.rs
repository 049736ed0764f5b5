//! PGP decryption.
//!
//! [`KeyState`] caches the private key read from secret storage,
//! [`Cipher`] isolates the OpenPGP library, and [`Decryptor`] combines
//! both into a text-producing decrypt call.

mod cipher;
mod decryptor;
mod key_state;

pub use cipher::{Cipher, RpgpCipher};
pub use decryptor::Decryptor;
pub use key_state::{KeyMaterial, KeyState};

/// Errors that can occur while decrypting a message.
#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    /// No usable private key is configured.
    #[error("No usable private key")]
    KeyUnavailable,

    /// The stored private key could not be parsed.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// The message could not be decrypted.
    #[error("Decryption failed: {0}")]
    Decrypt(String),

    /// Decryption produced no usable text.
    #[error("Invalid plaintext: {0}")]
    InvalidPlaintext(String),
}
