//! OpenPGP decryption backend.

use std::io::Cursor;

use pgp::{Deserializable, Message, SignedSecretKey};

use super::DecryptError;

/// Decrypts OpenPGP messages with a private key.
pub trait Cipher: Send + Sync {
    /// Decrypts `ciphertext` with the armored private key.
    ///
    /// `passphrase` unlocks secret-key material only. Signatures are not
    /// verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or message cannot be parsed, or no
    /// session key could be recovered.
    fn decrypt(
        &self,
        key_armor: &str,
        passphrase: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, DecryptError>;
}

/// [`Cipher`] backed by the pure-Rust `pgp` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpgpCipher;

impl RpgpCipher {
    fn parse_key(key_armor: &str) -> Result<SignedSecretKey, DecryptError> {
        let (key, _headers) = SignedSecretKey::from_string(key_armor)
            .map_err(|e| DecryptError::InvalidKey(e.to_string()))?;
        Ok(key)
    }

    /// Accepts ASCII-armored messages and falls back to binary packets.
    fn parse_message(ciphertext: &[u8]) -> Result<Message, DecryptError> {
        if is_armored(ciphertext) {
            if let Ok((message, _headers)) = Message::from_armor_single(Cursor::new(ciphertext)) {
                return Ok(message);
            }
            tracing::debug!("Armored parse failed, trying binary packets");
        }

        Message::from_bytes(Cursor::new(ciphertext))
            .map_err(|e| DecryptError::Decrypt(format!("unreadable message: {e}")))
    }
}

impl Cipher for RpgpCipher {
    fn decrypt(
        &self,
        key_armor: &str,
        passphrase: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, DecryptError> {
        let key = Self::parse_key(key_armor)?;
        let message = Self::parse_message(ciphertext)?;

        let passphrase = passphrase.to_string();
        let (mut decrypter, _key_ids) = message
            .decrypt(move || passphrase.clone(), &[&key])
            .map_err(|e| DecryptError::Decrypt(e.to_string()))?;

        let decrypted = decrypter
            .next()
            .ok_or_else(|| DecryptError::Decrypt("no decryptable packet".to_string()))?
            .map_err(|e| DecryptError::Decrypt(e.to_string()))?;

        decrypted
            .decompress()
            .and_then(|literal| literal.get_content())
            .map_err(|e| DecryptError::Decrypt(e.to_string()))?
            .ok_or_else(|| DecryptError::InvalidPlaintext("no literal data".to_string()))
    }
}

fn is_armored(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    data[start..].starts_with(b"-----BEGIN PGP")
}
