//! # pgpmail-core
//!
//! Core retrieval pipeline for the pgpmail email client.
//!
//! This crate provides:
//! - Account settings held in secret storage, with credential verification
//! - A file-backed content cache for folder snapshots, renderings and
//!   ciphertext
//! - PGP decryption with a cached, re-validated private key
//! - The retrieval pipeline: cache, then decrypt, then MIME extraction
//! - Folder refresh, flag, move and unsubscribe operations
//! - The push notification side channel
//!
//! The mail server itself sits behind the [`MailTransport`] trait.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod cache;
pub mod compose;
pub mod config;
pub mod crypto;
mod error;
pub mod folder;
pub mod model;
pub mod pipeline;
pub mod push;
pub mod secret;
pub mod transport;

pub use account::{
    AccountSettings, CredentialCheck, Security, ServerConfig, ValidationError, ValidationResult,
    check_credentials, is_enabled, set_enabled, validate_settings,
};
pub use cache::{CacheKey, ContentCache};
pub use compose::OutgoingMessage;
pub use config::Config;
pub use crypto::{Cipher, DecryptError, Decryptor, KeyState, RpgpCipher};
pub use error::{Error, Result};
pub use folder::FolderService;
pub use model::{FlagAction, Mailbox, MessageFlags, MessageSummary, RenderedContent};
pub use pipeline::{ContentError, RetrievalPipeline};
pub use push::{Notification, PushClient, PushError, PushHandler, PushPayload};
pub use secret::{KeyringSecretStore, MemorySecretStore, SecretError, SecretStore};
pub use transport::{Attachment, MailTransport, RawMessage, TransportError, TransportResult};
