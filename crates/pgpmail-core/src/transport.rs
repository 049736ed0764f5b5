//! Remote mail server contract.
//!
//! The wire protocol lives behind [`MailTransport`]; the core only relies on
//! the operations below and bounds each call with [`with_timeout`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use pgpmail_mime::MimeExtractor;

use crate::model::{FlagAction, MessageFlags, MessageSummary};

/// File name of the attachment carrying a PGP-encrypted body.
pub const ENCRYPTED_ATTACHMENT: &str = "encrypted.asc";

/// Errors that can occur during remote mail operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server rejected the operation.
    #[error("Operation failed: {0}")]
    Operation(String),

    /// The operation did not finish in time.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// No connection is available.
    #[error("Transport is offline")]
    Offline,
}

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// A named attachment of a fetched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment file name.
    pub filename: String,
    /// Decoded attachment bytes.
    pub data: Vec<u8>,
}

/// A fully fetched message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    /// Raw RFC 5322 bytes.
    pub data: Vec<u8>,
    /// Attachments found by the transport's parser.
    pub attachments: Vec<Attachment>,
}

impl RawMessage {
    /// Returns the first attachment with exactly this file name.
    #[must_use]
    pub fn attachment(&self, filename: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.filename == filename)
    }

    /// Returns the PGP-encrypted body, if the message carries one.
    #[must_use]
    pub fn encrypted_body(&self) -> Option<&Attachment> {
        self.attachment(ENCRYPTED_ATTACHMENT)
    }
}

/// Operations against the remote mail server.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Verifies the IMAP login.
    async fn check_imap(&self) -> TransportResult<()>;

    /// Verifies the SMTP login, using `mailbox` as the test sender.
    async fn check_smtp(&self, mailbox: &str) -> TransportResult<()>;

    /// Lists every message in `folder` with headers and flags.
    async fn list_messages(&self, folder: &str) -> TransportResult<Vec<MessageSummary>>;

    /// Fetches the full message `id` from `folder`.
    async fn fetch_raw(&self, folder: &str, id: u32) -> TransportResult<RawMessage>;

    /// Adds or removes flags on a message.
    async fn set_flags(
        &self,
        folder: &str,
        id: u32,
        action: FlagAction,
        flags: MessageFlags,
    ) -> TransportResult<()>;

    /// Moves message `id` from folder `from` to folder `to`.
    async fn move_message(&self, id: u32, from: &str, to: &str) -> TransportResult<()>;

    /// Submits an RFC 5322 message.
    async fn send(&self, message: &[u8]) -> TransportResult<()>;

    /// Renders a plaintext message body as an HTML document.
    ///
    /// Returns an empty string when the message has no displayable body.
    fn render_html(&self, message: &RawMessage) -> String {
        render_html_body(message)
    }
}

/// Renders a message body as HTML using the MIME extractor.
///
/// HTML bodies are wrapped in a document; plain-text bodies are escaped
/// with line breaks preserved.
#[must_use]
pub fn render_html_body(message: &RawMessage) -> String {
    let raw = String::from_utf8_lossy(&message.data);
    match MimeExtractor::new().extract(&raw) {
        Ok(extracted) => match extracted.into_display() {
            (html, true) => html,
            (text, false) => format!(
                "<html><body>{}</body></html>",
                escape_html(&text).replace('\n', "<br>")
            ),
        },
        Err(e) => {
            tracing::debug!("No renderable body: {e}");
            String::new()
        }
    }
}

/// Escapes text for inclusion in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Bounds a transport call by `limit`.
///
/// # Errors
///
/// Returns the call's own error, or [`TransportError::Timeout`] if it did
/// not finish in time.
pub async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = TransportResult<T>>,
) -> TransportResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| TransportError::Timeout(limit.as_secs()))?
}
