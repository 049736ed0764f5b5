//! Folder listing, flag and move operations.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{CacheKey, ContentCache};
use crate::compose::OutgoingMessage;
use crate::config::DEFAULT_TRANSPORT_TIMEOUT_SECS;
use crate::model::{FlagAction, Mailbox, MessageFlags, MessageSummary};
use crate::transport::{MailTransport, TransportResult, with_timeout};

/// Display name used on generated unsubscribe mail.
const UNSUBSCRIBE_NAME: &str = "Unsubscribe";

/// Body of generated unsubscribe mail.
const UNSUBSCRIBE_BODY: &str = "This message was automatically generated by PGPEmail.";

/// Folder-level operations with snapshot caching.
pub struct FolderService {
    transport: Arc<dyn MailTransport>,
    cache: Arc<ContentCache>,
    timeout: Duration,
}

impl std::fmt::Debug for FolderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderService")
            .field("cache", &self.cache)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl FolderService {
    /// Creates a service with the default transport timeout.
    #[must_use]
    pub fn new(transport: Arc<dyn MailTransport>, cache: Arc<ContentCache>) -> Self {
        Self {
            transport,
            cache,
            timeout: Duration::from_secs(DEFAULT_TRANSPORT_TIMEOUT_SECS),
        }
    }

    /// Overrides the transport timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the last stored snapshot of `folder`.
    ///
    /// Missing or corrupt snapshots read as empty. Reads do not wait for an
    /// in-flight refresh.
    pub async fn read_snapshot(&self, folder: &str) -> Vec<MessageSummary> {
        self.cache.ensure_folder(folder).await;
        self.cache
            .read_json(&CacheKey::snapshot(folder))
            .await
            .unwrap_or_default()
    }

    /// Lists `folder` remotely and overwrites its snapshot.
    ///
    /// Messages flagged deleted are dropped; the rest are ordered newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns the transport error; the stored snapshot is left untouched.
    pub async fn refresh(&self, folder: &str) -> TransportResult<Vec<MessageSummary>> {
        let mut messages = with_timeout(self.timeout, self.transport.list_messages(folder)).await?;

        messages.retain(|m| !m.is_deleted());
        messages.sort_by(|a, b| b.send_date.cmp(&a.send_date));

        let _guard = self.cache.lock_folder(folder).await;
        self.cache
            .write_json(&CacheKey::snapshot(folder), &messages)
            .await;

        info!("Refreshed {folder}: {} messages", messages.len());
        Ok(messages)
    }

    /// Adds or removes `flag` on a message, then mirrors the change into
    /// the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns the transport error; the snapshot is only updated on success.
    pub async fn set_flag(
        &self,
        folder: &str,
        id: u32,
        action: FlagAction,
        flag: MessageFlags,
    ) -> TransportResult<()> {
        with_timeout(
            self.timeout,
            self.transport.set_flags(folder, id, action, flag),
        )
        .await?;

        let key = CacheKey::snapshot(folder);
        let _guard = self.cache.lock_folder(folder).await;
        let Some(mut messages) = self.cache.read_json::<Vec<MessageSummary>>(&key).await else {
            return Ok(());
        };

        if let Some(message) = messages.iter_mut().find(|m| m.id == id) {
            action.apply(&mut message.flags, flag);
            self.cache.write_json(&key, &messages).await;
            debug!("Updated flags of {id} in {folder} snapshot");
        }

        Ok(())
    }

    /// Moves a message between folders.
    ///
    /// # Errors
    ///
    /// Returns the transport error.
    pub async fn move_message(&self, id: u32, from: &str, to: &str) -> TransportResult<()> {
        with_timeout(self.timeout, self.transport.move_message(id, from, to)).await?;
        info!("Moved message {id} from {from} to {to}");
        Ok(())
    }

    /// Sends a generated unsubscribe request from `sender` to `to`.
    ///
    /// # Errors
    ///
    /// Returns the transport error.
    pub async fn send_unsubscribe(
        &self,
        sender: &str,
        to: &str,
        subject: &str,
    ) -> TransportResult<()> {
        let message = OutgoingMessage::new(
            Mailbox::new(UNSUBSCRIBE_NAME, sender),
            subject,
            UNSUBSCRIBE_BODY,
        )
        .to(Mailbox::new(UNSUBSCRIBE_NAME, to));

        let bytes = message.to_rfc5322().into_bytes();
        with_timeout(self.timeout, self.transport.send(&bytes)).await?;
        info!("Sent unsubscribe request to {to}");
        Ok(())
    }
}
