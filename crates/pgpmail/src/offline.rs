//! Transport used when no mail server is reachable.

use async_trait::async_trait;

use pgpmail_core::{
    FlagAction, MailTransport, MessageFlags, MessageSummary, RawMessage, TransportError,
    TransportResult,
};

/// Rejects every remote operation, leaving the pipeline to the cache.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineTransport;

#[async_trait]
impl MailTransport for OfflineTransport {
    async fn check_imap(&self) -> TransportResult<()> {
        Err(TransportError::Offline)
    }

    async fn check_smtp(&self, _mailbox: &str) -> TransportResult<()> {
        Err(TransportError::Offline)
    }

    async fn list_messages(&self, _folder: &str) -> TransportResult<Vec<MessageSummary>> {
        Err(TransportError::Offline)
    }

    async fn fetch_raw(&self, _folder: &str, _id: u32) -> TransportResult<RawMessage> {
        Err(TransportError::Offline)
    }

    async fn set_flags(
        &self,
        _folder: &str,
        _id: u32,
        _action: FlagAction,
        _flags: MessageFlags,
    ) -> TransportResult<()> {
        Err(TransportError::Offline)
    }

    async fn move_message(&self, _id: u32, _from: &str, _to: &str) -> TransportResult<()> {
        Err(TransportError::Offline)
    }

    async fn send(&self, _message: &[u8]) -> TransportResult<()> {
        Err(TransportError::Offline)
    }
}
