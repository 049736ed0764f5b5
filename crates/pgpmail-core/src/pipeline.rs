//! Message content retrieval.
//!
//! Resolves a `(folder, id)` pair to displayable content, in order:
//!
//! 1. A non-empty finished rendering in the cache.
//! 2. A cached ciphertext blob, decrypted on every access.
//! 3. A fresh fetch from the transport. Encrypted bodies are cached as
//!    ciphertext only; plaintext renderings are cached in finished form.

use std::sync::Arc;
use std::time::Duration;

use pgpmail_mime::MimeExtractor;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::cache::{CacheKey, ContentCache};
use crate::config::DEFAULT_TRANSPORT_TIMEOUT_SECS;
use crate::crypto::{DecryptError, Decryptor};
use crate::model::RenderedContent;
use crate::transport::{MailTransport, TransportError, with_timeout};

/// Errors that can occur while producing message content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The message could not be fetched.
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    /// The private key disappeared between the key check and decryption.
    #[error("Decryption unavailable")]
    DecryptUnavailable,

    /// No displayable content could be produced.
    #[error("Unable to decode content: {0}")]
    Decode(String),
}

/// Cache, decrypt and extract pipeline in front of a [`MailTransport`].
pub struct RetrievalPipeline {
    transport: Arc<dyn MailTransport>,
    cache: Arc<ContentCache>,
    decryptor: Decryptor,
    extractor: MimeExtractor,
    timeout: Duration,
}

impl std::fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("cache", &self.cache)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RetrievalPipeline {
    /// Creates a pipeline with the default transport timeout.
    #[must_use]
    pub fn new(
        transport: Arc<dyn MailTransport>,
        cache: Arc<ContentCache>,
        decryptor: Decryptor,
    ) -> Self {
        Self {
            transport,
            cache,
            decryptor,
            extractor: MimeExtractor::new(),
            timeout: Duration::from_secs(DEFAULT_TRANSPORT_TIMEOUT_SECS),
        }
    }

    /// Overrides the transport timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the MIME extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: MimeExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Cache used by this pipeline.
    #[must_use]
    pub const fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Decryptor used by this pipeline.
    #[must_use]
    pub const fn decryptor(&self) -> &Decryptor {
        &self.decryptor
    }

    /// Returns displayable content for message `id` in `folder`.
    ///
    /// A missing or unusable private key yields the
    /// [`RenderedContent::key_unavailable`] placeholder rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Network`] if the message had to be fetched and
    /// the fetch failed, and [`ContentError::Decode`] if decryption or
    /// extraction produced nothing displayable.
    pub async fn get_content(
        &self,
        folder: &str,
        id: u32,
    ) -> Result<RenderedContent, ContentError> {
        let rendered_key = CacheKey::rendered(folder, id);
        if let Some(cached) = self.cache.read_json::<RenderedContent>(&rendered_key).await
            && !cached.is_failure()
        {
            debug!("Serving {rendered_key} from cache");
            return Ok(cached);
        }

        let blob_key = CacheKey::raw_blob(folder, id);
        if let Some(ciphertext) = self.cache.read(&blob_key).await {
            if !self.decryptor.check_key(false).await {
                debug!("No usable key for cached {blob_key}");
                return Ok(RenderedContent::key_unavailable(id));
            }
            return self.render_ciphertext(id, ciphertext).await;
        }

        let message = with_timeout(self.timeout, self.transport.fetch_raw(folder, id)).await?;

        if let Some(attachment) = message.encrypted_body() {
            self.cache.write(&blob_key, &attachment.data).await;
            if !self.decryptor.check_key(false).await {
                debug!("No usable key for fetched {blob_key}");
                return Ok(RenderedContent::key_unavailable(id));
            }
            return self.render_ciphertext(id, attachment.data.clone()).await;
        }

        let content = self.transport.render_html(&message);
        if content.is_empty() {
            return Err(ContentError::Decode(format!(
                "message {id} in {folder} has no displayable body"
            )));
        }

        let rendered = RenderedContent {
            id,
            encrypted: false,
            content,
            is_html: true,
        };
        self.cache.write_json(&rendered_key, &rendered).await;
        Ok(rendered)
    }

    /// Decrypts and extracts a ciphertext blob. Nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::DecryptUnavailable`] if no key is configured,
    /// and [`ContentError::Decode`] if decryption or extraction failed.
    pub async fn render_ciphertext(
        &self,
        id: u32,
        ciphertext: Vec<u8>,
    ) -> Result<RenderedContent, ContentError> {
        let plaintext = match self.decryptor.decrypt_blocking(ciphertext).await {
            Ok(plaintext) => plaintext,
            Err(DecryptError::KeyUnavailable) => return Err(ContentError::DecryptUnavailable),
            Err(e) => {
                warn!("Failed to decrypt message {id}: {e}");
                return Err(ContentError::Decode(e.to_string()));
            }
        };

        let extracted = self
            .extractor
            .extract(&plaintext)
            .map_err(|e| ContentError::Decode(e.to_string()))?;
        let (content, is_html) = extracted.into_display();

        Ok(RenderedContent {
            id,
            encrypted: true,
            content,
            is_html,
        })
    }

    /// Like [`get_content`](Self::get_content), but never fails.
    ///
    /// Errors are logged and replaced by
    /// [`RenderedContent::unable_to_load`].
    pub async fn load(&self, folder: &str, id: u32) -> RenderedContent {
        match self.get_content(folder, id).await {
            Ok(content) if !content.is_failure() => content,
            Ok(_) => {
                warn!("Empty content for message {id} in {folder}");
                RenderedContent::unable_to_load(id)
            }
            Err(e) => {
                warn!("Failed to load message {id} in {folder}: {e}");
                RenderedContent::unable_to_load(id)
            }
        }
    }

    /// Runs [`load`](Self::load) on a background task.
    ///
    /// The receiver is completed exactly once.
    pub fn spawn_load(
        self: Arc<Self>,
        folder: String,
        id: u32,
    ) -> oneshot::Receiver<RenderedContent> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let content = self.load(&folder, id).await;
            if tx.send(content).is_err() {
                debug!("Result for message {id} in {folder} was discarded");
            }
        });
        rx
    }
}
