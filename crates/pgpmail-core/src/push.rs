//! Push notification side channel.
//!
//! A push for encrypted mail carries only headers. The ciphertext is pulled
//! from the push endpoint, cached as a raw blob, and decrypted locally to
//! build the notification body.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cache::CacheKey;
use crate::config::DEFAULT_TRANSPORT_TIMEOUT_SECS;
use crate::model::deobfuscate;
use crate::pipeline::RetrievalPipeline;

/// Folder that pushed messages are cached under.
pub const PUSH_FOLDER: &str = "INBOX";

/// Errors that can occur while handling a push.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-200 status.
    #[error("Received {0} status code")]
    Status(u16),

    /// The endpoint returned no usable body.
    #[error("Invalid Data")]
    InvalidData,

    /// The ciphertext could not be turned into text.
    #[error("Unable to decode data")]
    Decode,

    /// The push payload lacked required fields.
    #[error("Bad userInfo")]
    BadPayload,
}

/// Fields of an incoming push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    /// Whether the pushed message is encrypted.
    #[serde(default)]
    pub encrypted: Option<bool>,
    /// Sender display text, possibly `" at "`-obfuscated.
    #[serde(default)]
    pub from: Option<String>,
    /// Message identifier in the inbox.
    #[serde(default)]
    pub uid: Option<u32>,
    /// Notification title supplied by the push.
    #[serde(default)]
    pub title: String,
}

/// Notification content produced for a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Title line.
    pub title: String,
    /// Sender on success, error message otherwise.
    pub subtitle: String,
    /// Message text, empty for errors.
    pub body: String,
}

impl Notification {
    /// Notification reporting `error` under the payload title.
    #[must_use]
    pub fn error(title: &str, error: &PushError) -> Self {
        Self {
            title: title.to_string(),
            subtitle: error.to_string(),
            body: String::new(),
        }
    }
}

/// Client for the decrypt-and-summarize endpoint.
#[derive(Debug, Clone)]
pub struct PushClient {
    endpoint: String,
    http: reqwest::Client,
}

impl PushClient {
    /// Creates a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TRANSPORT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Fetches the ciphertext of message `id` for device `token`.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Status`] for non-200 answers and
    /// [`PushError::InvalidData`] for request failures or empty bodies.
    pub async fn fetch_ciphertext(&self, token: &str, id: u32) -> Result<Vec<u8>, PushError> {
        let url = format!("{}/email/{token}/{id}", self.endpoint);
        debug!("Fetching pushed ciphertext for message {id}");

        let response = self.http.get(&url).send().await.map_err(|e| {
            warn!("Push fetch failed: {e}");
            PushError::InvalidData
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PushError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!("Push body unreadable: {e}");
            PushError::InvalidData
        })?;
        if body.is_empty() {
            return Err(PushError::InvalidData);
        }

        Ok(body.to_vec())
    }
}

/// Turns pushes for encrypted mail into notification content.
#[derive(Debug)]
pub struct PushHandler {
    client: PushClient,
    token: Option<String>,
    pipeline: Arc<RetrievalPipeline>,
}

impl PushHandler {
    /// Creates a handler. Without a device token every push is rejected.
    #[must_use]
    pub const fn new(
        client: PushClient,
        token: Option<String>,
        pipeline: Arc<RetrievalPipeline>,
    ) -> Self {
        Self {
            client,
            token,
            pipeline,
        }
    }

    /// Builds the notification for `payload`. Failures become error
    /// notifications.
    pub async fn handle(&self, payload: &PushPayload) -> Notification {
        match self.try_handle(payload).await {
            Ok(notification) => notification,
            Err(e) => {
                warn!("Push handling failed: {e}");
                Notification::error(&payload.title, &e)
            }
        }
    }

    async fn try_handle(&self, payload: &PushPayload) -> Result<Notification, PushError> {
        let (Some(true), Some(from), Some(uid)) =
            (payload.encrypted, payload.from.as_deref(), payload.uid)
        else {
            return Err(PushError::BadPayload);
        };
        let token = self.token.as_deref().ok_or(PushError::BadPayload)?;

        let ciphertext = self.client.fetch_ciphertext(token, uid).await?;
        self.pipeline
            .cache()
            .write(&CacheKey::raw_blob(PUSH_FOLDER, uid), &ciphertext)
            .await;

        let rendered = self
            .pipeline
            .render_ciphertext(uid, ciphertext)
            .await
            .map_err(|e| {
                debug!("Pushed message {uid} not decodable: {e}");
                PushError::Decode
            })?;

        let body = if rendered.is_html {
            html_to_text(&rendered.content)?
        } else {
            rendered.content
        };

        Ok(Notification {
            title: payload.title.clone(),
            subtitle: deobfuscate(from),
            body,
        })
    }
}

/// Flattens an HTML document to notification text.
fn html_to_text(html: &str) -> Result<String, PushError> {
    htmd::convert(html)
        .map(|text| text.trim().to_string())
        .map_err(|e| {
            debug!("HTML conversion failed: {e}");
            PushError::Decode
        })
}
