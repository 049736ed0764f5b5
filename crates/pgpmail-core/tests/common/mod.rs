//! Shared fixtures for the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;

use pgpmail_core::crypto::{Cipher, DecryptError, Decryptor, KeyState};
use pgpmail_core::secret::keys;
use pgpmail_core::{
    Attachment, ContentCache, FlagAction, Mailbox, MailTransport, MemorySecretStore,
    MessageFlags, MessageSummary, RawMessage, SecretStore, TransportError, TransportResult,
};

/// Prefix the fake cipher strips to "decrypt".
pub const CIPHER_PREFIX: &[u8] = b"ENC:";

/// Call-counting in-memory transport.
#[derive(Default)]
pub struct MockTransport {
    pub listings: Mutex<HashMap<String, Vec<MessageSummary>>>,
    pub messages: Mutex<HashMap<(String, u32), RawMessage>>,
    pub imap_invalid: AtomicBool,
    pub smtp_invalid: AtomicBool,
    pub offline: AtomicBool,
    pub stall: AtomicBool,
    pub fetch_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub check_calls: AtomicUsize,
    pub flag_calls: Mutex<Vec<(String, u32, FlagAction, MessageFlags)>>,
    pub moves: Mutex<Vec<(u32, String, String)>>,
    pub sent: Mutex<Vec<Vec<u8>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_message(&self, folder: &str, id: u32, message: RawMessage) {
        self.messages
            .lock()
            .unwrap()
            .insert((folder.to_string(), id), message);
    }

    pub fn set_listing(&self, folder: &str, messages: Vec<MessageSummary>) {
        self.listings
            .lock()
            .unwrap()
            .insert(folder.to_string(), messages);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> TransportResult<()> {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Offline);
        }
        Ok(())
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn check_imap(&self) -> TransportResult<()> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        if self.imap_invalid.load(Ordering::SeqCst) {
            return Err(TransportError::Authentication("imap rejected".to_string()));
        }
        Ok(())
    }

    async fn check_smtp(&self, _mailbox: &str) -> TransportResult<()> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        if self.smtp_invalid.load(Ordering::SeqCst) {
            return Err(TransportError::Authentication("smtp rejected".to_string()));
        }
        Ok(())
    }

    async fn list_messages(&self, folder: &str) -> TransportResult<Vec<MessageSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(folder)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_raw(&self, folder: &str, id: u32) -> TransportResult<RawMessage> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        self.messages
            .lock()
            .unwrap()
            .get(&(folder.to_string(), id))
            .cloned()
            .ok_or_else(|| TransportError::Operation(format!("no message {id}")))
    }

    async fn set_flags(
        &self,
        folder: &str,
        id: u32,
        action: FlagAction,
        flags: MessageFlags,
    ) -> TransportResult<()> {
        self.gate().await?;
        self.flag_calls
            .lock()
            .unwrap()
            .push((folder.to_string(), id, action, flags));
        Ok(())
    }

    async fn move_message(&self, id: u32, from: &str, to: &str) -> TransportResult<()> {
        self.gate().await?;
        self.moves
            .lock()
            .unwrap()
            .push((id, from.to_string(), to.to_string()));
        Ok(())
    }

    async fn send(&self, message: &[u8]) -> TransportResult<()> {
        self.gate().await?;
        self.sent.lock().unwrap().push(message.to_vec());
        Ok(())
    }
}

/// Cipher that strips [`CIPHER_PREFIX`] and counts calls.
#[derive(Default)]
pub struct FakeCipher {
    pub calls: AtomicUsize,
}

impl Cipher for FakeCipher {
    fn decrypt(
        &self,
        _key_armor: &str,
        _passphrase: &str,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, DecryptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ciphertext
            .strip_prefix(CIPHER_PREFIX)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| DecryptError::Decrypt("bad ciphertext".to_string()))
    }
}

/// Wires a decryptor to an in-memory secret store.
pub struct Keys {
    pub store: Arc<MemorySecretStore>,
    pub cipher: Arc<FakeCipher>,
    pub decryptor: Decryptor,
}

impl Keys {
    pub fn new(with_key: bool) -> Self {
        let store = Arc::new(MemorySecretStore::new());
        if with_key {
            store.set_string(keys::PRIVATE_KEY, "armored key").unwrap();
        }
        let cipher = Arc::new(FakeCipher::default());
        let state = Arc::new(KeyState::new(Arc::clone(&store) as Arc<dyn SecretStore>));
        let decryptor = Decryptor::new(state, Arc::clone(&cipher) as Arc<dyn Cipher>);
        Self {
            store,
            cipher,
            decryptor,
        }
    }

    pub fn install_key(&self) {
        self.store
            .set_string(keys::PRIVATE_KEY, "armored key")
            .unwrap();
    }

    pub fn decrypt_calls(&self) -> usize {
        self.cipher.calls.load(Ordering::SeqCst)
    }
}

pub fn temp_cache() -> (tempfile::TempDir, Arc<ContentCache>) {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(ContentCache::new(dir.path().join("cache")));
    (dir, cache)
}

/// Ciphertext the fake cipher turns into `plaintext`.
pub fn encrypt(plaintext: &str) -> Vec<u8> {
    [CIPHER_PREFIX, plaintext.as_bytes()].concat()
}

pub fn plain_message(body: &str) -> RawMessage {
    RawMessage {
        data: format!("Subject: hi\r\nContent-Type: text/plain\r\n\r\n{body}").into_bytes(),
        attachments: Vec::new(),
    }
}

pub fn encrypted_message(ciphertext: Vec<u8>) -> RawMessage {
    RawMessage {
        data: b"Content-Type: multipart/encrypted; boundary=x\r\n\r\n--x--\r\n".to_vec(),
        attachments: vec![
            Attachment {
                filename: "PGPMIME version identification".to_string(),
                data: b"Version: 1".to_vec(),
            },
            Attachment {
                filename: "encrypted.asc".to_string(),
                data: ciphertext,
            },
        ],
    }
}

pub fn summary(id: u32, timestamp: i64, flags: MessageFlags) -> MessageSummary {
    MessageSummary {
        id,
        flags,
        send_date: DateTime::from_timestamp(timestamp, 0).unwrap(),
        from: Mailbox::new("Sender", "sender@example.com"),
        to: vec![Mailbox::new("", "me@example.com")],
        cc: Vec::new(),
        bcc: Vec::new(),
        subject: format!("Message {id}"),
        unsubscribe: String::new(),
    }
}
