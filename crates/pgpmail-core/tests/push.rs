//! Integration tests for the push notification side channel.
//!
//! A one-shot HTTP responder on localhost plays the push endpoint.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_test::{assert_err, assert_ok};

use pgpmail_core::{
    CacheKey, MailTransport, Notification, PushClient, PushError, PushHandler, PushPayload,
    RetrievalPipeline,
};

use common::{Keys, MockTransport, encrypt, temp_cache};

/// Serves a single request, returning the request line it saw.
async fn serve_once(status: &'static str, body: Vec<u8>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.unwrap();

        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });

    (endpoint, handle)
}

fn payload(uid: u32) -> PushPayload {
    PushPayload {
        encrypted: Some(true),
        from: Some("alice at example.com".to_string()),
        uid: Some(uid),
        title: "New message".to_string(),
    }
}

fn handler(
    endpoint: &str,
    token: Option<&str>,
    keys: &Keys,
    cache: &Arc<pgpmail_core::ContentCache>,
) -> PushHandler {
    let pipeline = RetrievalPipeline::new(
        MockTransport::new() as Arc<dyn MailTransport>,
        Arc::clone(cache),
        keys.decryptor.clone(),
    );
    PushHandler::new(
        PushClient::new(endpoint).unwrap(),
        token.map(ToString::to_string),
        Arc::new(pipeline),
    )
}

#[tokio::test]
async fn test_encrypted_push_builds_notification() {
    let (_dir, cache) = temp_cache();
    let keys = Keys::new(true);
    let ciphertext = encrypt("Content-Type: text/html\r\n\r\n<p>Lunch at noon</p>");
    let (endpoint, server) = serve_once("200 OK", ciphertext.clone()).await;

    let notification = handler(&endpoint, Some("device-1"), &keys, &cache)
        .handle(&payload(42))
        .await;

    assert_eq!(notification.title, "New message");
    assert_eq!(notification.subtitle, "alice@example.com");
    assert!(notification.body.contains("Lunch at noon"));
    assert!(!notification.body.contains("<p>"));

    let request_line = assert_ok!(server.await);
    assert!(request_line.starts_with("GET /email/device-1/42 "));
    assert_eq!(
        cache.read(&CacheKey::raw_blob("INBOX", 42)).await.unwrap(),
        ciphertext
    );
}

#[tokio::test]
async fn test_plain_text_push_body_is_kept() {
    let (_dir, cache) = temp_cache();
    let keys = Keys::new(true);
    let (endpoint, server) =
        serve_once("200 OK", encrypt("Content-Type: text/plain\r\n\r\nsee you")).await;

    let notification = handler(&endpoint, Some("device-1"), &keys, &cache)
        .handle(&payload(7))
        .await;

    assert_eq!(notification.body, "see you");
    assert_ok!(server.await);
}

#[tokio::test]
async fn test_missing_token_is_bad_payload() {
    let (_dir, cache) = temp_cache();
    let keys = Keys::new(true);

    let notification = handler("http://127.0.0.1:9", None, &keys, &cache)
        .handle(&payload(1))
        .await;

    assert_eq!(
        notification,
        Notification {
            title: "New message".to_string(),
            subtitle: "Bad userInfo".to_string(),
            body: String::new(),
        }
    );
}

#[tokio::test]
async fn test_unencrypted_push_is_bad_payload() {
    let (_dir, cache) = temp_cache();
    let keys = Keys::new(true);
    let mut plain = payload(1);
    plain.encrypted = Some(false);

    let notification = handler("http://127.0.0.1:9", Some("device-1"), &keys, &cache)
        .handle(&plain)
        .await;

    assert_eq!(notification.subtitle, PushError::BadPayload.to_string());
}

#[tokio::test]
async fn test_non_200_status_is_reported() {
    let (endpoint, server) = serve_once("404 Not Found", b"gone".to_vec()).await;
    let client = PushClient::new(&endpoint).unwrap();

    let err = assert_err!(client.fetch_ciphertext("device-1", 3).await);
    assert!(matches!(err, PushError::Status(404)));
    assert_eq!(err.to_string(), "Received 404 status code");
    assert_ok!(server.await);
}

#[tokio::test]
async fn test_empty_body_is_invalid_data() {
    let (endpoint, server) = serve_once("200 OK", Vec::new()).await;
    let client = PushClient::new(&endpoint).unwrap();

    let err = assert_err!(client.fetch_ciphertext("device-1", 3).await);
    assert!(matches!(err, PushError::InvalidData));
    assert_ok!(server.await);
}

#[tokio::test]
async fn test_undecryptable_push_is_decode_error() {
    let (_dir, cache) = temp_cache();
    let keys = Keys::new(true);
    let (endpoint, server) = serve_once("200 OK", b"not ciphertext".to_vec()).await;

    let notification = handler(&endpoint, Some("device-1"), &keys, &cache)
        .handle(&payload(5))
        .await;

    assert_eq!(notification.subtitle, "Unable to decode data");
    assert!(notification.body.is_empty());
    assert_ok!(server.await);
    assert!(cache.exists(&CacheKey::raw_blob("INBOX", 5)).await);
}
