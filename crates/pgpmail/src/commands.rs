//! Command implementations over the core library.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::info;

use pgpmail_core::{
    Config, ContentCache, Decryptor, FolderService, KeyState, KeyringSecretStore, MailTransport,
    PushClient, PushHandler, PushPayload, RetrievalPipeline, SecretStore,
};

use crate::offline::OfflineTransport;

/// Loads the configuration from `path`, or from the default location.
pub async fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path).await,
        None => Config::load().await,
    };
    config.context("Failed to load configuration")
}

fn cache(config: &Config) -> Arc<ContentCache> {
    Arc::new(ContentCache::new(config.cache_dir.clone()))
}

fn key_state() -> Arc<KeyState> {
    let store: Arc<dyn SecretStore> = Arc::new(KeyringSecretStore::default());
    Arc::new(KeyState::new(store))
}

fn offline_pipeline(config: &Config) -> RetrievalPipeline {
    let transport: Arc<dyn MailTransport> = Arc::new(OfflineTransport);
    RetrievalPipeline::new(transport, cache(config), Decryptor::with_rpgp(key_state()))
        .with_timeout(config.transport_timeout())
}

/// Builds and prints the notification for a push payload.
pub async fn push_notify(config: &Config, payload: &str) -> Result<()> {
    let payload: PushPayload =
        serde_json::from_str(payload).context("Push payload is not valid JSON")?;
    let Some(endpoint) = config.push_endpoint.as_deref() else {
        bail!("No push endpoint configured");
    };

    let handler = PushHandler::new(
        PushClient::new(endpoint)?,
        config.push_token.clone(),
        Arc::new(offline_pipeline(config)),
    );
    let notification = handler.handle(&payload).await;

    println!("{}", notification.title);
    println!("{}", notification.subtitle);
    if !notification.body.is_empty() {
        println!();
        println!("{}", notification.body);
    }
    Ok(())
}

/// Prints a message using only cached data.
pub async fn show(config: &Config, folder: &str, id: u32) -> Result<()> {
    let content = offline_pipeline(config).load(folder, id).await;
    if content.encrypted {
        info!("Message {id} in {folder} is encrypted");
    }
    println!("{}", content.content);
    Ok(())
}

/// Lists the stored snapshot of a folder.
pub async fn snapshot(config: &Config, folder: &str) -> Result<()> {
    let transport: Arc<dyn MailTransport> = Arc::new(OfflineTransport);
    let messages = FolderService::new(transport, cache(config))
        .read_snapshot(folder)
        .await;

    if messages.is_empty() {
        println!("No cached messages in {folder}");
        return Ok(());
    }

    for message in &messages {
        let marker = match (message.is_seen(), message.is_flagged()) {
            (_, true) => '!',
            (false, false) => '*',
            (true, false) => ' ',
        };
        println!(
            "{marker} {:>6}  {}  {:<24}  {}",
            message.id,
            message.send_date.format("%Y-%m-%d %H:%M"),
            message.from.label(),
            message.subject
        );
    }
    Ok(())
}

/// Deletes every cached entry.
pub async fn clear_cache(config: &Config) -> Result<()> {
    cache(config).clear().await;
    println!("Cleared {}", config.cache_dir.display());
    Ok(())
}

/// Reports whether a usable private key is configured.
pub async fn key_check(force: bool) -> Result<()> {
    let decryptor = Decryptor::with_rpgp(key_state());
    if decryptor.check_key(force).await {
        println!("Private key available");
    } else {
        println!("No usable private key, add one in settings");
    }
    Ok(())
}
