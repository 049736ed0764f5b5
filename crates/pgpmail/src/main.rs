//! `pgpmail` - command-line front end for the retrieval pipeline.
//!
//! Works from the local cache and secret storage: handles push payloads,
//! shows cached messages, lists folder snapshots and checks the private key.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod offline;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pgpmail=info,pgpmail_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.clone()).await?;
    debug!("Using cache at {}", config.cache_dir.display());

    match cli.command {
        Command::PushNotify { payload } => commands::push_notify(&config, &payload).await,
        Command::Show { folder, id } => commands::show(&config, &folder, id).await,
        Command::Snapshot { folder } => commands::snapshot(&config, &folder).await,
        Command::ClearCache => commands::clear_cache(&config).await,
        Command::KeyCheck { force } => commands::key_check(force).await,
    }
}
