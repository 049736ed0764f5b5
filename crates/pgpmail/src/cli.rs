//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pgpmail", version, about = "PGP mail retrieval and cache tool")]
pub struct Cli {
    /// Configuration file, defaults to the per-user config directory
    #[arg(long, env = "PGPMAIL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the notification for a push payload (JSON)
    PushNotify {
        /// Payload such as `{"encrypted":true,"from":"a at b.com","uid":7,"title":"New"}`
        payload: String,
    },

    /// Print a message from the local cache
    Show {
        /// Folder name
        folder: String,
        /// Message identifier
        id: u32,
    },

    /// List the stored snapshot of a folder
    Snapshot {
        /// Folder name
        #[arg(default_value = "INBOX")]
        folder: String,
    },

    /// Delete every cached entry
    ClearCache,

    /// Report whether a usable private key is configured
    KeyCheck {
        /// Re-read the key from secret storage
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show() {
        let cli = Cli::try_parse_from(["pgpmail", "show", "Archive", "12"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Show { ref folder, id: 12 } if folder == "Archive"
        ));
    }

    #[test]
    fn test_snapshot_defaults_to_inbox() {
        let cli = Cli::try_parse_from(["pgpmail", "snapshot"]).unwrap();
        assert!(matches!(cli.command, Command::Snapshot { ref folder } if folder == "INBOX"));
    }
}
