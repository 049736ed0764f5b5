//! Combined IMAP/SMTP login verification.

use std::time::Duration;

use tracing::{info, warn};

use super::model::AccountSettings;
use super::validation::{is_valid_email, validate_settings};
use crate::transport::{MailTransport, with_timeout};

/// Verdict of a credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    /// Both logins succeeded.
    Ok,
    /// Settings are incomplete; nothing was contacted.
    InvalidInput,
    /// Only the IMAP login failed.
    ImapInvalid,
    /// Only the SMTP login failed.
    SmtpInvalid,
    /// Both logins failed.
    BothInvalid,
}

impl CredentialCheck {
    /// Combines the two independent login results.
    #[must_use]
    pub const fn from_results(imap_ok: bool, smtp_ok: bool) -> Self {
        match (imap_ok, smtp_ok) {
            (true, true) => Self::Ok,
            (false, true) => Self::ImapInvalid,
            (true, false) => Self::SmtpInvalid,
            (false, false) => Self::BothInvalid,
        }
    }

    /// Returns true if both logins succeeded.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Get human-readable message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Ok => "Account verified",
            Self::InvalidInput => "Account settings are incomplete",
            Self::ImapInvalid => "IMAP login failed",
            Self::SmtpInvalid => "SMTP login failed",
            Self::BothInvalid => "IMAP and SMTP logins failed",
        }
    }
}

/// Verifies both logins in parallel.
///
/// Incomplete settings or an invalid verification mailbox short-circuit to
/// [`CredentialCheck::InvalidInput`] without contacting the server. Each
/// check is bounded by `timeout`; a timeout counts as a failed login.
pub async fn check_credentials(
    transport: &dyn MailTransport,
    settings: &AccountSettings,
    mailbox: &str,
    timeout: Duration,
) -> CredentialCheck {
    if let Err(errors) = validate_settings(settings) {
        warn!("Credential check skipped, {} invalid field(s)", errors.len());
        return CredentialCheck::InvalidInput;
    }
    if !is_valid_email(mailbox) {
        warn!("Credential check skipped, invalid mailbox {mailbox}");
        return CredentialCheck::InvalidInput;
    }

    let (imap, smtp) = tokio::join!(
        with_timeout(timeout, transport.check_imap()),
        with_timeout(timeout, transport.check_smtp(mailbox)),
    );

    if let Err(e) = &imap {
        warn!("IMAP check failed: {e}");
    }
    if let Err(e) = &smtp {
        warn!("SMTP check failed: {e}");
    }

    let verdict = CredentialCheck::from_results(imap.is_ok(), smtp.is_ok());
    info!("Credential check: {}", verdict.message());
    verdict
}
