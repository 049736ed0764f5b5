//! Account settings validation.

use super::model::AccountSettings;

/// Validation error for account settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// IMAP host is empty.
    EmptyImapHost,
    /// IMAP port is invalid.
    InvalidImapPort,
    /// IMAP username is empty.
    EmptyImapUsername,
    /// IMAP password is empty.
    EmptyImapPassword,
    /// SMTP host is empty.
    EmptySmtpHost,
    /// SMTP port is invalid.
    InvalidSmtpPort,
    /// SMTP username is empty.
    EmptySmtpUsername,
    /// SMTP password is empty.
    EmptySmtpPassword,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyImapHost => "IMAP server is required",
            Self::InvalidImapPort => "IMAP port must be 1-65535",
            Self::EmptyImapUsername => "IMAP account is required",
            Self::EmptyImapPassword => "IMAP password is required",
            Self::EmptySmtpHost => "SMTP server is required",
            Self::InvalidSmtpPort => "SMTP port must be 1-65535",
            Self::EmptySmtpUsername => "SMTP account is required",
            Self::EmptySmtpPassword => "SMTP password is required",
        }
    }

    /// Get the secret name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        use crate::secret::keys;

        match self {
            Self::EmptyImapHost => keys::IMAP_SERVER,
            Self::InvalidImapPort => keys::IMAP_PORT,
            Self::EmptyImapUsername => keys::IMAP_ACCOUNT,
            Self::EmptyImapPassword => keys::IMAP_PASSWORD,
            Self::EmptySmtpHost => keys::SMTP_SERVER,
            Self::InvalidSmtpPort => keys::SMTP_PORT,
            Self::EmptySmtpUsername => keys::SMTP_ACCOUNT,
            Self::EmptySmtpPassword => keys::SMTP_PASSWORD,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating account settings.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate account settings.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all errors.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_settings(settings: &AccountSettings) -> ValidationResult {
    let mut errors = Vec::new();

    // IMAP validation
    if settings.imap.host.trim().is_empty() {
        errors.push(ValidationError::EmptyImapHost);
    }
    if settings.imap.port == 0 {
        errors.push(ValidationError::InvalidImapPort);
    }
    if settings.imap.username.trim().is_empty() {
        errors.push(ValidationError::EmptyImapUsername);
    }
    if settings.imap.password.is_empty() {
        errors.push(ValidationError::EmptyImapPassword);
    }

    // SMTP validation
    if settings.smtp.host.trim().is_empty() {
        errors.push(ValidationError::EmptySmtpHost);
    }
    if settings.smtp.port == 0 {
        errors.push(ValidationError::InvalidSmtpPort);
    }
    if settings.smtp.username.trim().is_empty() {
        errors.push(ValidationError::EmptySmtpUsername);
    }
    if settings.smtp.password.is_empty() {
        errors.push(ValidationError::EmptySmtpPassword);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Basic email validation.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}
