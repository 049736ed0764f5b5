//! Account settings, validation and credential verification.

mod check;
mod model;
mod validation;

pub use check::{CredentialCheck, check_credentials};
pub use model::{AccountSettings, Security, ServerConfig, is_enabled, set_enabled};
pub use validation::{ValidationError, ValidationResult, validate_settings};
