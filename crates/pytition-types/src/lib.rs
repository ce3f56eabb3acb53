//! # pytition-types
//!
//! Shared domain types for the Pytition workspace: petition content and
//! configuration, signatures, templates, organizations and their
//! permissions, accounts with their shadow profiles, and the domain events
//! emitted when any of them change.
//!
//! Nothing in this crate touches storage. Persistence lives in
//! `pytition-db`; the types here only carry data and check field-level
//! rules before a write is attempted.

pub mod content;
pub mod events;
pub mod markup;
pub mod organization;
pub mod owner;
pub mod petition;
pub mod signature;
pub mod template;
pub mod user;

pub use content::{
    ConfirmationEmailConfig, LinearGradientDirection, NewsletterConfig,
    NewsletterSubscribeMethod, PetitionContent, PetitionStyle, SmtpSettings,
};
pub use organization::{Capability, Organization, Permission};
pub use owner::{Owner, OwnerKind, OwnerRef};
pub use petition::{NewPetition, Petition};
pub use signature::{NewSignature, Signature};
pub use template::{NewTemplate, PetitionTemplate, TemplateOwnership};
pub use user::{Account, NewAccount, PytitionUser, UserProfile};

/// Row identifiers (SQLite `INTEGER PRIMARY KEY`).
pub type PetitionId = i64;
pub type SignatureId = i64;
pub type TemplateId = i64;
pub type OrganizationId = i64;
pub type PermissionId = i64;
pub type UserId = i64;
pub type AccountId = i64;
pub type OwnershipId = i64;

/// Signature goal given to a petition when none is specified.
pub const DEFAULT_TARGET: i64 = 500;

/// SMTP host used when a petition does not override it.
pub const DEFAULT_SMTP_HOST: &str = "localhost";

/// SMTP port used when a petition does not override it.
pub const DEFAULT_SMTP_PORT: u16 = 25;

/// Message returned to the signer once a confirmation link is followed.
pub const CONFIRMATION_MESSAGE: &str = "Thank you for confirming your signature!";

/// Length in bytes of the random part of a confirmation token.
pub const CONFIRMATION_TOKEN_BYTES: usize = 32;

/// Error raised when a value would violate a domain rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A text field exceeds its storage limit.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },

    /// A required field is blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// A colour field is neither blank nor `#RRGGBB`.
    #[error("{field} is not a valid colour: {value:?}")]
    InvalidColor {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// An email field does not look like an address.
    #[error("{field} is not a valid email address: {value:?}")]
    InvalidEmail {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// A value is outside its enumerated set.
    #[error("{field} has unknown value {value:?}")]
    UnknownChoice {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// Petition targets cannot be negative.
    #[error("target must be non-negative, got {0}")]
    NegativeTarget(i64),

    /// The email already has a confirmed signature on this petition.
    #[error("You already signed the petition")]
    AlreadySigned,

    /// A template ownership row names no owner.
    #[error("The template needs to be owned by a User or an Organization. It cannot hang around alone by itself.")]
    OwnerMissing,

    /// A template ownership row names both a user and an organization.
    #[error("a template is owned by a user or an organization, not both")]
    OwnerAmbiguous,
}

/// Check that `value` fits in `max` characters.
pub(crate) fn check_len(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Minimal address check: something before and after a single `@`, and a dot
/// in the domain part.
pub(crate) fn check_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidEmail {
        field,
        value: value.to_string(),
    };
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || value.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(())
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
