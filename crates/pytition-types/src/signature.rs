//! Petition signatures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{check_email, check_len, markup, PetitionId, SignatureId, ValidationError};

/// A stored signature.
///
/// A signature starts unconfirmed and is confirmed when the signer follows
/// the link carrying its `confirmation_hash`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Signature {
    pub id: SignatureId,
    pub petition_id: PetitionId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    /// Opaque token mailed to the signer.
    pub confirmation_hash: String,
    pub confirmed: bool,
    pub subscribed_to_mailinglist: bool,
    /// Unix timestamp (seconds).
    pub date: u64,
}

impl Signature {
    pub fn confirm(&mut self) {
        self.confirmed = true;
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.first_name, &self.last_name, &self.phone, &self.email)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.confirmed { "OK" } else { ".." };
        write!(
            f,
            "[{}:{}] {} {}",
            self.petition_id,
            state,
            markup::unescape(&self.first_name),
            markup::unescape(&self.last_name)
        )
    }
}

/// Signer-supplied fields of a new signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct NewSignature {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub subscribed_to_mailinglist: bool,
}

impl NewSignature {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: String::new(),
            email: email.into(),
            subscribed_to_mailinglist: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.first_name, &self.last_name, &self.phone, &self.email)
    }
}

fn validate_fields(
    first_name: &str,
    last_name: &str,
    phone: &str,
    email: &str,
) -> Result<(), ValidationError> {
    if first_name.trim().is_empty() {
        return Err(ValidationError::Required("first_name"));
    }
    if last_name.trim().is_empty() {
        return Err(ValidationError::Required("last_name"));
    }
    check_len("first_name", first_name, 50)?;
    check_len("last_name", last_name, 50)?;
    check_len("phone", phone, 20)?;
    check_email("email", email)
}
