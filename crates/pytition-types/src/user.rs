//! Accounts and their Pytition profiles.
//!
//! An [`Account`] is the login record managed by the authentication layer.
//! Every account has exactly one [`PytitionUser`] profile holding the
//! petition-specific relations; the two are created and deleted together.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::owner::{Owner, OwnerKind, OwnerRef};
use crate::{check_email, check_len, AccountId, TemplateId, UserId, ValidationError};

/// Login record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
}

impl Account {
    /// "First Last", trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Stored accounts are always authenticated identities; anonymous
    /// visitors never have a row.
    pub fn is_authenticated(&self) -> bool {
        true
    }
}

/// Fields of an account being registered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct NewAccount {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl NewAccount {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::Required("username"));
        }
        check_len("username", &self.username, 150)?;
        check_len("first_name", &self.first_name, 150)?;
        check_len("last_name", &self.last_name, 150)?;
        if !self.email.is_empty() {
            check_email("email", &self.email)?;
        }
        Ok(())
    }
}

/// Pytition profile shadowing an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PytitionUser {
    pub id: UserId,
    pub account_id: AccountId,
    pub default_template_id: Option<TemplateId>,
    /// Unix timestamp (seconds) of the last save of the linked account.
    pub updated_at: u64,
}

/// A profile together with its account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct UserProfile {
    pub user: PytitionUser,
    pub account: Account,
}

impl UserProfile {
    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn username(&self) -> &str {
        &self.account.username
    }

    pub fn name(&self) -> &str {
        self.username()
    }

    pub fn display_name(&self) -> String {
        self.account.full_name()
    }

    pub fn is_authenticated(&self) -> bool {
        self.account.is_authenticated()
    }
}

impl Owner for UserProfile {
    fn kind(&self) -> OwnerKind {
        OwnerKind::User
    }

    fn fullname(&self) -> String {
        self.display_name()
    }

    fn owner_ref(&self) -> OwnerRef {
        OwnerRef::User(self.user.id)
    }
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}
