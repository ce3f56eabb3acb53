//! Owners of petitions and templates.
//!
//! Users and organizations both own petitions and templates, and pages that
//! list "what belongs to X" treat them the same way. [`Owner`] is the shared
//! surface; [`OwnerRef`] is the storage-level pointer to one of them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{OrganizationId, UserId};

/// Discriminator for the two owner variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    User,
    Org,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Org => "org",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can own petitions and templates.
pub trait Owner {
    fn kind(&self) -> OwnerKind;

    /// Human-readable name shown in listings.
    fn fullname(&self) -> String;

    /// Pointer usable in ownership rows.
    fn owner_ref(&self) -> OwnerRef;
}

/// Reference to an owner by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerRef {
    User(UserId),
    Organization(OrganizationId),
}

impl OwnerRef {
    pub fn kind(&self) -> OwnerKind {
        match self {
            Self::User(_) => OwnerKind::User,
            Self::Organization(_) => OwnerKind::Org,
        }
    }

    /// `(user_id, organization_id)` column pair.
    pub fn columns(&self) -> (Option<UserId>, Option<OrganizationId>) {
        match *self {
            Self::User(id) => (Some(id), None),
            Self::Organization(id) => (None, Some(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_ref_columns() {
        assert_eq!(OwnerRef::User(3).columns(), (Some(3), None));
        assert_eq!(OwnerRef::Organization(9).columns(), (None, Some(9)));
        assert_eq!(OwnerRef::User(3).kind().as_str(), "user");
        assert_eq!(OwnerRef::Organization(9).kind().as_str(), "org");
    }

    #[test]
    fn test_owner_ref_json() {
        let json = serde_json::to_value(OwnerRef::Organization(2)).expect("ser");
        assert_eq!(json, serde_json::json!({"kind": "organization", "id": 2}));
        let back: OwnerRef = serde_json::from_value(json).expect("de");
        assert_eq!(back, OwnerRef::Organization(2));
    }
}
