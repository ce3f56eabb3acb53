//! Petition templates and their ownership.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::PetitionContent;
use crate::owner::OwnerRef;
use crate::{check_len, OrganizationId, OwnershipId, TemplateId, UserId, ValidationError};

/// A reusable petition preset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PetitionTemplate {
    pub id: TemplateId,
    pub name: String,
    pub target: Option<i64>,
    pub content: PetitionContent,
}

impl PetitionTemplate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.name, self.target, &self.content)
    }
}

impl fmt::Display for PetitionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A template that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub target: Option<i64>,
    #[serde(default)]
    pub content: PetitionContent,
}

impl NewTemplate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            content: PetitionContent::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.name, self.target, &self.content)
    }
}

fn validate_fields(
    name: &str,
    target: Option<i64>,
    content: &PetitionContent,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required("name"));
    }
    check_len("name", name, 50)?;
    if let Some(target) = target.filter(|t| *t < 0) {
        return Err(ValidationError::NegativeTarget(target));
    }
    content.validate()
}

/// Join row recording who owns a template.
///
/// Exactly one of `user_id` / `organization_id` is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct TemplateOwnership {
    pub id: OwnershipId,
    pub user_id: Option<UserId>,
    pub organization_id: Option<OrganizationId>,
    pub template_id: TemplateId,
}

impl TemplateOwnership {
    /// Check the owner columns of a prospective row.
    pub fn check_owner(
        user_id: Option<UserId>,
        organization_id: Option<OrganizationId>,
    ) -> Result<OwnerRef, ValidationError> {
        match (user_id, organization_id) {
            (Some(user), None) => Ok(OwnerRef::User(user)),
            (None, Some(org)) => Ok(OwnerRef::Organization(org)),
            (None, None) => Err(ValidationError::OwnerMissing),
            (Some(_), Some(_)) => Err(ValidationError::OwnerAmbiguous),
        }
    }

    /// The owner this row points at.
    pub fn owner(&self) -> Result<OwnerRef, ValidationError> {
        Self::check_owner(self.user_id, self.organization_id)
    }
}
