//! Petitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::PetitionContent;
use crate::markup;
use crate::template::PetitionTemplate;
use crate::{PetitionId, ValidationError, DEFAULT_TARGET};

/// A stored petition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Petition {
    pub id: PetitionId,
    /// Title (rich text).
    pub title: String,
    /// Number of confirmed signatures aimed for.
    pub target: i64,
    pub published: bool,
    pub content: PetitionContent,
}

impl Petition {
    /// Title without markup, trimmed.
    pub fn raw_title(&self) -> String {
        markup::to_plain_line(&self.title)
    }

    /// Body without markup.
    pub fn raw_text(&self) -> String {
        markup::to_plain_text(&self.content.text)
    }

    /// Twitter card description without markup.
    pub fn raw_twitter_description(&self) -> String {
        markup::to_plain_text(&self.content.twitter_description)
    }
}

impl fmt::Display for Petition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_title())
    }
}

/// A petition that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct NewPetition {
    pub title: String,
    #[serde(default = "default_target")]
    pub target: i64,
    #[serde(default)]
    pub content: PetitionContent,
}

fn default_target() -> i64 {
    DEFAULT_TARGET
}

impl NewPetition {
    /// Petition with the given title and default settings.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            target: DEFAULT_TARGET,
            content: PetitionContent::default(),
        }
    }

    /// Seed a petition from a template preset.
    ///
    /// Falls back to the default target when the template leaves it unset.
    pub fn from_template(template: &PetitionTemplate, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            target: template.target.unwrap_or(DEFAULT_TARGET),
            content: template.content.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, self.target, &self.content)
    }
}

impl Petition {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, self.target, &self.content)
    }
}

fn validate_fields(
    title: &str,
    target: i64,
    content: &PetitionContent,
) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::Required("title"));
    }
    if target < 0 {
        return Err(ValidationError::NegativeTarget(target));
    }
    content.validate()
}
