//! Petition content and presentation settings.
//!
//! Petitions and templates carry the same body of text, styling, newsletter
//! and confirmation-email settings. [`PetitionContent`] holds that shared
//! body so a template can be copied onto a new petition field for field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{check_len, ValidationError, DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT};

/// Direction of the background gradient on the petition page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub enum LinearGradientDirection {
    #[default]
    #[serde(rename = "no gradient")]
    NoGradient,
    #[serde(rename = "to right")]
    ToRight,
    #[serde(rename = "to bottom")]
    ToBottom,
    #[serde(rename = "to bottom right")]
    ToBottomRight,
    #[serde(rename = "to bottom left")]
    ToBottomLeft,
}

impl LinearGradientDirection {
    /// All directions, in display order.
    pub const ALL: [Self; 5] = [
        Self::NoGradient,
        Self::ToRight,
        Self::ToBottom,
        Self::ToBottomRight,
        Self::ToBottomLeft,
    ];

    /// Stored / CSS form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoGradient => "no gradient",
            Self::ToRight => "to right",
            Self::ToBottom => "to bottom",
            Self::ToBottomRight => "to bottom right",
            Self::ToBottomLeft => "to bottom left",
        }
    }
}

impl fmt::Display for LinearGradientDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinearGradientDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A blank value is accepted and means no gradient.
        if s.is_empty() {
            return Ok(Self::NoGradient);
        }
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownChoice {
                field: "linear_gradient_direction",
                value: s.to_string(),
            })
    }
}

/// How a signer who ticked the newsletter box is subscribed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum NewsletterSubscribeMethod {
    /// Send an email to the list manager.
    #[default]
    Mail,
    /// HTTP POST to the subscription URL.
    Post,
    /// HTTP GET to the subscription URL.
    Get,
}

impl NewsletterSubscribeMethod {
    /// Stored form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mail => "MAIL",
            Self::Post => "POST",
            Self::Get => "GET",
        }
    }
}

impl fmt::Display for NewsletterSubscribeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsletterSubscribeMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MAIL" => Ok(Self::Mail),
            "POST" => Ok(Self::Post),
            "GET" => Ok(Self::Get),
            other => Err(ValidationError::UnknownChoice {
                field: "newsletter_subscribe_method",
                value: other.to_string(),
            }),
        }
    }
}

/// Outgoing mail server settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct SmtpSettings {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub starttls: bool,
}

fn default_smtp_host() -> String {
    DEFAULT_SMTP_HOST.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            user: String::new(),
            password: String::new(),
            tls: false,
            starttls: false,
        }
    }
}

impl SmtpSettings {
    fn validate(&self, prefix: &'static [&'static str; 3]) -> Result<(), ValidationError> {
        check_len(prefix[0], &self.host, 100)?;
        check_len(prefix[1], &self.user, 200)?;
        check_len(prefix[2], &self.password, 200)
    }
}

/// Page colours and gradient.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PetitionStyle {
    #[serde(default)]
    pub linear_gradient_direction: LinearGradientDirection,
    /// Blank or `#RRGGBB`.
    #[serde(default)]
    pub gradient_from: String,
    #[serde(default)]
    pub gradient_to: String,
    #[serde(default)]
    pub bgcolor: String,
}

/// Validate a colour picker value: blank, or `#` followed by six hex digits.
fn check_color(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ValidationError::InvalidColor {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Newsletter subscription settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct NewsletterConfig {
    #[serde(default)]
    pub has_newsletter: bool,
    /// Label shown next to the subscription checkbox.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub subscribe_method: NewsletterSubscribeMethod,
    /// Extra form data sent with HTTP subscriptions.
    #[serde(default)]
    pub http_data: String,
    /// Name of the form field carrying the signer's email.
    #[serde(default)]
    pub http_mailfield: String,
    #[serde(default)]
    pub http_url: String,
    #[serde(default)]
    pub mail_subject: String,
    #[serde(default)]
    pub mail_from: String,
    #[serde(default)]
    pub mail_to: String,
    #[serde(default)]
    pub smtp: SmtpSettings,
}

impl NewsletterConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        check_len("newsletter_text", &self.text, 1000)?;
        check_len("newsletter_subscribe_http_mailfield", &self.http_mailfield, 100)?;
        check_len("newsletter_subscribe_http_url", &self.http_url, 1000)?;
        check_len("newsletter_subscribe_mail_subject", &self.mail_subject, 1000)?;
        check_len("newsletter_subscribe_mail_from", &self.mail_from, 500)?;
        check_len("newsletter_subscribe_mail_to", &self.mail_to, 500)?;
        self.smtp.validate(&[
            "newsletter_subscribe_mail_smtp_host",
            "newsletter_subscribe_mail_smtp_user",
            "newsletter_subscribe_mail_smtp_password",
        ])
    }
}

/// Settings for the "confirm your signature" email.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct ConfirmationEmailConfig {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub smtp: SmtpSettings,
    /// When false the site-wide mail settings are used instead of `smtp`.
    #[serde(default)]
    pub use_custom_email_settings: bool,
}

/// Everything a petition page shows besides its title, target and counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PetitionContent {
    /// Main body (rich text).
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub side_text: String,
    #[serde(default)]
    pub footer_text: String,
    #[serde(default)]
    pub footer_links: String,
    #[serde(default)]
    pub sign_form_footer: String,
    #[serde(default)]
    pub style: PetitionStyle,
    #[serde(default)]
    pub twitter_description: String,
    #[serde(default)]
    pub twitter_image: String,
    #[serde(default)]
    pub org_twitter_handle: String,
    #[serde(default)]
    pub newsletter: NewsletterConfig,
    #[serde(default)]
    pub confirmation_email: ConfirmationEmailConfig,
}

impl PetitionContent {
    /// Check field lengths and colour syntax.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_color("gradient_from", &self.style.gradient_from)?;
        check_color("gradient_to", &self.style.gradient_to)?;
        check_color("bgcolor", &self.style.bgcolor)?;
        check_len("twitter_description", &self.twitter_description, 200)?;
        check_len("twitter_image", &self.twitter_image, 500)?;
        check_len("org_twitter_handle", &self.org_twitter_handle, 20)?;
        self.newsletter.validate()?;
        check_len(
            "confirmation_email_sender",
            &self.confirmation_email.sender,
            100,
        )?;
        self.confirmation_email.smtp.validate(&[
            "confirmation_email_smtp_host",
            "confirmation_email_smtp_user",
            "confirmation_email_smtp_password",
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_parse() {
        for direction in LinearGradientDirection::ALL {
            assert_eq!(direction.as_str().parse(), Ok(direction));
        }
        assert_eq!("".parse(), Ok(LinearGradientDirection::NoGradient));
        assert!("diagonal".parse::<LinearGradientDirection>().is_err());
    }

    #[test]
    fn test_subscribe_method_parse() {
        assert_eq!("MAIL".parse(), Ok(NewsletterSubscribeMethod::Mail));
        assert_eq!("POST".parse(), Ok(NewsletterSubscribeMethod::Post));
        assert_eq!("GET".parse(), Ok(NewsletterSubscribeMethod::Get));
        assert!(matches!(
            "PUT".parse::<NewsletterSubscribeMethod>(),
            Err(ValidationError::UnknownChoice { .. })
        ));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&LinearGradientDirection::ToBottomRight).expect("ser");
        assert_eq!(json, "\"to bottom right\"");
        let json = serde_json::to_string(&NewsletterSubscribeMethod::Post).expect("ser");
        assert_eq!(json, "\"POST\"");
    }

    #[test]
    fn test_defaults() {
        let content = PetitionContent::default();
        assert_eq!(content.newsletter.smtp.host, "localhost");
        assert_eq!(content.newsletter.smtp.port, 25);
        assert_eq!(content.confirmation_email.smtp.port, 25);
        assert_eq!(
            content.newsletter.subscribe_method,
            NewsletterSubscribeMethod::Mail
        );
        assert!(content.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let content: PetitionContent =
            serde_json::from_str(r#"{"text": "<p>Hi</p>"}"#).expect("parse");
        assert_eq!(content.text, "<p>Hi</p>");
        assert_eq!(content.confirmation_email.smtp.host, "localhost");
    }

    #[test]
    fn test_color_validation() {
        let mut content = PetitionContent::default();
        content.style.bgcolor = "#a0B1c2".into();
        assert!(content.validate().is_ok());

        content.style.bgcolor = "red".into();
        assert!(matches!(
            content.validate(),
            Err(ValidationError::InvalidColor { field: "bgcolor", .. })
        ));
    }

    #[test]
    fn test_length_validation() {
        let mut content = PetitionContent::default();
        content.org_twitter_handle = "x".repeat(21);
        assert_eq!(
            content.validate(),
            Err(ValidationError::TooLong {
                field: "org_twitter_handle",
                max: 20
            })
        );

        let mut content = PetitionContent::default();
        content.confirmation_email.smtp.password = "p".repeat(201);
        assert!(matches!(
            content.validate(),
            Err(ValidationError::TooLong {
                field: "confirmation_email_smtp_password",
                ..
            })
        ));
    }
}
