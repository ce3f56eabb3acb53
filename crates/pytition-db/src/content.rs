//! Row mapping for the content columns shared by petitions and templates.

use rusqlite::types::{Type, Value};
use rusqlite::Row;

use pytition_types::{
    ConfirmationEmailConfig, NewsletterConfig, PetitionContent, PetitionStyle, SmtpSettings,
};

/// Column list, in the order of [`values`] and [`read`].
pub(crate) const COLUMNS: [&str; 35] = [
    "text",
    "side_text",
    "footer_text",
    "footer_links",
    "sign_form_footer",
    "linear_gradient_direction",
    "gradient_from",
    "gradient_to",
    "bgcolor",
    "twitter_description",
    "twitter_image",
    "org_twitter_handle",
    "has_newsletter",
    "newsletter_text",
    "newsletter_subscribe_method",
    "newsletter_subscribe_http_data",
    "newsletter_subscribe_http_mailfield",
    "newsletter_subscribe_http_url",
    "newsletter_subscribe_mail_subject",
    "newsletter_subscribe_mail_from",
    "newsletter_subscribe_mail_to",
    "newsletter_subscribe_mail_smtp_host",
    "newsletter_subscribe_mail_smtp_port",
    "newsletter_subscribe_mail_smtp_user",
    "newsletter_subscribe_mail_smtp_password",
    "newsletter_subscribe_mail_smtp_tls",
    "newsletter_subscribe_mail_smtp_starttls",
    "confirmation_email_sender",
    "confirmation_email_smtp_host",
    "confirmation_email_smtp_port",
    "confirmation_email_smtp_user",
    "confirmation_email_smtp_password",
    "confirmation_email_smtp_tls",
    "confirmation_email_smtp_starttls",
    "use_custom_email_settings",
];

/// `col1, col2, ...` for SELECT and INSERT lists.
pub(crate) fn column_list() -> String {
    COLUMNS.join(", ")
}

/// `?start, ?start+1, ...` for `count` parameters.
pub(crate) fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `col1 = ?start, col2 = ?start+1, ...` for UPDATE statements.
pub(crate) fn assignments(start: usize) -> String {
    COLUMNS
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{col} = ?{}", start + i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parameter values for [`COLUMNS`].
pub(crate) fn values(content: &PetitionContent) -> Vec<Value> {
    let text = |s: &str| Value::Text(s.to_string());
    let flag = |b: bool| Value::Integer(i64::from(b));
    let newsletter = &content.newsletter;
    let confirmation = &content.confirmation_email;
    vec![
        text(&content.text),
        text(&content.side_text),
        text(&content.footer_text),
        text(&content.footer_links),
        text(&content.sign_form_footer),
        text(content.style.linear_gradient_direction.as_str()),
        text(&content.style.gradient_from),
        text(&content.style.gradient_to),
        text(&content.style.bgcolor),
        text(&content.twitter_description),
        text(&content.twitter_image),
        text(&content.org_twitter_handle),
        flag(newsletter.has_newsletter),
        text(&newsletter.text),
        text(newsletter.subscribe_method.as_str()),
        text(&newsletter.http_data),
        text(&newsletter.http_mailfield),
        text(&newsletter.http_url),
        text(&newsletter.mail_subject),
        text(&newsletter.mail_from),
        text(&newsletter.mail_to),
        text(&newsletter.smtp.host),
        Value::Integer(i64::from(newsletter.smtp.port)),
        text(&newsletter.smtp.user),
        text(&newsletter.smtp.password),
        flag(newsletter.smtp.tls),
        flag(newsletter.smtp.starttls),
        text(&confirmation.sender),
        text(&confirmation.smtp.host),
        Value::Integer(i64::from(confirmation.smtp.port)),
        text(&confirmation.smtp.user),
        text(&confirmation.smtp.password),
        flag(confirmation.smtp.tls),
        flag(confirmation.smtp.starttls),
        flag(confirmation.use_custom_email_settings),
    ]
}

/// Parse an enumerated TEXT column.
fn parse<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn smtp(row: &Row<'_>, at: usize) -> rusqlite::Result<SmtpSettings> {
    Ok(SmtpSettings {
        host: row.get(at)?,
        port: row.get(at + 1)?,
        user: row.get(at + 2)?,
        password: row.get(at + 3)?,
        tls: row.get(at + 4)?,
        starttls: row.get(at + 5)?,
    })
}

/// Read [`COLUMNS`] starting at column index `at`.
pub(crate) fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<PetitionContent> {
    Ok(PetitionContent {
        text: row.get(at)?,
        side_text: row.get(at + 1)?,
        footer_text: row.get(at + 2)?,
        footer_links: row.get(at + 3)?,
        sign_form_footer: row.get(at + 4)?,
        style: PetitionStyle {
            linear_gradient_direction: parse(row, at + 5)?,
            gradient_from: row.get(at + 6)?,
            gradient_to: row.get(at + 7)?,
            bgcolor: row.get(at + 8)?,
        },
        twitter_description: row.get(at + 9)?,
        twitter_image: row.get(at + 10)?,
        org_twitter_handle: row.get(at + 11)?,
        newsletter: NewsletterConfig {
            has_newsletter: row.get(at + 12)?,
            text: row.get(at + 13)?,
            subscribe_method: parse(row, at + 14)?,
            http_data: row.get(at + 15)?,
            http_mailfield: row.get(at + 16)?,
            http_url: row.get(at + 17)?,
            mail_subject: row.get(at + 18)?,
            mail_from: row.get(at + 19)?,
            mail_to: row.get(at + 20)?,
            smtp: smtp(row, at + 21)?,
        },
        confirmation_email: ConfirmationEmailConfig {
            sender: row.get(at + 27)?,
            smtp: smtp(row, at + 28)?,
            use_custom_email_settings: row.get(at + 34)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_match_columns() {
        assert_eq!(values(&PetitionContent::default()).len(), COLUMNS.len());
    }

    #[test]
    fn test_sql_fragments() {
        assert_eq!(placeholders(3, 3), "?3, ?4, ?5");
        let set = assignments(2);
        assert!(set.starts_with("text = ?2, side_text = ?3"));
        assert!(set.ends_with("use_custom_email_settings = ?36"));
    }
}
