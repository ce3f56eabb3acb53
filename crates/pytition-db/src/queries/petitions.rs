//! Petition query functions.

use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use pytition_types::{NewPetition, Petition, PetitionId};

use super::signatures;
use crate::{content, optional, DbError, Result};

fn select_sql(filter: &str) -> String {
    format!(
        "SELECT id, title, target, published, {} FROM petitions {filter}",
        content::column_list()
    )
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Petition> {
    Ok(Petition {
        id: row.get(0)?,
        title: row.get(1)?,
        target: row.get(2)?,
        published: row.get(3)?,
        content: content::read(row, 4)?,
    })
}

/// Insert a new petition.
pub fn insert(conn: &Connection, petition: &NewPetition) -> Result<Petition> {
    petition.validate()?;

    let sql = format!(
        "INSERT INTO petitions (title, target, published, {}) VALUES ({})",
        content::column_list(),
        content::placeholders(1, 3 + content::COLUMNS.len()),
    );
    let mut values = vec![
        Value::Text(petition.title.clone()),
        Value::Integer(petition.target),
        Value::Integer(0),
    ];
    values.extend(content::values(&petition.content));
    conn.execute(&sql, rusqlite::params_from_iter(values))?;

    let id = conn.last_insert_rowid();
    tracing::debug!(petition_id = id, "petition created");
    Ok(Petition {
        id,
        title: petition.title.clone(),
        target: petition.target,
        published: false,
        content: petition.content.clone(),
    })
}

/// Look up a petition by id. A missing petition is `Ok(None)`.
pub fn get(conn: &Connection, id: PetitionId) -> Result<Option<Petition>> {
    optional(conn.query_row(&select_sql("WHERE id = ?1"), [id], from_row))
}

/// Look up a petition that must exist.
pub fn require(conn: &Connection, id: PetitionId) -> Result<Petition> {
    get(conn, id)?.ok_or_else(|| DbError::NotFound(format!("petition {id}")))
}

/// List petitions, optionally restricted to published / unpublished ones.
pub fn list(conn: &Connection, published: Option<bool>) -> Result<Vec<Petition>> {
    let rows = match published {
        Some(published) => {
            let mut stmt = conn.prepare(&select_sql("WHERE published = ?1 ORDER BY id"))?;
            let rows = stmt
                .query_map([published], from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(&select_sql("ORDER BY id"))?;
            let rows = stmt
                .query_map([], from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}

/// Petitions matching a `WHERE` clause with one id parameter.
pub(crate) fn query(conn: &Connection, filter: &str, id: i64) -> Result<Vec<Petition>> {
    let mut stmt = conn.prepare(&select_sql(&format!("{filter} ORDER BY id")))?;
    let rows = stmt
        .query_map([id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Persist every field of `petition`.
pub fn update(conn: &Connection, petition: &Petition) -> Result<()> {
    petition.validate()?;

    let sql = format!(
        "UPDATE petitions SET title = ?1, target = ?2, published = ?3, {} WHERE id = ?{}",
        content::assignments(4),
        4 + content::COLUMNS.len(),
    );
    let mut values = vec![
        Value::Text(petition.title.clone()),
        Value::Integer(petition.target),
        Value::Integer(i64::from(petition.published)),
    ];
    values.extend(content::values(&petition.content));
    values.push(Value::Integer(petition.id));

    let updated = conn.execute(&sql, rusqlite::params_from_iter(values))?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("petition {}", petition.id)));
    }
    Ok(())
}

/// Set the published flag.
pub fn set_published(conn: &Connection, id: PetitionId, published: bool) -> Result<()> {
    let updated = conn.execute(
        "UPDATE petitions SET published = ?1 WHERE id = ?2",
        rusqlite::params![published, id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("petition {id}")));
    }
    tracing::info!(petition_id = id, published, "petition visibility changed");
    Ok(())
}

pub fn publish(conn: &Connection, id: PetitionId) -> Result<()> {
    set_published(conn, id, true)
}

pub fn unpublish(conn: &Connection, id: PetitionId) -> Result<()> {
    set_published(conn, id, false)
}

/// Delete a petition and, by cascade, its signatures.
pub fn delete(conn: &Connection, id: PetitionId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM petitions WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

/// Number of confirmed signatures.
pub fn signature_number(conn: &Connection, id: PetitionId) -> Result<u64> {
    signatures::count(conn, id, Some(true))
}

/// Number of signatures, optionally filtered by confirmation state.
pub fn signature_count(conn: &Connection, id: PetitionId, confirmed: Option<bool>) -> Result<u64> {
    signatures::count(conn, id, confirmed)
}

/// Whether `email` already has a confirmed signature on this petition.
pub fn already_signed(conn: &Connection, id: PetitionId, email: &str) -> Result<bool> {
    signatures::has_confirmed(conn, id, email)
}

/// Confirm the signature carrying `token`.
///
/// Returns the thank-you message, or `None` when no signature of this
/// petition carries the token.
pub fn confirm_signature(
    conn: &Connection,
    id: PetitionId,
    token: &str,
) -> Result<Option<&'static str>> {
    signatures::confirm(conn, id, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pytition_types::{LinearGradientDirection, NewSignature, NewsletterSubscribeMethod};

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        let mut new = NewPetition::titled("<b>Save</b> the bees");
        new.target = 1200;
        new.content.text = "<p>Body</p>".into();
        new.content.style.linear_gradient_direction = LinearGradientDirection::ToBottomLeft;
        new.content.style.bgcolor = "#ffcc00".into();
        new.content.newsletter.subscribe_method = NewsletterSubscribeMethod::Post;
        new.content.newsletter.smtp.port = 587;
        new.content.confirmation_email.use_custom_email_settings = true;

        let created = insert(&conn, &new).expect("insert");
        let fetched = get(&conn, created.id).expect("get").expect("exists");

        assert_eq!(fetched, created);
        assert_eq!(fetched.raw_title(), "Save the bees");
        assert_eq!(fetched.target, 1200);
        assert!(!fetched.published);
        assert_eq!(fetched.content, new.content);
    }

    #[test]
    fn test_get_missing_is_none() {
        let conn = test_db();
        assert!(get(&conn, 42).expect("get").is_none());
        assert!(matches!(require(&conn, 42), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_insert_rejects_invalid() {
        let conn = test_db();
        let mut new = NewPetition::titled("x");
        new.target = -1;
        assert!(matches!(insert(&conn, &new), Err(DbError::Validation(_))));
        assert!(list(&conn, None).expect("list").is_empty());
    }

    #[test]
    fn test_publish_unpublish() {
        let conn = test_db();
        let p = insert(&conn, &NewPetition::titled("P")).expect("insert");

        publish(&conn, p.id).expect("publish");
        assert!(require(&conn, p.id).expect("get").published);
        assert_eq!(list(&conn, Some(true)).expect("list").len(), 1);

        unpublish(&conn, p.id).expect("unpublish");
        assert!(!require(&conn, p.id).expect("get").published);
        assert!(list(&conn, Some(true)).expect("list").is_empty());

        assert!(matches!(publish(&conn, 999), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_update() {
        let conn = test_db();
        let mut p = insert(&conn, &NewPetition::titled("Old")).expect("insert");
        p.title = "New".into();
        p.content.twitter_description = "tweet".into();
        update(&conn, &p).expect("update");

        let fetched = require(&conn, p.id).expect("get");
        assert_eq!(fetched.title, "New");
        assert_eq!(fetched.content.twitter_description, "tweet");

        p.id = 999;
        assert!(matches!(update(&conn, &p), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_delete_cascades_signatures() {
        let conn = test_db();
        let p = insert(&conn, &NewPetition::titled("P")).expect("insert");
        signatures::record(&conn, p.id, &NewSignature::new("A", "B", "a@x.com")).expect("sign");

        assert!(delete(&conn, p.id).expect("delete"));
        assert!(!delete(&conn, p.id).expect("second delete"));
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM signatures", [], |row| row.get(0))
            .expect("count");
        assert_eq!(left, 0);
    }

    #[test]
    fn test_signature_number_counts_confirmed_only() {
        let conn = test_db();
        let p = insert(&conn, &NewPetition::titled("P")).expect("insert");
        let s = signatures::record(&conn, p.id, &NewSignature::new("A", "B", "a@x.com"))
            .expect("sign");
        signatures::record(&conn, p.id, &NewSignature::new("C", "D", "c@x.com")).expect("sign");

        assert_eq!(signature_number(&conn, p.id).expect("count"), 0);
        assert_eq!(signature_count(&conn, p.id, None).expect("count"), 2);

        let msg = confirm_signature(&conn, p.id, &s.confirmation_hash).expect("confirm");
        assert_eq!(msg, Some(pytition_types::CONFIRMATION_MESSAGE));
        assert_eq!(signature_number(&conn, p.id).expect("count"), 1);
        assert!(already_signed(&conn, p.id, "a@x.com").expect("signed"));
        assert!(!already_signed(&conn, p.id, "c@x.com").expect("signed"));
    }
}
