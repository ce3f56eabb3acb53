//! Petition template query functions.

use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use pytition_types::{NewTemplate, PetitionTemplate, TemplateId};

use crate::{content, optional, DbError, Result};

pub(crate) fn select_sql(filter: &str) -> String {
    format!(
        "SELECT id, name, target, {} FROM petition_templates {filter}",
        content::column_list()
    )
}

pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<PetitionTemplate> {
    Ok(PetitionTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        target: row.get(2)?,
        content: content::read(row, 3)?,
    })
}

/// Insert a new template.
pub fn insert(conn: &Connection, template: &NewTemplate) -> Result<PetitionTemplate> {
    template.validate()?;

    let sql = format!(
        "INSERT INTO petition_templates (name, target, {}) VALUES ({})",
        content::column_list(),
        content::placeholders(1, 2 + content::COLUMNS.len()),
    );
    let mut values = vec![
        Value::Text(template.name.clone()),
        template.target.map_or(Value::Null, Value::Integer),
    ];
    values.extend(content::values(&template.content));
    conn.execute(&sql, rusqlite::params_from_iter(values))?;

    let id = conn.last_insert_rowid();
    tracing::debug!(template_id = id, "template created");
    Ok(PetitionTemplate {
        id,
        name: template.name.clone(),
        target: template.target,
        content: template.content.clone(),
    })
}

pub fn get(conn: &Connection, id: TemplateId) -> Result<Option<PetitionTemplate>> {
    optional(conn.query_row(&select_sql("WHERE id = ?1"), [id], from_row))
}

pub fn require(conn: &Connection, id: TemplateId) -> Result<PetitionTemplate> {
    get(conn, id)?.ok_or_else(|| DbError::NotFound(format!("template {id}")))
}

/// Templates named exactly `name`.
pub fn find_by_name(conn: &Connection, name: &str) -> Result<Vec<PetitionTemplate>> {
    let mut stmt = conn.prepare(&select_sql("WHERE name = ?1 ORDER BY id"))?;
    let rows = stmt
        .query_map([name], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list(conn: &Connection) -> Result<Vec<PetitionTemplate>> {
    let mut stmt = conn.prepare(&select_sql("ORDER BY name, id"))?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Persist every field of `template`.
pub fn update(conn: &Connection, template: &PetitionTemplate) -> Result<()> {
    template.validate()?;

    let sql = format!(
        "UPDATE petition_templates SET name = ?1, target = ?2, {} WHERE id = ?{}",
        content::assignments(3),
        3 + content::COLUMNS.len(),
    );
    let mut values = vec![
        Value::Text(template.name.clone()),
        template.target.map_or(Value::Null, Value::Integer),
    ];
    values.extend(content::values(&template.content));
    values.push(Value::Integer(template.id));

    let updated = conn.execute(&sql, rusqlite::params_from_iter(values))?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("template {}", template.id)));
    }
    Ok(())
}

/// Delete a template. Ownership rows go with it and default-template
/// references are cleared.
pub fn delete(conn: &Connection, id: TemplateId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM petition_templates WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pytition_types::{NewPetition, NewsletterSubscribeMethod};

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        let mut new = NewTemplate::named("Default");
        new.content.newsletter.has_newsletter = true;
        new.content.newsletter.subscribe_method = NewsletterSubscribeMethod::Get;
        new.content.footer_text = "footer".into();

        let created = insert(&conn, &new).expect("insert");
        let fetched = require(&conn, created.id).expect("get");
        assert_eq!(fetched, created);
        assert_eq!(fetched.target, None);
        assert_eq!(fetched.to_string(), "Default");
    }

    #[test]
    fn test_missing() {
        let conn = test_db();
        assert!(get(&conn, 7).expect("get").is_none());
        assert!(matches!(require(&conn, 7), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_find_by_name_and_list() {
        let conn = test_db();
        insert(&conn, &NewTemplate::named("b")).expect("b");
        insert(&conn, &NewTemplate::named("a")).expect("a");
        insert(&conn, &NewTemplate::named("a")).expect("a again");

        assert_eq!(find_by_name(&conn, "a").expect("find").len(), 2);
        assert!(find_by_name(&conn, "zzz").expect("find").is_empty());
        let names: Vec<_> = list(&conn)
            .expect("list")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["a", "a", "b"]);
    }

    #[test]
    fn test_update_target() {
        let conn = test_db();
        let mut t = insert(&conn, &NewTemplate::named("t")).expect("insert");
        t.target = Some(42);
        update(&conn, &t).expect("update");
        assert_eq!(require(&conn, t.id).expect("get").target, Some(42));

        t.target = Some(-3);
        assert!(matches!(update(&conn, &t), Err(DbError::Validation(_))));
    }

    #[test]
    fn test_seed_petition_from_template() {
        let conn = test_db();
        let mut new = NewTemplate::named("preset");
        new.target = Some(80);
        new.content.side_text = "side".into();
        let template = insert(&conn, &new).expect("insert");

        let seeded = NewPetition::from_template(&template, "From preset");
        let petition = crate::queries::petitions::insert(&conn, &seeded).expect("petition");
        assert_eq!(petition.target, 80);
        assert_eq!(petition.content, template.content);
    }

    #[test]
    fn test_delete() {
        let conn = test_db();
        let t = insert(&conn, &NewTemplate::named("t")).expect("insert");
        assert!(delete(&conn, t.id).expect("delete"));
        assert!(!delete(&conn, t.id).expect("delete again"));
    }
}
