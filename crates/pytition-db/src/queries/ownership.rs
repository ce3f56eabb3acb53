//! Template ownership query functions.
//!
//! Every ownership row points at exactly one owner: a user or an
//! organization. The rule is checked before the write and again by the
//! table's CHECK constraint.

use rusqlite::{Connection, Row};

use pytition_types::{
    NewTemplate, OrganizationId, OwnerRef, OwnershipId, PetitionTemplate, TemplateId,
    TemplateOwnership, UserId,
};

use super::templates;
use crate::{atomic, optional, Result};

const SELECT: &str = "SELECT id, user_id, organization_id, template_id FROM template_ownerships";

fn from_row(row: &Row<'_>) -> rusqlite::Result<TemplateOwnership> {
    Ok(TemplateOwnership {
        id: row.get(0)?,
        user_id: row.get(1)?,
        organization_id: row.get(2)?,
        template_id: row.get(3)?,
    })
}

/// Record that `template_id` is owned by the given user or organization.
pub fn insert(
    conn: &Connection,
    user_id: Option<UserId>,
    organization_id: Option<OrganizationId>,
    template_id: TemplateId,
) -> Result<TemplateOwnership> {
    if let Err(e) = TemplateOwnership::check_owner(user_id, organization_id) {
        tracing::warn!(template_id, "ownership rejected: {e}");
        return Err(e.into());
    }
    conn.execute(
        "INSERT INTO template_ownerships (user_id, organization_id, template_id)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![user_id, organization_id, template_id],
    )?;
    Ok(TemplateOwnership {
        id: conn.last_insert_rowid(),
        user_id,
        organization_id,
        template_id,
    })
}

/// [`insert`] for an owner known to be well-formed.
pub fn assign(conn: &Connection, owner: OwnerRef, template_id: TemplateId) -> Result<TemplateOwnership> {
    let (user_id, organization_id) = owner.columns();
    insert(conn, user_id, organization_id, template_id)
}

pub fn get(conn: &Connection, id: OwnershipId) -> Result<Option<TemplateOwnership>> {
    optional(conn.query_row(&format!("{SELECT} WHERE id = ?1"), [id], from_row))
}

pub fn for_template(conn: &Connection, template_id: TemplateId) -> Result<Vec<TemplateOwnership>> {
    let mut stmt = conn.prepare(&format!("{SELECT} WHERE template_id = ?1 ORDER BY id"))?;
    let rows = stmt
        .query_map([template_id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Templates owned by `owner`.
pub fn templates_of(conn: &Connection, owner: OwnerRef) -> Result<Vec<PetitionTemplate>> {
    let (filter, id) = match owner {
        OwnerRef::User(id) => (
            "WHERE id IN (SELECT template_id FROM template_ownerships WHERE user_id = ?1)",
            id,
        ),
        OwnerRef::Organization(id) => (
            "WHERE id IN (SELECT template_id FROM template_ownerships WHERE organization_id = ?1)",
            id,
        ),
    };
    let mut stmt = conn.prepare(&templates::select_sql(&format!("{filter} ORDER BY name, id")))?;
    let rows = stmt
        .query_map([id], templates::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Create a template already owned by `owner`.
pub fn create_template_for(
    conn: &Connection,
    owner: OwnerRef,
    template: &NewTemplate,
) -> Result<PetitionTemplate> {
    atomic(conn, |conn| {
        let created = templates::insert(conn, template)?;
        assign(conn, owner, created.id)?;
        tracing::debug!(template_id = created.id, owner = %owner.kind(), "template created for owner");
        Ok(created)
    })
}

pub fn delete(conn: &Connection, id: OwnershipId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM template_ownerships WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}
