//! Permission query functions.
//!
//! A permission row belongs to one organization and is linked to the member
//! holding it through `user_permissions`. Flag columns are read and written
//! in [`Capability::ALL`] order.

use rusqlite::{Connection, Row};

use pytition_types::{Capability, OrganizationId, Permission, PermissionId, UserId};

use crate::{optional, DbError, Result};

fn select_sql(filter: &str) -> String {
    let flags: Vec<&str> = Capability::ALL.iter().map(|c| c.column()).collect();
    format!(
        "SELECT id, organization_id, {} FROM permissions {filter}",
        flags.join(", ")
    )
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Permission> {
    let mut permission = Permission::none(row.get(0)?, row.get(1)?);
    for (i, capability) in Capability::ALL.into_iter().enumerate() {
        if row.get::<_, bool>(2 + i)? {
            permission.grant(capability);
        }
    }
    Ok(permission)
}

pub fn get(conn: &Connection, id: PermissionId) -> Result<Option<Permission>> {
    optional(conn.query_row(&select_sql("WHERE id = ?1"), [id], from_row))
}

pub fn require(conn: &Connection, id: PermissionId) -> Result<Permission> {
    get(conn, id)?.ok_or_else(|| DbError::NotFound(format!("permission {id}")))
}

/// Permissions matching a `WHERE` clause with one id parameter.
pub(crate) fn query(conn: &Connection, filter: &str, id: i64) -> Result<Vec<Permission>> {
    let mut stmt = conn.prepare(&select_sql(&format!("{filter} ORDER BY id")))?;
    let rows = stmt
        .query_map([id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// The permission `user_id` holds inside `organization_id`.
///
/// Fails with [`DbError::Integrity`] if the member somehow holds several.
pub fn for_member(
    conn: &Connection,
    user_id: UserId,
    organization_id: OrganizationId,
) -> Result<Option<Permission>> {
    let mut stmt = conn.prepare(&select_sql(
        "WHERE organization_id = ?1
           AND id IN (SELECT permission_id FROM user_permissions WHERE user_id = ?2)",
    ))?;
    let mut rows = stmt
        .query_map([organization_id, user_id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        n => Err(DbError::Integrity(format!(
            "user {user_id} holds {n} permissions in organization {organization_id}"
        ))),
    }
}

pub fn list_for_organization(
    conn: &Connection,
    organization_id: OrganizationId,
) -> Result<Vec<Permission>> {
    query(conn, "WHERE organization_id = ?1", organization_id)
}

/// Insert an all-false permission owned by `organization_id`.
pub(crate) fn insert_blank(conn: &Connection, organization_id: OrganizationId) -> Result<Permission> {
    conn.execute(
        "INSERT INTO permissions (organization_id) VALUES (?1)",
        [organization_id],
    )?;
    Ok(Permission::none(conn.last_insert_rowid(), organization_id))
}

/// Persist the flags of `permission`. The owning organization never changes.
pub fn update(conn: &Connection, permission: &Permission) -> Result<()> {
    let assignments: Vec<String> = Capability::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", c.column(), i + 1))
        .collect();
    let sql = format!(
        "UPDATE permissions SET {} WHERE id = ?{}",
        assignments.join(", "),
        Capability::ALL.len() + 1
    );

    let mut values: Vec<i64> = Capability::ALL
        .iter()
        .map(|c| i64::from(permission.allows(*c)))
        .collect();
    values.push(permission.id);

    let updated = conn.execute(&sql, rusqlite::params_from_iter(values))?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("permission {}", permission.id)));
    }
    tracing::info!(
        permission_id = permission.id,
        organization_id = permission.organization_id,
        granted = permission.granted().len(),
        "permission updated"
    );
    Ok(())
}

/// `"<organization> : <holder username>"`, or `"<organization> : None"`
/// when nobody holds the permission.
pub fn label(conn: &Connection, id: PermissionId) -> Result<String> {
    let (org_name, holder): (String, Option<String>) = conn
        .query_row(
            "SELECT o.name,
                    (SELECT a.username FROM user_permissions up
                     JOIN pytition_users u ON u.id = up.user_id
                     JOIN accounts a ON a.id = u.account_id
                     WHERE up.permission_id = p.id
                     ORDER BY up.user_id LIMIT 1)
             FROM permissions p JOIN organizations o ON o.id = p.organization_id
             WHERE p.id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("permission {id}")),
            other => DbError::Sqlite(other),
        })?;
    Ok(format!(
        "{org_name} : {}",
        holder.as_deref().unwrap_or("None")
    ))
}

pub fn delete(conn: &Connection, id: PermissionId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM permissions WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}
