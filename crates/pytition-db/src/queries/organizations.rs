//! Organization query functions: membership, invitations and petitions.

use rusqlite::{Connection, Row};

use pytition_types::{
    Organization, OrganizationId, OwnerRef, Permission, Petition, PetitionId, PetitionTemplate,
    TemplateId, UserId, UserProfile,
};

use super::{ownership, permissions, petitions, users};
use crate::{atomic, optional, DbError, Result};

const SELECT: &str = "SELECT id, name, default_template_id FROM organizations";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: row.get(0)?,
        name: row.get(1)?,
        default_template_id: row.get(2)?,
    })
}

/// Organizations matching a `WHERE` clause with one id parameter.
pub(crate) fn query(conn: &Connection, filter: &str, id: i64) -> Result<Vec<Organization>> {
    let mut stmt = conn.prepare(&format!("{SELECT} {filter} ORDER BY name, id"))?;
    let rows = stmt
        .query_map([id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create(conn: &Connection, name: &str) -> Result<Organization> {
    Organization::validate_name(name)?;
    conn.execute("INSERT INTO organizations (name) VALUES (?1)", [name])?;
    let id = conn.last_insert_rowid();
    tracing::info!(organization_id = id, "organization created");
    Ok(Organization {
        id,
        name: name.to_string(),
        default_template_id: None,
    })
}

pub fn get(conn: &Connection, id: OrganizationId) -> Result<Option<Organization>> {
    optional(conn.query_row(&format!("{SELECT} WHERE id = ?1"), [id], from_row))
}

pub fn require(conn: &Connection, id: OrganizationId) -> Result<Organization> {
    get(conn, id)?.ok_or_else(|| DbError::NotFound(format!("organization {id}")))
}

/// Organizations named exactly `name`. Names are not unique.
pub fn find_by_name(conn: &Connection, name: &str) -> Result<Vec<Organization>> {
    let mut stmt = conn.prepare(&format!("{SELECT} WHERE name = ?1 ORDER BY id"))?;
    let rows = stmt
        .query_map([name], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list(conn: &Connection) -> Result<Vec<Organization>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY name, id"))?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn rename(conn: &Connection, id: OrganizationId, name: &str) -> Result<()> {
    Organization::validate_name(name)?;
    let updated = conn.execute(
        "UPDATE organizations SET name = ?1 WHERE id = ?2",
        rusqlite::params![name, id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("organization {id}")));
    }
    Ok(())
}

pub fn set_default_template(
    conn: &Connection,
    id: OrganizationId,
    template_id: Option<TemplateId>,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE organizations SET default_template_id = ?1 WHERE id = ?2",
        rusqlite::params![template_id, id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("organization {id}")));
    }
    Ok(())
}

/// Delete an organization with its permissions, memberships, invitations
/// and template ownership rows.
pub fn delete(conn: &Connection, id: OrganizationId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM organizations WHERE id = ?1", [id])?;
    if deleted > 0 {
        tracing::info!(organization_id = id, "organization deleted");
    }
    Ok(deleted > 0)
}

pub fn is_member(conn: &Connection, id: OrganizationId, user_id: UserId) -> Result<bool> {
    let member: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM user_organizations
                       WHERE organization_id = ?1 AND user_id = ?2)",
        [id, user_id],
        |row| row.get(0),
    )?;
    Ok(member)
}

/// Add `user_id` to the organization with a fresh all-false permission.
///
/// The membership row, the permission row and the link between the user and
/// the permission are written together or not at all.
pub fn add_member(conn: &Connection, id: OrganizationId, user_id: UserId) -> Result<Permission> {
    atomic(conn, |conn| {
        require(conn, id)?;
        users::require(conn, user_id)?;
        if is_member(conn, id, user_id)? {
            return Err(DbError::Constraint(format!(
                "user {user_id} is already a member of organization {id}"
            )));
        }
        conn.execute(
            "INSERT INTO user_organizations (user_id, organization_id) VALUES (?1, ?2)",
            [user_id, id],
        )?;
        let permission = permissions::insert_blank(conn, id)?;
        conn.execute(
            "INSERT INTO user_permissions (user_id, permission_id) VALUES (?1, ?2)",
            [user_id, permission.id],
        )?;
        tracing::info!(organization_id = id, user_id, "member added");
        Ok(permission)
    })
}

/// Drop `user_id` from the organization together with the permission it
/// held there. Returns whether the user was a member.
pub fn remove_member(conn: &Connection, id: OrganizationId, user_id: UserId) -> Result<bool> {
    atomic(conn, |conn| {
        let removed = conn.execute(
            "DELETE FROM user_organizations WHERE organization_id = ?1 AND user_id = ?2",
            [id, user_id],
        )?;
        conn.execute(
            "DELETE FROM permissions
             WHERE organization_id = ?1
               AND id IN (SELECT permission_id FROM user_permissions WHERE user_id = ?2)",
            [id, user_id],
        )?;
        if removed > 0 {
            tracing::info!(organization_id = id, user_id, "member removed");
        }
        Ok(removed > 0)
    })
}

pub fn members(conn: &Connection, id: OrganizationId) -> Result<Vec<UserProfile>> {
    users::query_profiles(
        conn,
        "WHERE u.id IN (SELECT user_id FROM user_organizations WHERE organization_id = ?1)",
        id,
    )
}

/// Invite `user_id`. Members are not invited; returns whether a new
/// invitation was recorded.
pub fn invite(conn: &Connection, id: OrganizationId, user_id: UserId) -> Result<bool> {
    atomic(conn, |conn| {
        if is_member(conn, id, user_id)? {
            return Ok(false);
        }
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO user_invitations (user_id, organization_id) VALUES (?1, ?2)",
            [user_id, id],
        )?;
        if inserted > 0 {
            tracing::info!(organization_id = id, user_id, "member invited");
        }
        Ok(inserted > 0)
    })
}

/// Users with a pending invitation.
pub fn invited(conn: &Connection, id: OrganizationId) -> Result<Vec<UserProfile>> {
    users::query_profiles(
        conn,
        "WHERE u.id IN (SELECT user_id FROM user_invitations WHERE organization_id = ?1)",
        id,
    )
}

/// Consume the invitation and add the user as a member.
pub fn accept_invitation(
    conn: &Connection,
    id: OrganizationId,
    user_id: UserId,
) -> Result<Permission> {
    atomic(conn, |conn| {
        if !decline_invitation(conn, id, user_id)? {
            return Err(DbError::NotFound(format!(
                "invitation of user {user_id} to organization {id}"
            )));
        }
        add_member(conn, id, user_id)
    })
}

/// Drop a pending invitation. Returns whether one existed.
pub fn decline_invitation(conn: &Connection, id: OrganizationId, user_id: UserId) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM user_invitations WHERE organization_id = ?1 AND user_id = ?2",
        [id, user_id],
    )?;
    Ok(removed > 0)
}

pub fn add_petition(conn: &Connection, id: OrganizationId, petition_id: PetitionId) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO organization_petitions (organization_id, petition_id)
         VALUES (?1, ?2)",
        [id, petition_id],
    )?;
    Ok(())
}

pub fn remove_petition(
    conn: &Connection,
    id: OrganizationId,
    petition_id: PetitionId,
) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM organization_petitions WHERE organization_id = ?1 AND petition_id = ?2",
        [id, petition_id],
    )?;
    Ok(removed > 0)
}

pub fn petitions(conn: &Connection, id: OrganizationId) -> Result<Vec<Petition>> {
    petitions::query(
        conn,
        "WHERE id IN (SELECT petition_id FROM organization_petitions WHERE organization_id = ?1)",
        id,
    )
}

/// Templates owned by the organization.
pub fn templates(conn: &Connection, id: OrganizationId) -> Result<Vec<PetitionTemplate>> {
    ownership::templates_of(conn, OwnerRef::Organization(id))
}
