//! Pytition user profile query functions.
//!
//! Profiles are created and removed through [`crate::lifecycle`]; this module
//! only reads them and manages their relations.

use rusqlite::{Connection, Row};

use pytition_types::{
    unix_now, Account, AccountId, Organization, OwnerRef, Permission, Petition, PetitionId,
    PetitionTemplate, PytitionUser, TemplateId, UserId, UserProfile,
};

use super::{organizations, ownership, permissions, petitions};
use crate::{optional, DbError, Result};

const SELECT: &str = "SELECT id, account_id, default_template_id, updated_at FROM pytition_users";

const SELECT_PROFILE: &str =
    "SELECT u.id, u.account_id, u.default_template_id, u.updated_at,
            a.id, a.username, a.first_name, a.last_name, a.email, a.is_active
     FROM pytition_users u JOIN accounts a ON a.id = u.account_id";

fn from_row(row: &Row<'_>) -> rusqlite::Result<PytitionUser> {
    Ok(PytitionUser {
        id: row.get(0)?,
        account_id: row.get(1)?,
        default_template_id: row.get(2)?,
        updated_at: row.get::<_, i64>(3)? as u64,
    })
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        user: from_row(row)?,
        account: Account {
            id: row.get(4)?,
            username: row.get(5)?,
            first_name: row.get(6)?,
            last_name: row.get(7)?,
            email: row.get(8)?,
            is_active: row.get(9)?,
        },
    })
}

pub fn get(conn: &Connection, id: UserId) -> Result<Option<PytitionUser>> {
    optional(conn.query_row(&format!("{SELECT} WHERE id = ?1"), [id], from_row))
}

pub fn require(conn: &Connection, id: UserId) -> Result<PytitionUser> {
    get(conn, id)?.ok_or_else(|| DbError::NotFound(format!("user {id}")))
}

/// The profile shadowing `account_id`, if any.
pub fn get_by_account(conn: &Connection, account_id: AccountId) -> Result<Option<PytitionUser>> {
    optional(conn.query_row(
        &format!("{SELECT} WHERE account_id = ?1"),
        [account_id],
        from_row,
    ))
}

/// Create the profile of `account_id` unless one exists.
///
/// Returns the profile and whether it was created by this call.
pub fn ensure_for_account(
    conn: &Connection,
    account_id: AccountId,
) -> Result<(PytitionUser, bool)> {
    if let Some(existing) = get_by_account(conn, account_id)? {
        return Ok((existing, false));
    }
    let now = unix_now();
    conn.execute(
        "INSERT INTO pytition_users (account_id, updated_at) VALUES (?1, ?2)",
        rusqlite::params![account_id, now as i64],
    )?;
    let user = PytitionUser {
        id: conn.last_insert_rowid(),
        account_id,
        default_template_id: None,
        updated_at: now,
    };
    tracing::info!(user_id = user.id, account_id, "profile created");
    Ok((user, true))
}

/// Re-persist a profile after its account was saved.
pub fn touch(conn: &Connection, id: UserId) -> Result<()> {
    let updated = conn.execute(
        "UPDATE pytition_users SET updated_at = ?1 WHERE id = ?2",
        rusqlite::params![unix_now() as i64, id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("user {id}")));
    }
    Ok(())
}

pub fn profile(conn: &Connection, id: UserId) -> Result<Option<UserProfile>> {
    optional(conn.query_row(
        &format!("{SELECT_PROFILE} WHERE u.id = ?1"),
        [id],
        profile_from_row,
    ))
}

pub fn profile_by_username(conn: &Connection, username: &str) -> Result<Option<UserProfile>> {
    optional(conn.query_row(
        &format!("{SELECT_PROFILE} WHERE a.username = ?1"),
        [username],
        profile_from_row,
    ))
}

/// Profiles matching a `WHERE` clause with one id parameter.
pub(crate) fn query_profiles(
    conn: &Connection,
    filter: &str,
    id: i64,
) -> Result<Vec<UserProfile>> {
    let mut stmt = conn.prepare(&format!("{SELECT_PROFILE} {filter} ORDER BY a.username"))?;
    let rows = stmt
        .query_map([id], profile_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_profiles(conn: &Connection) -> Result<Vec<UserProfile>> {
    let mut stmt = conn.prepare(&format!("{SELECT_PROFILE} ORDER BY a.username"))?;
    let rows = stmt
        .query_map([], profile_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Organizations the user is a member of.
pub fn organizations(conn: &Connection, id: UserId) -> Result<Vec<Organization>> {
    organizations::query(
        conn,
        "WHERE id IN (SELECT organization_id FROM user_organizations WHERE user_id = ?1)",
        id,
    )
}

/// Organizations that invited the user.
pub fn invitations(conn: &Connection, id: UserId) -> Result<Vec<Organization>> {
    organizations::query(
        conn,
        "WHERE id IN (SELECT organization_id FROM user_invitations WHERE user_id = ?1)",
        id,
    )
}

/// Every permission row held by the user, one per organization joined.
pub fn permissions(conn: &Connection, id: UserId) -> Result<Vec<Permission>> {
    permissions::query(
        conn,
        "WHERE id IN (SELECT permission_id FROM user_permissions WHERE user_id = ?1)",
        id,
    )
}

/// Templates owned by the user.
pub fn templates(conn: &Connection, id: UserId) -> Result<Vec<PetitionTemplate>> {
    ownership::templates_of(conn, OwnerRef::User(id))
}

pub fn add_petition(conn: &Connection, id: UserId, petition_id: PetitionId) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO user_petitions (user_id, petition_id) VALUES (?1, ?2)",
        [id, petition_id],
    )?;
    Ok(())
}

pub fn remove_petition(conn: &Connection, id: UserId, petition_id: PetitionId) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM user_petitions WHERE user_id = ?1 AND petition_id = ?2",
        [id, petition_id],
    )?;
    Ok(removed > 0)
}

pub fn petitions(conn: &Connection, id: UserId) -> Result<Vec<Petition>> {
    petitions::query(
        conn,
        "WHERE id IN (SELECT petition_id FROM user_petitions WHERE user_id = ?1)",
        id,
    )
}

pub fn set_default_template(
    conn: &Connection,
    id: UserId,
    template_id: Option<TemplateId>,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE pytition_users SET default_template_id = ?1 WHERE id = ?2",
        rusqlite::params![template_id, id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("user {id}")));
    }
    Ok(())
}

/// Remove the profile row. Membership, permission and ownership rows go
/// with it; the account is left to the caller.
pub(crate) fn delete_row(conn: &Connection, id: UserId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM pytition_users WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}
