//! Signature ledger.
//!
//! Each signature row carries a confirmation token that is unique within its
//! petition. Rows start unconfirmed; at most one confirmed row may exist per
//! (petition, email). Confirming a row removes every other row for the same
//! (petition, email), and the partial unique index
//! `idx_signatures_one_confirmed` backs the rule at the storage level.

use rand::RngCore;
use rusqlite::{Connection, Row};

use pytition_types::{
    unix_now, NewSignature, PetitionId, Signature, SignatureId, ValidationError,
    CONFIRMATION_MESSAGE, CONFIRMATION_TOKEN_BYTES,
};

use crate::{atomic, optional, DbError, Result};

const SELECT: &str = "SELECT id, petition_id, first_name, last_name, phone, email,
        confirmation_hash, confirmed, subscribed_to_mailinglist, date
     FROM signatures";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Signature> {
    Ok(Signature {
        id: row.get(0)?,
        petition_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        confirmation_hash: row.get(6)?,
        confirmed: row.get(7)?,
        subscribed_to_mailinglist: row.get(8)?,
        date: row.get::<_, i64>(9)? as u64,
    })
}

/// Generate a fresh hex-encoded confirmation token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; CONFIRMATION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Count signatures of a petition, optionally filtered by confirmation state.
pub fn count(conn: &Connection, petition_id: PetitionId, confirmed: Option<bool>) -> Result<u64> {
    let count: i64 = match confirmed {
        Some(confirmed) => conn.query_row(
            "SELECT COUNT(*) FROM signatures WHERE petition_id = ?1 AND confirmed = ?2",
            rusqlite::params![petition_id, confirmed],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM signatures WHERE petition_id = ?1",
            [petition_id],
            |row| row.get(0),
        )?,
    };
    Ok(count as u64)
}

/// Whether a confirmed signature exists for (petition, email).
pub fn has_confirmed(conn: &Connection, petition_id: PetitionId, email: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM signatures
                       WHERE petition_id = ?1 AND email = ?2 AND confirmed = 1)",
        rusqlite::params![petition_id, email],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn get(conn: &Connection, id: SignatureId) -> Result<Option<Signature>> {
    optional(conn.query_row(&format!("{SELECT} WHERE id = ?1"), [id], from_row))
}

/// Look up the signature of `petition_id` carrying `token`.
pub fn find_by_token(
    conn: &Connection,
    petition_id: PetitionId,
    token: &str,
) -> Result<Option<Signature>> {
    optional(conn.query_row(
        &format!("{SELECT} WHERE petition_id = ?1 AND confirmation_hash = ?2"),
        rusqlite::params![petition_id, token],
        from_row,
    ))
}

/// List signatures of a petition, newest first.
pub fn list(
    conn: &Connection,
    petition_id: PetitionId,
    confirmed: Option<bool>,
) -> Result<Vec<Signature>> {
    let rows = match confirmed {
        Some(confirmed) => {
            let mut stmt = conn.prepare(&format!(
                "{SELECT} WHERE petition_id = ?1 AND confirmed = ?2 ORDER BY date DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![petition_id, confirmed], from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "{SELECT} WHERE petition_id = ?1 ORDER BY date DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([petition_id], from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}

/// Reject a write for `email` unless the row being written is the one
/// confirmed signature for that (petition, email), or none exists yet.
fn check_duplicate(
    conn: &Connection,
    petition_id: PetitionId,
    email: &str,
    writing: Option<SignatureId>,
) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id FROM signatures WHERE petition_id = ?1 AND email = ?2 AND confirmed = 1",
    )?;
    let confirmed: Vec<SignatureId> = stmt
        .query_map(rusqlite::params![petition_id, email], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    match confirmed.as_slice() {
        [] => Ok(()),
        [id] if Some(*id) == writing => Ok(()),
        [_] => {
            tracing::warn!(petition_id, "duplicate signature rejected");
            Err(ValidationError::AlreadySigned.into())
        }
        many => Err(DbError::Integrity(format!(
            "{} confirmed signatures for one email on petition {petition_id}",
            many.len()
        ))),
    }
}

/// Record a new, unconfirmed signature with a fresh confirmation token.
pub fn record(
    conn: &Connection,
    petition_id: PetitionId,
    fields: &NewSignature,
) -> Result<Signature> {
    fields.validate()?;

    atomic(conn, |conn| {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM petitions WHERE id = ?1)",
            [petition_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DbError::NotFound(format!("petition {petition_id}")));
        }
        check_duplicate(conn, petition_id, &fields.email, None)?;

        let token = generate_token();
        let date = unix_now();
        conn.execute(
            "INSERT INTO signatures (petition_id, first_name, last_name, phone, email,
                                     confirmation_hash, confirmed, subscribed_to_mailinglist, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
            rusqlite::params![
                petition_id,
                fields.first_name,
                fields.last_name,
                fields.phone,
                fields.email,
                token,
                fields.subscribed_to_mailinglist,
                date as i64,
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(petition_id, signature_id = id, "signature recorded");

        Ok(Signature {
            id,
            petition_id,
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            phone: fields.phone.clone(),
            email: fields.email.clone(),
            confirmation_hash: token,
            confirmed: false,
            subscribed_to_mailinglist: fields.subscribed_to_mailinglist,
            date,
        })
    })
}

/// Persist an existing signature.
///
/// Runs the duplicate rule first. A confirmed row invalidates every other
/// row for the same (petition, email).
pub fn save(conn: &Connection, signature: &Signature) -> Result<()> {
    signature.validate()?;

    atomic(conn, |conn| {
        check_duplicate(
            conn,
            signature.petition_id,
            &signature.email,
            Some(signature.id),
        )?;

        if signature.confirmed {
            let removed = conn.execute(
                "DELETE FROM signatures WHERE petition_id = ?1 AND email = ?2 AND id != ?3",
                rusqlite::params![signature.petition_id, signature.email, signature.id],
            )?;
            if removed > 0 {
                tracing::debug!(
                    petition_id = signature.petition_id,
                    removed,
                    "invalidated pending signatures"
                );
            }
        }

        let updated = conn.execute(
            "UPDATE signatures SET first_name = ?1, last_name = ?2, phone = ?3, email = ?4,
                    confirmed = ?5, subscribed_to_mailinglist = ?6
             WHERE id = ?7 AND petition_id = ?8",
            rusqlite::params![
                signature.first_name,
                signature.last_name,
                signature.phone,
                signature.email,
                signature.confirmed,
                signature.subscribed_to_mailinglist,
                signature.id,
                signature.petition_id,
            ],
        )?;
        if updated == 0 {
            return Err(DbError::NotFound(format!("signature {}", signature.id)));
        }
        Ok(())
    })
}

/// Confirm the signature of `petition_id` carrying `token`.
///
/// Returns `Ok(None)` without touching any row when the token is unknown.
pub fn confirm(
    conn: &Connection,
    petition_id: PetitionId,
    token: &str,
) -> Result<Option<&'static str>> {
    atomic(conn, |conn| {
        let Some(mut signature) = find_by_token(conn, petition_id, token)? else {
            tracing::debug!(petition_id, "confirmation token not found");
            return Ok(None);
        };
        signature.confirm();
        save(conn, &signature)?;
        tracing::info!(
            petition_id,
            signature_id = signature.id,
            "signature confirmed"
        );
        Ok(Some(CONFIRMATION_MESSAGE))
    })
}

pub fn delete(conn: &Connection, id: SignatureId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM signatures WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}
