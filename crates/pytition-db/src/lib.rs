//! # pytition-db
//!
//! Persistence layer for Pytition.
//! Everything lives in a single SQLite database (`pytition.db` in the data
//! directory).
//!
//! ## Conventions
//!
//! - WAL mode, foreign keys enforced
//! - Child rows (signatures, permissions, ownership and membership joins)
//!   are removed by `ON DELETE CASCADE`
//! - Timestamps are Unix epoch seconds
//! - Schema version stored in `PRAGMA user_version`
//! - Operations that write more than one row run through [`atomic`], so a
//!   failure at any step leaves the database untouched

pub mod accounts;
mod content;
pub mod lifecycle;
pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;

use pytition_types::ValidationError;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A lookup expected exactly one row and found zero or several.
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the Pytition database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

/// Run `f` inside a write transaction.
///
/// Opens an IMMEDIATE transaction so concurrent writers on the same file
/// are serialized before they read. When the connection is already inside
/// a transaction, `f` joins it and the outer caller decides the outcome.
pub fn atomic<T>(conn: &Connection, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    if !conn.is_autocommit() {
        return f(conn);
    }
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = f(&*tx)?;
    tx.commit()?;
    Ok(value)
}

/// Map `QueryReturnedNoRows` to `Ok(None)`.
pub(crate) fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::Sqlite(e)),
    }
}
