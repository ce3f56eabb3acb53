//! Schema migrations.
//!
//! The schema version lives in `PRAGMA user_version`. Each step in
//! [`MIGRATIONS`] brings the database to the version it is tagged with and
//! runs in its own transaction together with the version bump, so an
//! interrupted upgrade resumes from the last completed step.

use rusqlite::Connection;

use crate::{atomic, schema, DbError, Result, SCHEMA_VERSION};

/// Forward-only steps, ordered by the version they produce. The last entry
/// must match [`SCHEMA_VERSION`].
const MIGRATIONS: &[(u32, &str)] = &[(1, schema::SCHEMA_V1)];

/// Bring the database up to [`SCHEMA_VERSION`].
pub fn run(conn: &Connection) -> Result<()> {
    let stored: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if stored > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "database is at schema v{stored}, this build only knows v{SCHEMA_VERSION}"
        )));
    }

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > stored) {
        tracing::info!(version, "applying schema migration");
        atomic(conn, |conn| {
            conn.execute_batch(sql)
                .map_err(|e| DbError::Migration(format!("v{version}: {e}")))?;
            conn.pragma_update(None, "user_version", version)?;
            Ok(())
        })?;
    }
    Ok(())
}
