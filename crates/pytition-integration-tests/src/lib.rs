//! Integration test crate for Pytition.
//!
//! The library only holds fixtures shared by the flows under `tests/`,
//! which exercise the storage layer end to end on an in-memory database.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p pytition-integration-tests
//! ```

use rusqlite::Connection;

use pytition_db::accounts::SqliteAccountStore;
use pytition_db::lifecycle::ProfileLifecycle;
use pytition_db::queries::petitions;
use pytition_types::{NewAccount, NewPetition, NewSignature, PetitionId, UserId};

/// Fresh, migrated in-memory database.
pub fn fresh_db() -> Connection {
    pytition_db::open_memory().expect("in-memory database")
}

/// Store a petition with default settings.
pub fn petition(conn: &Connection, title: &str) -> PetitionId {
    petitions::insert(conn, &NewPetition::titled(title))
        .expect("insert petition")
        .id
}

/// Register an account and return the id of its profile.
pub fn user(conn: &Connection, username: &str) -> UserId {
    ProfileLifecycle::new(SqliteAccountStore)
        .register(conn, &NewAccount::new(username))
        .expect("register account")
        .id()
}

pub fn signer(email: &str) -> NewSignature {
    NewSignature::new("Ada", "Lovelace", email)
}

/// Rows for (petition, email), confirmed ones only when `confirmed` is set.
pub fn rows_for(conn: &Connection, petition_id: PetitionId, email: &str, confirmed: bool) -> i64 {
    let sql = if confirmed {
        "SELECT COUNT(*) FROM signatures WHERE petition_id = ?1 AND email = ?2 AND confirmed = 1"
    } else {
        "SELECT COUNT(*) FROM signatures WHERE petition_id = ?1 AND email = ?2"
    };
    conn.query_row(sql, rusqlite::params![petition_id, email], |row| row.get(0))
        .expect("count rows")
}
