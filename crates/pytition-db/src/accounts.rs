//! Account repository.
//!
//! Accounts belong to the authentication layer. Pytition only needs to
//! create, read, update and delete them, so the store is a trait handed to
//! [`crate::lifecycle::ProfileLifecycle`] at construction time. Every method
//! takes the connection explicitly so calls join the caller's transaction.

use rusqlite::{Connection, ErrorCode, Row};

use pytition_types::{unix_now, Account, AccountId, NewAccount};

use crate::{optional, DbError, Result};

pub trait AccountStore {
    fn create(&self, conn: &Connection, account: &NewAccount) -> Result<Account>;

    fn get(&self, conn: &Connection, id: AccountId) -> Result<Option<Account>>;

    fn find_by_username(&self, conn: &Connection, username: &str) -> Result<Option<Account>>;

    fn update(&self, conn: &Connection, account: &Account) -> Result<()>;

    /// Delete an account. Returns whether a row was removed.
    fn delete(&self, conn: &Connection, id: AccountId) -> Result<bool>;
}

/// Accounts kept in the `accounts` table of the Pytition database.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqliteAccountStore;

const SELECT: &str =
    "SELECT id, username, first_name, last_name, email, is_active FROM accounts";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        is_active: row.get(5)?,
    })
}

fn map_unique(e: rusqlite::Error, username: &str) -> DbError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            DbError::Constraint(format!("username {username:?} already taken"))
        }
        _ => DbError::Sqlite(e),
    }
}

impl AccountStore for SqliteAccountStore {
    fn create(&self, conn: &Connection, account: &NewAccount) -> Result<Account> {
        account.validate()?;
        conn.execute(
            "INSERT INTO accounts (username, first_name, last_name, email, is_active, date_joined)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            rusqlite::params![
                account.username,
                account.first_name,
                account.last_name,
                account.email,
                unix_now() as i64,
            ],
        )
        .map_err(|e| map_unique(e, &account.username))?;

        Ok(Account {
            id: conn.last_insert_rowid(),
            username: account.username.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            is_active: true,
        })
    }

    fn get(&self, conn: &Connection, id: AccountId) -> Result<Option<Account>> {
        optional(conn.query_row(&format!("{SELECT} WHERE id = ?1"), [id], from_row))
    }

    fn find_by_username(&self, conn: &Connection, username: &str) -> Result<Option<Account>> {
        optional(conn.query_row(
            &format!("{SELECT} WHERE username = ?1"),
            [username],
            from_row,
        ))
    }

    fn update(&self, conn: &Connection, account: &Account) -> Result<()> {
        let updated = conn
            .execute(
                "UPDATE accounts SET username = ?1, first_name = ?2, last_name = ?3,
                        email = ?4, is_active = ?5
                 WHERE id = ?6",
                rusqlite::params![
                    account.username,
                    account.first_name,
                    account.last_name,
                    account.email,
                    account.is_active,
                    account.id,
                ],
            )
            .map_err(|e| map_unique(e, &account.username))?;
        if updated == 0 {
            return Err(DbError::NotFound(format!("account {}", account.id)));
        }
        Ok(())
    }

    fn delete(&self, conn: &Connection, id: AccountId) -> Result<bool> {
        let deleted = conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }
}
