//! Keeps each account and its Pytition profile in lockstep.
//!
//! The link runs both ways: saving an account creates its profile if
//! missing, and deleting a profile deletes its account. Deleting an account
//! removes the profile through the foreign key cascade.
//!
//! Profile deletion removes the profile row before asking the account store
//! to delete the account, so by the time the account cascade runs there is
//! no profile left for it to reach.

use rusqlite::Connection;

use pytition_types::{Account, AccountId, NewAccount, PytitionUser, UserId, UserProfile};

use crate::accounts::AccountStore;
use crate::queries::users;
use crate::{atomic, DbError, Result};

pub struct ProfileLifecycle<S> {
    accounts: S,
}

impl<S: AccountStore> ProfileLifecycle<S> {
    pub fn new(accounts: S) -> Self {
        Self { accounts }
    }

    pub fn accounts(&self) -> &S {
        &self.accounts
    }

    /// Create an account and its profile in one transaction.
    pub fn register(&self, conn: &Connection, account: &NewAccount) -> Result<UserProfile> {
        atomic(conn, |conn| {
            let account = self.accounts.create(conn, account)?;
            let user = self.account_saved(conn, account.id)?;
            tracing::info!(user_id = user.id, username = %account.username, "account registered");
            Ok(UserProfile { user, account })
        })
    }

    /// Run after any save of account `account_id`: create the profile when
    /// absent, then touch it.
    pub fn account_saved(&self, conn: &Connection, account_id: AccountId) -> Result<PytitionUser> {
        atomic(conn, |conn| {
            let (mut user, created) = users::ensure_for_account(conn, account_id)?;
            if !created {
                users::touch(conn, user.id)?;
                user = users::require(conn, user.id)?;
            }
            Ok(user)
        })
    }

    /// Persist account changes and touch the profile.
    pub fn update_account(&self, conn: &Connection, account: &Account) -> Result<PytitionUser> {
        atomic(conn, |conn| {
            self.accounts.update(conn, account)?;
            self.account_saved(conn, account.id)
        })
    }

    /// Delete a profile and the account behind it.
    ///
    /// Returns `false` when the profile does not exist.
    pub fn delete_profile(&self, conn: &Connection, user_id: UserId) -> Result<bool> {
        atomic(conn, |conn| {
            let Some(user) = users::get(conn, user_id)? else {
                return Ok(false);
            };
            users::delete_row(conn, user.id)?;
            if !self.accounts.delete(conn, user.account_id)? {
                tracing::warn!(user_id, account_id = user.account_id, "profile had no account");
            }
            tracing::info!(user_id, account_id = user.account_id, "profile deleted");
            Ok(true)
        })
    }

    /// Delete an account. Its profile goes with it.
    pub fn delete_account(&self, conn: &Connection, account_id: AccountId) -> Result<bool> {
        atomic(conn, |conn| {
            let deleted = self.accounts.delete(conn, account_id)?;
            if deleted {
                tracing::info!(account_id, "account deleted");
            }
            Ok(deleted)
        })
    }

    /// The profile of `user_id`, or [`DbError::NotFound`].
    pub fn require_profile(&self, conn: &Connection, user_id: UserId) -> Result<UserProfile> {
        users::profile(conn, user_id)?.ok_or_else(|| DbError::NotFound(format!("user {user_id}")))
    }
}
