//! Typed accessors over the `local_state` key-value table.
//!
//! The client persists exactly two entries: the opaque session token
//! under [`KEY_TOKEN`] and the serialized profile snapshot under
//! [`KEY_USER_DATA`]. The pair is always written together and cleared
//! together, via the transactional batch operations.

use rusqlite::OptionalExtension;
use tracing::debug;

use crate::db::Database;
use crate::error::StoreResult;

/// Key of the persisted session token.
pub const KEY_TOKEN: &str = "token";
/// Key of the persisted profile snapshot (JSON).
pub const KEY_USER_DATA: &str = "userData";

/// Durable key-value entries backing the session.
#[derive(Clone)]
pub struct LocalState {
    db: Database,
}

impl LocalState {
    /// Wrap a database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Fetch a single value, `None` if the key has never been written
    /// or was deleted.
    pub async fn get(&self, key: &'static str) -> StoreResult<Option<String>> {
        self.db
            .execute(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM local_state WHERE key = ?1",
                        rusqlite::params![key],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await
    }

    /// Write a single value, replacing any existing entry.
    pub async fn put(&self, key: &'static str, value: String) -> StoreResult<()> {
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO local_state (key, value, updated_at) \
                     VALUES (?1, ?2, unixepoch()) \
                     ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = unixepoch()",
                    rusqlite::params![key, value],
                )?;
                Ok(())
            })
            .await?;
        debug!(key, "local state written");
        Ok(())
    }

    /// Write several entries in one transaction. Used to persist the
    /// token and profile snapshot atomically.
    pub async fn put_many(&self, entries: Vec<(&'static str, String)>) -> StoreResult<()> {
        self.db
            .execute_mut(move |conn| {
                let tx = conn.transaction()?;
                for (key, value) in &entries {
                    tx.execute(
                        "INSERT INTO local_state (key, value, updated_at) \
                         VALUES (?1, ?2, unixepoch()) \
                         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = unixepoch()",
                        rusqlite::params![key, value],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        debug!("local state batch written");
        Ok(())
    }

    /// Delete a single entry. Deleting an absent key is not an error.
    pub async fn delete(&self, key: &'static str) -> StoreResult<()> {
        self.db
            .execute(move |conn| {
                conn.execute(
                    "DELETE FROM local_state WHERE key = ?1",
                    rusqlite::params![key],
                )?;
                Ok(())
            })
            .await?;
        debug!(key, "local state deleted");
        Ok(())
    }

    /// Delete several entries in one transaction. Used on logout to
    /// clear the token and profile snapshot together.
    pub async fn delete_many(&self, keys: Vec<&'static str>) -> StoreResult<()> {
        self.db
            .execute_mut(move |conn| {
                let tx = conn.transaction()?;
                for key in &keys {
                    tx.execute(
                        "DELETE FROM local_state WHERE key = ?1",
                        rusqlite::params![key],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        debug!("local state batch deleted");
        Ok(())
    }
}

// ── tests ────────────────────────────────────────────────────────────
