//! SQLite persistence backend.
//!
//! Stores each logical key as one row of the `kv` table. Every `set` runs
//! in an IMMEDIATE transaction, so a concurrent reader (in this or another
//! process) sees either the old or the new value, never a torn write.
//!
//! Change events are raised for writes made through this handle. Writes by
//! other processes raise no event; readers pick them up by polling.

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;

use super::backend::{
    ChangeEvent, ChangeListener, ListenerId, Listeners, PersistenceBackend, check_quota,
};
use super::schema::apply_schema;
use crate::error::{Error, Result};

/// SQLite-based [`PersistenceBackend`].
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    listeners: Listeners,
    quota: Option<usize>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("quota", &self.quota)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            listeners: Listeners::new(),
            quota: None,
        }
    }

    /// Limit total stored bytes (keys plus values).
    #[must_use]
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Persistence("connection lock poisoned".to_string()))
    }

    /// Bytes currently stored, keys plus values.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn bytes_in_use(&self) -> Result<usize> {
        let conn = self.lock()?;
        let used: i64 = conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0) FROM kv",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(used).unwrap_or(0))
    }
}

impl PersistenceBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        let old_value = {
            let mut conn = self.lock()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if self.quota.is_some() {
                let used_by_others: i64 = tx.query_row(
                    "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
                     FROM kv WHERE key != ?1",
                    [key],
                    |row| row.get(0),
                )?;
                check_quota(
                    self.quota,
                    usize::try_from(used_by_others).unwrap_or(0),
                    key,
                    value,
                )?;
            }

            let old_value: Option<String> = tx
                .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
                .optional()?;

            tx.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![key, value, now],
            )?;

            // Dropping an uncommitted transaction rolls it back, so every
            // early return above leaves the row untouched.
            tx.commit()?;
            old_value
        };

        debug!(key, bytes = value.len(), "sqlite backend write");
        self.listeners.notify(&ChangeEvent {
            key: key.to_string(),
            old_value,
            new_value: value.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self, listener: ChangeListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}
