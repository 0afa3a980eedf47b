//! SQLite Connection & Schema
//! Mission: One shared connection, one schema, used by every store
//!
//! ```sql
//! CREATE TABLE users (
//!     id TEXT PRIMARY KEY,
//!     email TEXT UNIQUE NOT NULL,
//!     password_hash TEXT NOT NULL,
//!     role TEXT NOT NULL,
//!     subscription_status TEXT NOT NULL DEFAULT 'free',
//!     created_at TEXT NOT NULL
//! );
//! CREATE TABLE posts (
//!     id TEXT PRIMARY KEY,
//!     title TEXT NOT NULL,
//!     content TEXT NOT NULL,
//!     is_paid INTEGER NOT NULL DEFAULT 0,
//!     author_id TEXT NOT NULL REFERENCES users(id),
//!     created_at TEXT NOT NULL
//! );
//! ```

use crate::error::ApiError;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Shared handle to the platform database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;
        Self::with_connection(conn)
    }

    /// Private in-memory database (tests, tooling).
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                subscription_status TEXT NOT NULL DEFAULT 'free',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                is_paid INTEGER NOT NULL DEFAULT 0,
                author_id TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
            CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at);
            "#,
        )?;

        debug!("Database schema ready");
        Ok(())
    }

    /// Lock the connection for the duration of one statement batch.
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

/// Storage failures surfaced by the stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint on `users.email` rejected the insert.
    #[error("email already registered")]
    EmailTaken,
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Classify an insert failure, turning unique violations into `EmailTaken`.
    pub(crate) fn from_insert(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                StoreError::EmailTaken
            }
            _ => StoreError::Sqlite(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmailTaken => ApiError::EmailAlreadyExists,
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_schema_is_idempotent() {
        let temp = NamedTempFile::new().unwrap();
        let first = Database::open(temp.path()).unwrap();
        drop(first);

        // Re-opening must not fail on existing tables
        let second = Database::open(temp.path()).unwrap();
        let count: i64 = second
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::EmailTaken),
            ApiError::EmailAlreadyExists
        ));
        assert!(matches!(
            ApiError::from(StoreError::Corrupt("bad role".into())),
            ApiError::Internal(_)
        ));
    }
}
