//! Database module for SQLite operations
//!
//! This module handles all database interactions including:
//! - Versioned schema migrations
//! - Section and geological class queries
//! - Job bookkeeping for imports and exports

pub mod schema;
pub mod queries;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, Transaction};
use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration {version} failed: {reason}")]
    Migration { version: i64, reason: String },

    #[error("Unknown {kind} value stored: {value}")]
    InvalidValue { kind: &'static str, value: String },

    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Database connection wrapper
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database file
    pub fn new(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open the database named by a config value, `:memory:` meaning in-memory
    pub fn open(location: &Path) -> Result<Self, DbError> {
        if location.as_os_str() == ":memory:" {
            Self::in_memory()
        } else {
            Self::new(location)
        }
    }

    fn configure(conn: &Connection) -> Result<(), DbError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }

    /// Apply pending schema migrations
    pub fn initialize(&self) -> Result<usize, DbError> {
        self.with_connection(schema::run_migrations)
    }

    /// Execute a query with the database connection
    pub fn with_connection<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&conn)
    }

    /// Execute a closure inside a transaction, committing when it succeeds
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, DbError>,
    {
        let mut conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Cheap liveness probe used by the health endpoint
    pub fn ping(&self) -> Result<(), DbError> {
        self.with_connection(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }
}
