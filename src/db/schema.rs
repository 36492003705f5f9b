//! Database schema definitions
//!
//! Schema changes are applied as an ordered list of versioned migrations.
//! Each applied version is recorded in `schema_history` and never re-run.

use rusqlite::{params, Connection};
use super::DbError;

/// Bookkeeping table for applied migrations
const HISTORY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_history (
    version INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    installed_at TEXT DEFAULT CURRENT_TIMESTAMP
);
"#;

/// A single schema migration
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in application order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create sections, geological classes and jobs",
        sql: r#"
CREATE TABLE sections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    job_id TEXT
);

CREATE TABLE geological_classes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    section_id INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    code TEXT NOT NULL
);

CREATE INDEX idx_geological_classes_section ON geological_classes(section_id);

CREATE TABLE jobs (
    id TEXT PRIMARY KEY,
    job_type TEXT NOT NULL,
    job_state TEXT NOT NULL,
    file_path TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#,
    },
    Migration {
        version: 2,
        description: "index geological class codes for section search",
        sql: r#"
CREATE INDEX idx_geological_classes_code ON geological_classes(code);
CREATE INDEX idx_sections_job ON sections(job_id);
"#,
    },
];

/// Apply every migration not yet recorded, returning how many ran
pub fn run_migrations(conn: &Connection) -> Result<usize, DbError> {
    conn.execute_batch(HISTORY_TABLE)?;

    let current: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_history",
        [],
        |row| row.get(0),
    )?;

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql).map_err(|e| DbError::Migration {
            version: migration.version,
            reason: e.to_string(),
        })?;
        tx.execute(
            "INSERT INTO schema_history (version, description) VALUES (?1, ?2)",
            params![migration.version, migration.description],
        )?;
        tx.commit()?;

        tracing::info!(
            version = migration.version,
            "Applied migration: {}",
            migration.description
        );
        applied += 1;
    }

    Ok(applied)
}
