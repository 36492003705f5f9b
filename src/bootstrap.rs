//! Sample data for a fresh database

use crate::db::{queries, Database, DbError};
use crate::models::geological_class::ClassEntry;
use crate::models::section::NewSection;

fn sample_sections() -> Vec<NewSection> {
    vec![
        NewSection::new(
            "Init Section 1",
            vec![
                ClassEntry::new("Init Geo Class 11", "Init GC11"),
                ClassEntry::new("Init Geo Class 12", "Init GC12"),
            ],
        ),
        NewSection::new(
            "Init Section 2",
            vec![
                ClassEntry::new("Init Geo Class 21", "Init GC21"),
                ClassEntry::new("Init Geo Class 22", "Init GC22"),
            ],
        ),
    ]
}

/// Insert the sample sections when no section exists yet.
/// Returns whether anything was inserted.
pub fn seed_sample_data(db: &Database) -> Result<bool, DbError> {
    db.with_transaction(|tx| {
        if queries::count_sections(tx)? > 0 {
            tracing::info!("Database already contains sections, skipping sample data");
            return Ok(false);
        }

        for section in sample_sections() {
            queries::insert_section(tx, &section, None)?;
        }
        tracing::info!("Initialized database with sample sections");

        Ok(true)
    })
}
