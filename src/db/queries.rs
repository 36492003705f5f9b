//! Database query implementations
//!
//! Contains functions for sections, geological classes and jobs. Every
//! function takes a plain connection so callers can run it either directly
//! or inside a transaction.

use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::DbError;
use crate::models::geological_class::{ClassEntry, GeologicalClass};
use crate::models::job::{Job, JobState, JobType};
use crate::models::section::{NewSection, Section};

// ============================================================================
// Sections
// ============================================================================

/// Insert a section with its classes, returning the new section id
pub fn insert_section(
    conn: &Connection,
    section: &NewSection,
    job_id: Option<&str>,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO sections (name, job_id) VALUES (?1, ?2)",
        params![section.name, job_id],
    )?;
    let section_id = conn.last_insert_rowid();

    insert_classes(conn, section_id, &section.geological_classes)?;

    Ok(section_id)
}

fn insert_classes(
    conn: &Connection,
    section_id: i64,
    classes: &[ClassEntry],
) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "INSERT INTO geological_classes (section_id, name, code) VALUES (?1, ?2, ?3)",
    )?;
    for class in classes {
        stmt.execute(params![section_id, class.name, class.code])?;
    }
    Ok(())
}

/// Get a single section with its classes
pub fn get_section(conn: &Connection, id: i64) -> Result<Option<Section>, DbError> {
    let section = conn
        .query_row(
            "SELECT id, name, job_id FROM sections WHERE id = ?1",
            params![id],
            section_from_row,
        )
        .optional()?;

    match section {
        Some(mut section) => {
            section.geological_classes = classes_for_section(conn, section.id)?;
            Ok(Some(section))
        }
        None => Ok(None),
    }
}

/// Get all sections ordered by id
pub fn list_sections(conn: &Connection) -> Result<Vec<Section>, DbError> {
    let mut stmt = conn.prepare("SELECT id, name, job_id FROM sections ORDER BY id")?;
    let sections = stmt
        .query_map([], section_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    attach_classes(conn, sections)
}

/// Get distinct sections holding at least one class with the given code
pub fn find_sections_by_class_code(
    conn: &Connection,
    code: &str,
) -> Result<Vec<Section>, DbError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT s.id, s.name, s.job_id
        FROM sections s
        WHERE EXISTS (
            SELECT 1 FROM geological_classes g
            WHERE g.section_id = s.id AND g.code = ?1
        )
        ORDER BY s.id
        "#,
    )?;
    let sections = stmt
        .query_map(params![code], section_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    attach_classes(conn, sections)
}

/// Replace a section's name and full class list.
/// Returns false when the section does not exist.
pub fn replace_section(
    conn: &Connection,
    id: i64,
    section: &NewSection,
) -> Result<bool, DbError> {
    let updated = conn.execute(
        "UPDATE sections SET name = ?1 WHERE id = ?2",
        params![section.name, id],
    )?;
    if updated == 0 {
        return Ok(false);
    }

    conn.execute(
        "DELETE FROM geological_classes WHERE section_id = ?1",
        params![id],
    )?;
    insert_classes(conn, id, &section.geological_classes)?;

    Ok(true)
}

/// Delete a section and, through the foreign key, its classes
pub fn delete_section(conn: &Connection, id: i64) -> Result<usize, DbError> {
    Ok(conn.execute("DELETE FROM sections WHERE id = ?1", params![id])?)
}

/// Count stored sections
pub fn count_sections(conn: &Connection) -> Result<i64, DbError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM sections", [], |row| row.get(0))?)
}

fn section_from_row(row: &Row<'_>) -> rusqlite::Result<Section> {
    Ok(Section {
        id: row.get(0)?,
        name: row.get(1)?,
        job_id: row.get(2)?,
        geological_classes: Vec::new(),
    })
}

/// Section ids bound per `IN (...)` lookup, below SQLite's variable limit
const SECTION_ID_BATCH: usize = 500;

/// Load the classes of the given sections only
fn attach_classes(conn: &Connection, mut sections: Vec<Section>) -> Result<Vec<Section>, DbError> {
    if sections.is_empty() {
        return Ok(sections);
    }

    let ids: Vec<i64> = sections.iter().map(|s| s.id).collect();
    let mut by_section: HashMap<i64, Vec<GeologicalClass>> = HashMap::new();
    for class in classes_for_sections(conn, &ids)? {
        by_section.entry(class.section_id).or_default().push(class);
    }

    for section in &mut sections {
        section.geological_classes = by_section.remove(&section.id).unwrap_or_default();
    }

    Ok(sections)
}

// ============================================================================
// Geological classes
// ============================================================================

/// Insert a class into an existing section
pub fn insert_class(
    conn: &Connection,
    section_id: i64,
    class: &ClassEntry,
) -> Result<GeologicalClass, DbError> {
    conn.execute(
        "INSERT INTO geological_classes (section_id, name, code) VALUES (?1, ?2, ?3)",
        params![section_id, class.name, class.code],
    )?;

    Ok(GeologicalClass {
        id: conn.last_insert_rowid(),
        section_id,
        name: class.name.clone(),
        code: class.code.clone(),
    })
}

/// Get a class by id
pub fn get_class(conn: &Connection, id: i64) -> Result<Option<GeologicalClass>, DbError> {
    let class = conn
        .query_row(
            "SELECT id, section_id, name, code FROM geological_classes WHERE id = ?1",
            params![id],
            class_from_row,
        )
        .optional()?;

    Ok(class)
}

/// Get all classes ordered by id
pub fn list_classes(conn: &Connection) -> Result<Vec<GeologicalClass>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, section_id, name, code FROM geological_classes ORDER BY id",
    )?;
    let classes = stmt
        .query_map([], class_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(classes)
}

/// Classes belonging to any of `section_ids`, ordered by id
pub fn classes_for_sections(
    conn: &Connection,
    section_ids: &[i64],
) -> Result<Vec<GeologicalClass>, DbError> {
    let mut classes = Vec::new();

    for batch in section_ids.chunks(SECTION_ID_BATCH) {
        let placeholders = vec!["?"; batch.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT id, section_id, name, code FROM geological_classes \
             WHERE section_id IN ({placeholders}) ORDER BY id"
        ))?;
        let rows = stmt.query_map(params_from_iter(batch.iter()), class_from_row)?;
        for class in rows {
            classes.push(class?);
        }
    }

    if section_ids.len() > SECTION_ID_BATCH {
        classes.sort_by_key(|c| c.id);
    }
    Ok(classes)
}

/// Classes of one section in insertion order
pub fn classes_for_section(
    conn: &Connection,
    section_id: i64,
) -> Result<Vec<GeologicalClass>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, section_id, name, code FROM geological_classes WHERE section_id = ?1 ORDER BY id",
    )?;
    let classes = stmt
        .query_map(params![section_id], class_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(classes)
}

/// Update a class's name and code, returning the updated record
pub fn update_class(
    conn: &Connection,
    id: i64,
    class: &ClassEntry,
) -> Result<Option<GeologicalClass>, DbError> {
    let updated = conn.execute(
        "UPDATE geological_classes SET name = ?1, code = ?2 WHERE id = ?3",
        params![class.name, class.code, id],
    )?;
    if updated == 0 {
        return Ok(None);
    }

    get_class(conn, id)
}

/// Delete a class by id
pub fn delete_class(conn: &Connection, id: i64) -> Result<usize, DbError> {
    Ok(conn.execute("DELETE FROM geological_classes WHERE id = ?1", params![id])?)
}

fn class_from_row(row: &Row<'_>) -> rusqlite::Result<GeologicalClass> {
    Ok(GeologicalClass {
        id: row.get(0)?,
        section_id: row.get(1)?,
        name: row.get(2)?,
        code: row.get(3)?,
    })
}

// ============================================================================
// Jobs
// ============================================================================

/// Insert a job record
pub fn insert_job(conn: &Connection, job: &Job) -> Result<(), DbError> {
    conn.execute(
        r#"
        INSERT INTO jobs (id, job_type, job_state, file_path, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            job.id,
            job.job_type,
            job.job_state,
            job.file_path,
            job.created_at,
            job.updated_at
        ],
    )?;
    Ok(())
}

/// Get a job by id, optionally restricted to one job type
pub fn get_job(
    conn: &Connection,
    id: &str,
    job_type: Option<JobType>,
) -> Result<Option<Job>, DbError> {
    let job = conn
        .query_row(
            r#"
            SELECT id, job_type, job_state, file_path, created_at, updated_at
            FROM jobs
            WHERE id = ?1
            "#,
            params![id],
            |row| {
                Ok(Job {
                    id: row.get(0)?,
                    job_type: row.get(1)?,
                    job_state: row.get(2)?,
                    file_path: row.get(3)?,
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()?;

    Ok(job.filter(|j| job_type.map_or(true, |t| j.job_type == t)))
}

/// Move a job to a new state. Returns false when the job does not exist.
pub fn update_job_state(conn: &Connection, id: &str, state: JobState) -> Result<bool, DbError> {
    let updated = conn.execute(
        "UPDATE jobs SET job_state = ?1, updated_at = ?2 WHERE id = ?3",
        params![state, chrono::Utc::now().to_rfc3339(), id],
    )?;
    Ok(updated > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    fn create_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        schema::run_migrations(&conn).unwrap();
        conn
    }

    fn create_test_section(name: &str, codes: &[&str]) -> NewSection {
        NewSection::new(
            name,
            codes
                .iter()
                .map(|code| ClassEntry::new(format!("Class {code}"), *code))
                .collect(),
        )
    }

    fn create_test_job(id: &str, job_type: JobType) -> Job {
        let now = chrono::Utc::now().to_rfc3339();
        Job {
            id: id.to_string(),
            job_type,
            job_state: JobState::InProgress,
            file_path: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_get_section() {
        let conn = create_test_conn();
        let id = insert_section(&conn, &create_test_section("S1", &["A", "B"]), None).unwrap();

        let section = get_section(&conn, id).unwrap().unwrap();
        assert_eq!(section.name, "S1");
        assert_eq!(section.job_id, None);
        let codes: Vec<&str> = section.geological_classes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert!(section.geological_classes.iter().all(|c| c.section_id == id));
    }

    #[test]
    fn test_get_missing_section() {
        let conn = create_test_conn();
        assert!(get_section(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_list_sections_attaches_classes() {
        let conn = create_test_conn();
        insert_section(&conn, &create_test_section("S1", &["A"]), None).unwrap();
        insert_section(&conn, &create_test_section("S2", &[]), Some("job-1")).unwrap();
        insert_section(&conn, &create_test_section("S3", &["C", "D"]), None).unwrap();

        let sections = list_sections(&conn).unwrap();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].geological_classes.len(), 1);
        assert!(sections[1].geological_classes.is_empty());
        assert_eq!(sections[1].job_id.as_deref(), Some("job-1"));
        assert_eq!(sections[2].geological_classes[1].code, "D");
    }

    #[test]
    fn test_find_sections_by_class_code_is_distinct() {
        let conn = create_test_conn();
        insert_section(&conn, &create_test_section("S1", &["X", "X", "Y"]), None).unwrap();
        insert_section(&conn, &create_test_section("S2", &["Y"]), None).unwrap();
        insert_section(&conn, &create_test_section("S3", &["Z"]), None).unwrap();

        let found = find_sections_by_class_code(&conn, "X").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "S1");
        assert_eq!(found[0].geological_classes.len(), 3);

        let found = find_sections_by_class_code(&conn, "Y").unwrap();
        assert_eq!(found.len(), 2);

        assert!(find_sections_by_class_code(&conn, "none").unwrap().is_empty());
    }

    #[test]
    fn test_classes_for_sections_only_loads_requested() {
        let conn = create_test_conn();
        let s1 = insert_section(&conn, &create_test_section("S1", &["A", "B"]), None).unwrap();
        let s2 = insert_section(&conn, &create_test_section("S2", &["C"]), None).unwrap();
        let s3 = insert_section(&conn, &create_test_section("S3", &["D"]), None).unwrap();

        let classes = classes_for_sections(&conn, &[s1, s3]).unwrap();
        let codes: Vec<&str> = classes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "D"]);
        assert!(classes.iter().all(|c| c.section_id != s2));

        assert!(classes_for_sections(&conn, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_list_sections_beyond_one_id_batch() {
        let conn = create_test_conn();
        let total = SECTION_ID_BATCH + 3;
        for i in 0..total {
            let code = format!("C{i}");
            insert_section(&conn, &create_test_section(&format!("S{i}"), &[code.as_str()]), None)
                .unwrap();
        }

        let sections = list_sections(&conn).unwrap();
        assert_eq!(sections.len(), total);
        assert!(sections.iter().all(|s| s.geological_classes.len() == 1));
        assert_eq!(sections[total - 1].geological_classes[0].code, format!("C{}", total - 1));
    }

    #[test]
    fn test_replace_section_swaps_classes() {
        let conn = create_test_conn();
        let id = insert_section(&conn, &create_test_section("Old", &["A", "B"]), None).unwrap();

        let replaced = replace_section(&conn, id, &create_test_section("New", &["C"])).unwrap();
        assert!(replaced);

        let section = get_section(&conn, id).unwrap().unwrap();
        assert_eq!(section.name, "New");
        assert_eq!(section.geological_classes.len(), 1);
        assert_eq!(section.geological_classes[0].code, "C");
        assert_eq!(list_classes(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_replace_missing_section() {
        let conn = create_test_conn();
        assert!(!replace_section(&conn, 9, &create_test_section("X", &["A"])).unwrap());
        assert!(list_classes(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_delete_section_cascades() {
        let conn = create_test_conn();
        let id = insert_section(&conn, &create_test_section("S", &["A", "B"]), None).unwrap();

        assert_eq!(delete_section(&conn, id).unwrap(), 1);
        assert_eq!(delete_section(&conn, id).unwrap(), 0);
        assert!(list_classes(&conn).unwrap().is_empty());
        assert_eq!(count_sections(&conn).unwrap(), 0);
    }

    #[test]
    fn test_class_crud() {
        let conn = create_test_conn();
        let section_id = insert_section(&conn, &create_test_section("S", &[]), None).unwrap();

        let class = insert_class(&conn, section_id, &ClassEntry::new("Clay", "CL")).unwrap();
        assert_eq!(get_class(&conn, class.id).unwrap().unwrap(), class);

        let updated = update_class(&conn, class.id, &ClassEntry::new("Loam", "LM"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Loam");
        assert_eq!(updated.section_id, section_id);

        assert!(update_class(&conn, 999, &ClassEntry::new("x", "y")).unwrap().is_none());

        assert_eq!(delete_class(&conn, class.id).unwrap(), 1);
        assert!(get_class(&conn, class.id).unwrap().is_none());
    }

    #[test]
    fn test_insert_class_requires_section() {
        let conn = create_test_conn();
        assert!(insert_class(&conn, 77, &ClassEntry::new("Clay", "CL")).is_err());
    }

    #[test]
    fn test_job_lifecycle() {
        let conn = create_test_conn();
        insert_job(&conn, &create_test_job("job-1", JobType::Export)).unwrap();

        let job = get_job(&conn, "job-1", Some(JobType::Export)).unwrap().unwrap();
        assert_eq!(job.job_state, JobState::InProgress);

        assert!(get_job(&conn, "job-1", Some(JobType::Import)).unwrap().is_none());
        assert!(get_job(&conn, "job-1", None).unwrap().is_some());

        assert!(update_job_state(&conn, "job-1", JobState::Done).unwrap());
        let job = get_job(&conn, "job-1", None).unwrap().unwrap();
        assert_eq!(job.job_state, JobState::Done);

        assert!(!update_job_state(&conn, "missing", JobState::Error).unwrap());
    }
}
