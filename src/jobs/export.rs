//! Export job: dump every section into a spreadsheet file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::{create_job, new_job_id, spawn_job, JobError};
use crate::db::{queries, Database};
use crate::models::job::{Job, JobState, JobType};
use crate::models::section::SectionResponse;
use crate::spreadsheet::{self, SheetFormat};

/// File an export job writes to
pub fn export_path(work_dir: &Path, job_id: &str, format: SheetFormat) -> PathBuf {
    work_dir.join(format!("export_{}.{}", job_id, format.extension()))
}

/// Create an export job and start writing its file in the background
pub fn start_export(
    db: Arc<Database>,
    work_dir: &Path,
    format: SheetFormat,
) -> Result<(Job, JoinHandle<JobState>), JobError> {
    std::fs::create_dir_all(work_dir)?;

    let id = new_job_id();
    let path = export_path(work_dir, &id, format);
    let job = create_job(
        &db,
        id,
        JobType::Export,
        Some(path.to_string_lossy().into_owned()),
    )?;

    let worker_db = db.clone();
    let handle = spawn_job(db, job.id.clone(), move || {
        export_sections(&worker_db, &path, format)
    });

    Ok((job, handle))
}

/// Write all stored sections to `path`, returning how many were written
pub fn export_sections(db: &Database, path: &Path, format: SheetFormat) -> Result<usize, JobError> {
    let sections = db.with_connection(queries::list_sections)?;
    let responses: Vec<SectionResponse> = sections.iter().map(SectionResponse::from).collect();

    spreadsheet::write_sections(&responses, path, format)?;
    tracing::debug!("Exported {} sections to {:?}", responses.len(), path);

    Ok(responses.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geological_class::ClassEntry;
    use crate::models::section::NewSection;

    fn create_test_db() -> Arc<Database> {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db.with_connection(|conn| {
            queries::insert_section(
                conn,
                &NewSection::new("Section 1", vec![ClassEntry::new("Clay", "CL")]),
                None,
            )?;
            queries::insert_section(conn, &NewSection::new("Section 2", Vec::new()), None)
        })
        .unwrap();
        Arc::new(db)
    }

    #[test]
    fn test_export_path() {
        let path = export_path(Path::new("/tmp/work"), "abc", SheetFormat::Csv);
        assert_eq!(path, PathBuf::from("/tmp/work/export_abc.csv"));
    }

    #[test]
    fn test_export_sections_csv() {
        let db = create_test_db();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let count = export_sections(&db, &path, SheetFormat::Csv).unwrap();

        assert_eq!(count, 2);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Section name,Class name,Class code\nSection 1,Clay,CL\nSection 2\n"
        );
    }

    #[tokio::test]
    async fn test_start_export_writes_file() {
        let db = create_test_db();
        let dir = tempfile::tempdir().unwrap();

        let (job, handle) = start_export(db.clone(), dir.path(), SheetFormat::Xlsx).unwrap();
        assert_eq!(job.job_state, JobState::InProgress);
        assert_eq!(handle.await.unwrap(), JobState::Done);

        let path = PathBuf::from(job.file_path.unwrap());
        let sections = spreadsheet::read_sections(&path, SheetFormat::Xlsx).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].geological_classes[0].code, "CL");
    }

    #[test]
    fn test_export_into_missing_dir_fails() {
        let db = create_test_db();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");

        assert!(export_sections(&db, &path, SheetFormat::Csv).is_err());
    }
}
