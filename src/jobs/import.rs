//! Import job: load sections from an uploaded spreadsheet

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::{create_job, new_job_id, spawn_job, JobError};
use crate::db::{queries, Database};
use crate::models::job::{Job, JobState, JobType};
use crate::spreadsheet::{self, SheetFormat};

/// Save uploaded bytes into `work_dir`, keeping the upload's extension
pub fn stage_upload(
    work_dir: &Path,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Result<PathBuf, JobError> {
    std::fs::create_dir_all(work_dir)?;

    let suffix = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default();

    let mut file = tempfile::Builder::new()
        .prefix("upload_")
        .suffix(&suffix)
        .tempfile_in(work_dir)?;
    file.write_all(bytes)?;

    let (_, path) = file.keep().map_err(|e| JobError::Io(e.error))?;
    tracing::debug!("Staged {} byte upload at {:?}", bytes.len(), path);

    Ok(path)
}

/// Create an import job for a staged upload and start loading it
pub fn start_import(
    db: Arc<Database>,
    upload: PathBuf,
) -> Result<(Job, JoinHandle<JobState>), JobError> {
    let job = match create_job(&db, new_job_id(), JobType::Import, None) {
        Ok(job) => job,
        Err(e) => {
            remove_upload(&upload);
            return Err(e.into());
        }
    };

    let worker_db = db.clone();
    let job_id = job.id.clone();
    let handle = spawn_job(db, job.id.clone(), move || {
        import_sections(&worker_db, &job_id, &upload)
    });

    Ok((job, handle))
}

/// Parse the whole file, then store every section in one transaction.
///
/// The upload is removed afterwards whether or not the import succeeded.
pub fn import_sections(db: &Database, job_id: &str, upload: &Path) -> Result<usize, JobError> {
    let format = SheetFormat::from_path(upload);
    let result = spreadsheet::read_sections(upload, format)
        .map_err(JobError::from)
        .and_then(|sections| {
            db.with_transaction(|tx| {
                for section in &sections {
                    queries::insert_section(tx, section, Some(job_id))?;
                }
                Ok(sections.len())
            })
            .map_err(JobError::from)
        });

    remove_upload(upload);
    result
}

fn remove_upload(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!("Failed to delete temporary file {:?}: {}", path, e);
    }
}
