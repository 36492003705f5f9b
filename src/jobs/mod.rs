//! Background import and export jobs
//!
//! A job is recorded as IN_PROGRESS before its work starts. The work itself
//! runs on the blocking pool and the record moves to DONE or ERROR when it
//! finishes.

pub mod export;
pub mod import;

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::{queries, Database, DbError};
use crate::models::job::{Job, JobState, JobType};
use crate::spreadsheet::SheetError;

/// Job errors
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Generate a random (version 4) UUID in its canonical text form
pub fn new_job_id() -> String {
    Uuid::new_v4().to_string()
}

/// Record a new IN_PROGRESS job
pub fn create_job(
    db: &Database,
    id: String,
    job_type: JobType,
    file_path: Option<String>,
) -> Result<Job, DbError> {
    let now = chrono::Utc::now().to_rfc3339();
    let job = Job {
        id,
        job_type,
        job_state: JobState::InProgress,
        file_path,
        created_at: now.clone(),
        updated_at: now,
    };

    db.with_connection(|conn| queries::insert_job(conn, &job))?;
    tracing::info!("Created {} job {}", job.job_type, job.id);

    Ok(job)
}

/// Run `work` on the blocking pool and store the outcome on the job.
///
/// `work` returns the number of sections it handled. The handle resolves to
/// the final state once it has been written.
pub fn spawn_job<F>(db: Arc<Database>, job_id: String, work: F) -> JoinHandle<JobState>
where
    F: FnOnce() -> Result<usize, JobError> + Send + 'static,
{
    tokio::spawn(async move {
        let state = match tokio::task::spawn_blocking(work).await {
            Ok(Ok(count)) => {
                tracing::info!("Job {} finished, {} sections processed", job_id, count);
                JobState::Done
            }
            Ok(Err(e)) => {
                tracing::error!("Job {} failed: {}", job_id, e);
                JobState::Error
            }
            Err(e) => {
                tracing::error!("Job {} aborted: {}", job_id, e);
                JobState::Error
            }
        };

        match db.with_connection(|conn| queries::update_job_state(conn, &job_id, state)) {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Job {} vanished before its state was stored", job_id),
            Err(e) => tracing::error!("Failed to store state of job {}: {}", job_id, e),
        }

        state
    })
}
