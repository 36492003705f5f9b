//! Export endpoints under `/api/v1/export`

use std::path::PathBuf;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use super::extract::QueryParams;
use super::{blocking, find_job};
use crate::auth::Principal;
use crate::jobs;
use crate::models::job::{JobIdResponse, JobState, JobStateResponse, JobType};
use crate::spreadsheet::SheetFormat;
use crate::{ApiError, AppState};

/// Start an export job; `format` is `xlsx` (default) or `csv`
pub async fn start_export(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    params: QueryParams,
) -> Result<Json<JobIdResponse>, ApiError> {
    let format: SheetFormat = params.optional("format")?.unwrap_or_default();

    let db = state.db.clone();
    let work_dir = state.config.work_dir.clone();
    let (job, _) =
        blocking(move || Ok(jobs::export::start_export(db, &work_dir, format)?)).await?;
    tracing::info!(
        "Export job {} ({}) started by '{}'",
        job.id,
        format.extension(),
        principal.username
    );

    Ok(Json(JobIdResponse::from(&job)))
}

pub async fn export_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStateResponse>, ApiError> {
    let job = find_job(&state, id, JobType::Export).await?;
    Ok(Json(JobStateResponse::from(&job)))
}

/// Serve the file of a finished export
pub async fn download_export(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job = find_job(&state, id, JobType::Export).await?;

    match job.job_state {
        JobState::InProgress => return Err(ApiError::ExportInProgress),
        JobState::Error => return Err(ApiError::FileNotFound),
        JobState::Done => {}
    }

    let path = job
        .file_path
        .as_deref()
        .map(PathBuf::from)
        .ok_or(ApiError::FileNotFound)?;
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Export file {:?} of job {} is gone", path, job.id);
            return Err(ApiError::FileNotFound);
        }
        Err(e) => return Err(e.into()),
    };

    let format = SheetFormat::from_path(&path);
    let disposition = format!("attachment; filename={}.{}", job.id, format.extension());

    Ok((
        [
            (CONTENT_TYPE, format.content_type().to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
