//! HTTP API
//!
//! Routes are grouped by the role they require: actuator and docs are
//! public, section and class CRUD need any account, import and export need
//! an administrator.

pub mod actuator;
pub mod docs;
pub mod error;
pub mod export;
pub mod extract;
pub mod geological_classes;
pub mod import;
pub mod sections;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use rusqlite::{Connection, Transaction};

use crate::db::{queries, DbError};
use crate::models::job::{Job, JobType};
use crate::{auth, ApiError, AppState};

pub const SECTION_NOT_FOUND: &str = "Section not found";
pub const CLASS_NOT_FOUND: &str = "Geological Class not found";
pub const JOB_NOT_FOUND: &str = "Job ID not found";

/// Build the application router
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/actuator/health", get(actuator::health))
        .route("/actuator/info", get(actuator::info))
        .route("/v3/api-docs", get(docs::openapi));

    let user = Router::new()
        .route(
            "/api/v1/sections",
            get(sections::list_sections).post(sections::create_section),
        )
        .route("/api/v1/sections/by-code", get(sections::sections_by_code))
        .route(
            "/api/v1/sections/:id",
            get(sections::get_section)
                .put(sections::update_section)
                .delete(sections::delete_section),
        )
        .route(
            "/api/v1/geologicalClasses",
            get(geological_classes::list_classes).post(geological_classes::create_class),
        )
        .route(
            "/api/v1/geologicalClasses/:id",
            get(geological_classes::get_class)
                .put(geological_classes::update_class)
                .delete(geological_classes::delete_class),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_user));

    let admin = Router::new()
        .route("/api/v1/export", get(export::start_export))
        .route("/api/v1/export/:id", get(export::export_state))
        .route("/api/v1/export/:id/file", get(export::download_export))
        .route("/api/v1/import", post(import::upload))
        .route("/api/v1/import/:id", get(import::import_state))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    Router::new()
        .merge(public)
        .merge(user)
        .merge(admin)
        .fallback(no_route)
        .layer(middleware::map_response(error::method_not_allowed_problem))
        .with_state(state)
}

async fn no_route() -> ApiError {
    ApiError::NoRoute
}

/// Run synchronous work on the blocking pool
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Run queries on the blocking pool, so waiting on the connection lock
/// never stalls an async worker
pub(crate) async fn run_query<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Connection) -> Result<T, DbError> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    Ok(tokio::task::spawn_blocking(move || db.with_connection(f)).await??)
}

/// Like [`run_query`], inside one transaction
pub(crate) async fn run_transaction<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, DbError> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    Ok(tokio::task::spawn_blocking(move || db.with_transaction(f)).await??)
}

/// Look up a job of the given type
pub(crate) async fn find_job(
    state: &AppState,
    id: String,
    job_type: JobType,
) -> Result<Job, ApiError> {
    run_query(state, move |conn| queries::get_job(conn, &id, Some(job_type)))
        .await?
        .ok_or(ApiError::NotFound(JOB_NOT_FOUND))
}
