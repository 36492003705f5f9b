//! Section endpoints under `/api/v1/sections`

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::extract::{JsonBody, PathId, QueryParams};
use super::{run_query, run_transaction, SECTION_NOT_FOUND};
use crate::db::queries;
use crate::models::section::{SectionRequest, SectionResponse};
use crate::{ApiError, AppState};

pub async fn create_section(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SectionRequest>,
) -> Result<(StatusCode, Json<SectionResponse>), ApiError> {
    let section = request.validate().map_err(ApiError::Validation)?;

    let created = run_transaction(&state, move |tx| {
        let id = queries::insert_section(tx, &section, None)?;
        queries::get_section(tx, id)
    })
    .await?
    .ok_or(ApiError::NotFound(SECTION_NOT_FOUND))?;
    tracing::info!("Created section {} '{}'", created.id, created.name);

    Ok((StatusCode::CREATED, Json(SectionResponse::from(&created))))
}

pub async fn list_sections(
    State(state): State<AppState>,
) -> Result<Json<Vec<SectionResponse>>, ApiError> {
    let sections = run_query(&state, queries::list_sections).await?;
    Ok(Json(sections.iter().map(SectionResponse::from).collect()))
}

pub async fn get_section(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<SectionResponse>, ApiError> {
    let section = run_query(&state, move |conn| queries::get_section(conn, id))
        .await?
        .ok_or(ApiError::NotFound(SECTION_NOT_FOUND))?;

    Ok(Json(SectionResponse::from(&section)))
}

/// Replace the name and the whole class list of a section
pub async fn update_section(
    State(state): State<AppState>,
    PathId(id): PathId,
    JsonBody(request): JsonBody<SectionRequest>,
) -> Result<Json<SectionResponse>, ApiError> {
    let section = request.validate().map_err(ApiError::Validation)?;

    let updated = run_transaction(&state, move |tx| {
        if !queries::replace_section(tx, id, &section)? {
            return Ok(None);
        }
        queries::get_section(tx, id)
    })
    .await?
    .ok_or(ApiError::NotFound(SECTION_NOT_FOUND))?;
    tracing::info!("Updated section {}", id);

    Ok(Json(SectionResponse::from(&updated)))
}

pub async fn delete_section(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<StatusCode, ApiError> {
    let deleted = run_query(&state, move |conn| queries::delete_section(conn, id)).await?;
    if deleted > 0 {
        tracing::info!("Deleted section {}", id);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Sections holding at least one class with the given code
pub async fn sections_by_code(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Json<Vec<SectionResponse>>, ApiError> {
    let code: String = params.required("code")?;

    let sections =
        run_query(&state, move |conn| queries::find_sections_by_class_code(conn, &code)).await?;

    Ok(Json(sections.iter().map(SectionResponse::from).collect()))
}
