//! Geological class endpoints under `/api/v1/geologicalClasses`

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::extract::{JsonBody, PathId, QueryParams};
use super::{run_query, run_transaction, CLASS_NOT_FOUND, SECTION_NOT_FOUND};
use crate::db::queries;
use crate::models::geological_class::{GeologicalClassRequest, GeologicalClassResponse};
use crate::{ApiError, AppState};

/// Add a class to the section named by `sectionId`
pub async fn create_class(
    State(state): State<AppState>,
    params: QueryParams,
    JsonBody(request): JsonBody<GeologicalClassRequest>,
) -> Result<(StatusCode, Json<GeologicalClassResponse>), ApiError> {
    let class = request.validate().map_err(ApiError::Validation)?;
    let section_id: i64 = params.required("sectionId")?;

    let created = run_transaction(&state, move |tx| {
        if queries::get_section(tx, section_id)?.is_none() {
            return Ok(None);
        }
        queries::insert_class(tx, section_id, &class).map(Some)
    })
    .await?
    .ok_or(ApiError::NotFound(SECTION_NOT_FOUND))?;
    tracing::info!("Created class {} in section {}", created.id, section_id);

    Ok((StatusCode::CREATED, Json(GeologicalClassResponse::from(&created))))
}

pub async fn list_classes(
    State(state): State<AppState>,
) -> Result<Json<Vec<GeologicalClassResponse>>, ApiError> {
    let classes = run_query(&state, queries::list_classes).await?;
    Ok(Json(classes.iter().map(GeologicalClassResponse::from).collect()))
}

pub async fn get_class(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<Json<GeologicalClassResponse>, ApiError> {
    let class = run_query(&state, move |conn| queries::get_class(conn, id))
        .await?
        .ok_or(ApiError::NotFound(CLASS_NOT_FOUND))?;

    Ok(Json(GeologicalClassResponse::from(&class)))
}

pub async fn update_class(
    State(state): State<AppState>,
    PathId(id): PathId,
    JsonBody(request): JsonBody<GeologicalClassRequest>,
) -> Result<Json<GeologicalClassResponse>, ApiError> {
    let class = request.validate().map_err(ApiError::Validation)?;

    let updated = run_query(&state, move |conn| queries::update_class(conn, id, &class))
        .await?
        .ok_or(ApiError::NotFound(CLASS_NOT_FOUND))?;

    Ok(Json(GeologicalClassResponse::from(&updated)))
}

pub async fn delete_class(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<StatusCode, ApiError> {
    run_query(&state, move |conn| queries::delete_class(conn, id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
