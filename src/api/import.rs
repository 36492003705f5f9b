//! Import endpoints under `/api/v1/import`

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use super::{blocking, find_job};
use crate::auth::Principal;
use crate::jobs;
use crate::models::job::{JobIdResponse, JobStateResponse, JobType};
use crate::{ApiError, AppState};

const FILE_PART: &str = "file";

/// Accept a spreadsheet in the multipart part `file` and start importing it
pub async fn upload(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<JobIdResponse>), ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Rejected import request: {}", e);
        ApiError::NotMultipart
    })?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Upload(e.body_text()))?
    {
        if field.name() == Some(FILE_PART) {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Upload(e.body_text()))?;
            upload = Some((file_name, bytes));
            break;
        }
    }
    let (file_name, bytes) = upload.ok_or(ApiError::MissingPart(FILE_PART))?;

    let db = state.db.clone();
    let work_dir = state.config.work_dir.clone();
    let staged_name = file_name.clone();
    let (job, _) = blocking(move || {
        let path = jobs::import::stage_upload(&work_dir, staged_name.as_deref(), &bytes)?;
        Ok(jobs::import::start_import(db, path)?)
    })
    .await?;
    tracing::info!(
        "Import job {} started by '{}' for {}",
        job.id,
        principal.username,
        file_name.as_deref().unwrap_or("unnamed upload")
    );

    Ok((StatusCode::CREATED, Json(JobIdResponse::from(&job))))
}

pub async fn import_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStateResponse>, ApiError> {
    let job = find_job(&state, id, JobType::Import).await?;
    Ok(Json(JobStateResponse::from(&job)))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;

    const BOUNDARY: &str = "geosections-test-boundary";

    fn multipart_request(part_name: &str, file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{part_name}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/import")
            .header(AUTHORIZATION, basic(ADMIN))
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn wait_for_state(app: &Router, id: &str) -> String {
        let uri = format!("/api/v1/import/{id}");
        for _ in 0..100 {
            let (status, body) = send(app, request(Method::GET, &uri, Some(ADMIN), None)).await;
            assert_eq!(status, StatusCode::OK);
            if body["state"] != "IN_PROGRESS" {
                return body["state"].as_str().unwrap().to_string();
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        panic!("import {id} did not finish");
    }

    #[tokio::test]
    async fn test_import_csv() {
        let (app, _, dir) = create_test_app();
        let csv = "Section name,Class name,Class code\nImported,Clay,CL\n";

        let (status, started) = send(&app, multipart_request("file", "in.csv", csv.as_bytes())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = started["id"].as_str().unwrap().to_string();

        assert_eq!(wait_for_state(&app, &id).await, "DONE");

        let (_, sections) = send(
            &app,
            request(Method::GET, "/api/v1/sections/by-code?code=CL", Some(USER), None),
        )
        .await;
        assert_eq!(sections[0]["name"], "Imported");

        // The staged upload is cleaned up
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_import_xls_upload() {
        let (app, _, _dir) = create_test_app();
        let xls = include_bytes!("../spreadsheet/testdata/sections.xls");

        let (status, started) = send(&app, multipart_request("file", "sections.xls", xls)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = started["id"].as_str().unwrap().to_string();

        assert_eq!(wait_for_state(&app, &id).await, "DONE");

        let (_, sections) = send(
            &app,
            request(Method::GET, "/api/v1/sections/by-code?code=GC21", Some(USER), None),
        )
        .await;
        assert_eq!(sections.as_array().unwrap().len(), 1);
        assert_eq!(sections[0]["name"], "Section 2");
    }

    #[tokio::test]
    async fn test_import_invalid_file_marks_error() {
        let (app, _, _dir) = create_test_app();

        let (status, started) = send(
            &app,
            multipart_request("file", "broken.xls", b"invalid content"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = started["id"].as_str().unwrap().to_string();

        assert_eq!(wait_for_state(&app, &id).await, "ERROR");
    }

    #[tokio::test]
    async fn test_import_request_errors() {
        let (app, _, _dir) = create_test_app();

        let (status, problem) = send(&app, request(Method::POST, "/api/v1/import", Some(ADMIN), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(problem["detail"], "Current request is not a multipart request");

        let (status, problem) = send(&app, multipart_request("other", "in.csv", b"x")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(problem["detail"], "Missing part: file");
    }

    #[tokio::test]
    async fn test_unknown_import_job() {
        let (app, _, _dir) = create_test_app();

        let (status, problem) = send(
            &app,
            request(Method::GET, "/api/v1/import/unknown", Some(ADMIN), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(problem["detail"], "Job ID not found");
    }
}
