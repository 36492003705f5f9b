//! Problem detail rendering for `ApiError`

use axum::http::header::{ALLOW, CONTENT_TYPE, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::REALM;
use crate::models::FieldErrors;
use crate::ApiError;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// RFC 7807 error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetail {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ProblemDetail {
    pub fn new(status: StatusCode, detail: Option<String>) -> Self {
        Self {
            problem_type: "about:blank".to_string(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail,
            errors: None,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) | ApiError::NoRoute | ApiError::FileNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::ExportInProgress => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_)
            | ApiError::MissingParameter(_)
            | ApiError::InvalidParameter(_)
            | ApiError::MissingPart(_)
            | ApiError::NotMultipart
            | ApiError::Upload(_)
            | ApiError::BodyMissing => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Database(_) | ApiError::Job(_) | ApiError::Io(_) | ApiError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let detail = match &self {
            ApiError::NoRoute | ApiError::MethodNotAllowed => None,
            ApiError::Database(_) | ApiError::Job(_) | ApiError::Io(_) | ApiError::Task(_) => {
                tracing::error!("Request failed: {}", self);
                Some("Please contact the administrator".to_string())
            }
            other => Some(other.to_string()),
        };

        let mut problem = ProblemDetail::new(status, detail);
        if let ApiError::Validation(errors) = self {
            problem.errors = Some(errors);
        }

        let mut response = (status, Json(problem)).into_response();
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(PROBLEM_CONTENT_TYPE));
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(challenge) = HeaderValue::from_str(&format!("Basic realm=\"{REALM}\"")) {
                headers.insert(WWW_AUTHENTICATE, challenge);
            }
        }

        response
    }
}

/// Replace the router's bodiless 405 with a problem, keeping its `Allow` header
pub async fn method_not_allowed_problem(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED
        || response.headers().contains_key(CONTENT_TYPE)
    {
        return response;
    }

    let allow = response.headers().get(ALLOW).cloned();
    let mut problem = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        problem.headers_mut().insert(ALLOW, allow);
    }
    problem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;

    async fn render(error: ApiError) -> (StatusCode, Response, ProblemDetail) {
        let response = error.into_response();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let problem = serde_json::from_slice(&bytes).unwrap();
        (status, Response::from_parts(parts, axum::body::Body::empty()), problem)
    }

    #[tokio::test]
    async fn test_not_found_problem() {
        let (status, response, problem) = render(ApiError::NotFound("Section not found")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], PROBLEM_CONTENT_TYPE);
        assert_eq!(problem.problem_type, "about:blank");
        assert_eq!(problem.title, "Not Found");
        assert_eq!(problem.status, 404);
        assert_eq!(problem.detail.as_deref(), Some("Section not found"));
        assert!(problem.errors.is_none());
    }

    #[tokio::test]
    async fn test_validation_problem_carries_errors() {
        let mut errors = FieldErrors::new();
        errors.insert("name".to_string(), "Name is mandatory".to_string());

        let (status, _, problem) = render(ApiError::Validation(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            problem.detail.as_deref(),
            Some("One or more fields have validation errors")
        );
        assert_eq!(problem.errors.unwrap()["name"], "Name is mandatory");
    }

    #[tokio::test]
    async fn test_internal_problem_hides_cause() {
        let (status, _, problem) = render(ApiError::Database(DbError::LockPoisoned)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(problem.detail.as_deref(), Some("Please contact the administrator"));
    }

    #[tokio::test]
    async fn test_unauthorized_sends_challenge() {
        let (status, response, _) = render(ApiError::Unauthorized).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[WWW_AUTHENTICATE],
            "Basic realm=\"geosections\""
        );
    }

    #[tokio::test]
    async fn test_method_not_allowed_problem() {
        let bare = Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(ALLOW, "GET,HEAD")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = method_not_allowed_problem(bare).await;
        assert_eq!(response.headers()[ALLOW], "GET,HEAD");
        assert_eq!(response.headers()[CONTENT_TYPE], PROBLEM_CONTENT_TYPE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let problem: ProblemDetail = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(problem.title, "Method Not Allowed");
        assert_eq!(problem.status, 405);
        assert!(problem.detail.is_none());

        let ok = method_not_allowed_problem(StatusCode::OK.into_response()).await;
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[test]
    fn test_parameter_messages() {
        assert_eq!(
            ApiError::InvalidParameter("id").to_string(),
            "Invalid value for parameter: id"
        );
        assert_eq!(
            ApiError::MissingParameter("code").to_string(),
            "Missing parameter: code"
        );
        assert_eq!(ApiError::MissingPart("file").to_string(), "Missing part: file");
    }
}
