//! Request extractors that reject with `ApiError`

use std::collections::HashMap;
use std::str::FromStr;

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::ApiError;

/// Numeric `{id}` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::InvalidParameter("id"))?;

        raw.trim()
            .parse()
            .map(PathId)
            .map_err(|_| ApiError::InvalidParameter("id"))
    }
}

/// Query string parameters; blank values count as absent
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn optional<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, ApiError> {
        match self.0.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| ApiError::InvalidParameter(name)),
            None => Ok(None),
        }
    }

    pub fn required<T: FromStr>(&self, name: &'static str) -> Result<T, ApiError> {
        self.optional(name)?.ok_or(ApiError::MissingParameter(name))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map(|Query(params)| QueryParams(params))
            .map_err(|e| {
                tracing::debug!("Unreadable query string: {}", e);
                ApiError::InvalidParameter("query")
            })
    }
}

/// JSON request body; an empty or malformed body is rejected as missing
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|_| ApiError::BodyMissing)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::BodyMissing);
        }

        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            tracing::debug!("Unreadable request body: {}", e);
            ApiError::BodyMissing
        })
    }
}
