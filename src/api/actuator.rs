//! Operational endpoints under `/actuator`

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::blocking;
use crate::AppState;

/// Overall status follows the database probe
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db = state.db.clone();
    let (code, status) = match blocking(move || Ok(db.ping()?)).await {
        Ok(()) => (StatusCode::OK, "UP"),
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "DOWN")
        }
    };

    (
        code,
        Json(json!({
            "status": status,
            "components": { "db": { "status": status } }
        })),
    )
}

pub async fn info() -> Json<Value> {
    Json(json!({
        "app": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
        }
    }))
}
