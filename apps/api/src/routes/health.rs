//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
}

/// `GET /health`: 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthStatus>) {
    if state.db.health_check().await {
        (
            StatusCode::OK,
            Json(HealthStatus {
                status: "ok",
                database: "connected",
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus {
                status: "degraded",
                database: "unavailable",
            }),
        )
    }
}
