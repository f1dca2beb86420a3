//! Profit & loss ledger routes.
//!
//! `GET /api/profit-loss?month=2024-05&type=Income` narrows the list; both
//! parameters are optional.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use hisaab_core::ledger::{PnlEntry, PnlFilter, PnlInput};

use crate::error::{ApiError, ApiResult};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/profit-loss", get(list_entries).post(create_entry))
        .route("/api/profit-loss/{id}", put(update_entry).delete(delete_entry))
}

async fn list_entries(
    State(state): State<SharedState>,
    filter: Result<Query<PnlFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<PnlEntry>>> {
    let Query(filter) = filter?;

    let entries = state
        .db
        .profit_loss()
        .list(&filter)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch entries"))?;

    Ok(Json(entries))
}

async fn create_entry(
    State(state): State<SharedState>,
    payload: Result<Json<PnlInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PnlEntry>)> {
    let Json(input) = payload?;

    let entry = state
        .db
        .profit_loss()
        .create(&input)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to save entry"))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    payload: Result<Json<PnlInput>, JsonRejection>,
) -> ApiResult<Json<PnlEntry>> {
    let Json(input) = payload?;

    let entry = state
        .db
        .profit_loss()
        .update(id, &input)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to update entry"))?;

    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state
        .db
        .profit_loss()
        .delete(id)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to delete entry"))?;

    Ok(Json(json!({ "success": true })))
}
