//! Cash-flow ledger routes.
//!
//! `GET /api/cashflow` takes the browser's filter parameters as-is:
//! `filterType=single|range|month|year` with `customDate`, `startDate` +
//! `endDate`, `month` or `year`, plus an optional `subcategory`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use hisaab_core::ledger::{CashFlowEntry, CashFlowFilter, CashFlowInput};

use crate::error::{ApiError, ApiResult};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/cashflow", get(list_entries).post(create_entry))
        .route("/api/cashflow/{id}", put(update_entry).delete(delete_entry))
}

async fn list_entries(
    State(state): State<SharedState>,
    filter: Result<Query<CashFlowFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<CashFlowEntry>>> {
    let Query(filter) = filter?;

    let entries = state
        .db
        .cash_flow()
        .list(&filter)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch entries"))?;

    Ok(Json(entries))
}

async fn create_entry(
    State(state): State<SharedState>,
    payload: Result<Json<CashFlowInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CashFlowEntry>)> {
    let Json(input) = payload?;

    let entry = state
        .db
        .cash_flow()
        .create(&input)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to save entry"))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    payload: Result<Json<CashFlowInput>, JsonRejection>,
) -> ApiResult<Json<CashFlowEntry>> {
    let Json(input) = payload?;

    let entry = state
        .db
        .cash_flow()
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
        .cash_flow()
        .delete(id)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to delete entry"))?;

    Ok(Json(json!({ "success": true })))
}
