//! # Cash-Credit Account Routes
//!
//! ```text
//! GET    /api/transactions           → list (date DESC)
//! POST   /api/transactions           → 201 | 400 "Invalid transaction data"
//! DELETE /api/transactions/{id}      → 204 | 404
//! GET    /api/transactions/summary   → dashboard figures
//! GET    /api/calculations           → list (newest first)
//! POST   /api/calculations           → 201, interest computed here
//! DELETE /api/calculations/{id}      → 204 | 404 "Calculation not found"
//! GET    /api/account-limit          → {limit}
//! PUT    /api/account-limit          → {limit}
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use hisaab_core::ledger::{
    CreditSummary, CreditTransaction, CreditTransactionInput, InterestCalculation, InterestInput,
};
use hisaab_core::Money;

use crate::error::{ApiError, ApiResult};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/api/transactions/summary", get(summary))
        .route("/api/transactions/{id}", delete(delete_transaction))
        .route(
            "/api/calculations",
            get(list_calculations).post(create_calculation),
        )
        .route("/api/calculations/{id}", delete(delete_calculation))
        .route(
            "/api/account-limit",
            get(get_account_limit).put(set_account_limit),
        )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountLimit {
    pub limit: Money,
}

/// Any 4xx becomes `headline` with the reason in `details`; 5xx keeps the
/// storage error.
fn rejected(err: ApiError, headline: &str) -> ApiError {
    if err.status.is_client_error() {
        ApiError::bad_request(headline).with_details(err.error)
    } else {
        err
    }
}

// =============================================================================
// Transactions
// =============================================================================

async fn list_transactions(
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<CreditTransaction>>> {
    let rows = state
        .db
        .credit()
        .list_transactions()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch transactions"))?;

    Ok(Json(rows))
}

async fn create_transaction(
    State(state): State<SharedState>,
    payload: Result<Json<CreditTransactionInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreditTransaction>)> {
    let Json(input) = payload.map_err(|e| rejected(e.into(), "Invalid transaction data"))?;

    let txn = state
        .db
        .credit()
        .create_transaction(&input)
        .await
        .map_err(|e| rejected(e.into(), "Invalid transaction data"))?;

    Ok((StatusCode::CREATED, Json(txn)))
}

async fn delete_transaction(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .db
        .credit()
        .delete_transaction(id)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to delete transaction"))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn summary(State(state): State<SharedState>) -> ApiResult<Json<CreditSummary>> {
    Ok(Json(state.db.credit().summary().await?))
}

// =============================================================================
// Interest Calculations
// =============================================================================

async fn list_calculations(
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<InterestCalculation>>> {
    let rows = state
        .db
        .credit()
        .list_calculations()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch calculations"))?;

    Ok(Json(rows))
}

async fn create_calculation(
    State(state): State<SharedState>,
    payload: Result<Json<InterestInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InterestCalculation>)> {
    let Json(input) = payload.map_err(|e| rejected(e.into(), "Invalid calculation data"))?;

    let calc = state
        .db
        .credit()
        .create_calculation(&input)
        .await
        .map_err(|e| rejected(e.into(), "Invalid calculation data"))?;

    Ok((StatusCode::CREATED, Json(calc)))
}

async fn delete_calculation(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.credit().delete_calculation(id).await.map_err(|e| {
        let err = ApiError::from(e);
        if err.is_not_found() {
            ApiError::not_found("Calculation not found")
        } else {
            err.context("Failed to delete calculation")
        }
    })?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Account Limit
// =============================================================================

async fn get_account_limit(State(state): State<SharedState>) -> ApiResult<Json<AccountLimit>> {
    let limit = state
        .db
        .credit()
        .account_limit()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch account limit"))?;

    Ok(Json(AccountLimit { limit }))
}

async fn set_account_limit(
    State(state): State<SharedState>,
    payload: Result<Json<AccountLimit>, JsonRejection>,
) -> ApiResult<Json<AccountLimit>> {
    let Json(body) = payload?;

    let limit = state
        .db
        .credit()
        .set_account_limit(body.limit)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to update account limit"))?;

    Ok(Json(AccountLimit { limit }))
}
