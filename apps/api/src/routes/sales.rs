//! # Sales Routes
//!
//! HTTP face of the sale reconciliation engine. Every write here moves
//! inventory stock in the same transaction (see `hisaab_db::SaleRepository`)
//! and pushes the affected items to SSE subscribers after commit.
//!
//! ```text
//! POST   /api/sales        → 201 {sale, updatedItem, message}
//! GET    /api/sales        → 200 [sale, ...]  (date DESC, id DESC)
//! GET    /api/sales/{id}   → 200 sale | 404
//! PUT    /api/sales/{id}   → 200 {sale, message} | 404
//! DELETE /api/sales/{id}   → 200 {message, restoredQuantity, itemCode} | 404
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use hisaab_core::{CoreError, InventoryItem, SaleInput, SaleRecord};
use hisaab_db::DbError;

use crate::error::{ApiError, ApiResult};
use crate::events::InventoryAction;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/sales", get(list_sales).post(record_sale))
        .route(
            "/api/sales/{id}",
            get(get_sale).put(update_sale).delete(delete_sale),
        )
}

// =============================================================================
// Response Bodies
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSaleResponse {
    pub sale: SaleRecord,
    pub updated_item: InventoryItem,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UpdateSaleResponse {
    pub sale: SaleRecord,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSaleResponse {
    pub message: &'static str,
    pub restored_quantity: i64,
    pub item_code: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_sales(State(state): State<SharedState>) -> ApiResult<Json<Vec<SaleRecord>>> {
    let sales = state
        .db
        .sales()
        .list()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch sales data."))?;

    Ok(Json(sales))
}

async fn get_sale(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SaleRecord>> {
    state
        .db
        .sales()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale not found"))
}

/// RecordSale: insert the sale and take its units out of stock.
async fn record_sale(
    State(state): State<SharedState>,
    payload: Result<Json<SaleInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RecordSaleResponse>)> {
    let Json(input) = payload?;

    let recorded = state
        .db
        .sales()
        .record(input)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to save sales entry."))?;

    info!(
        sale_id = recorded.sale.id,
        code = %recorded.sale.code,
        quantity = recorded.sale.quantity,
        stock = recorded.updated_item.quantity,
        "Sale recorded"
    );
    state
        .events
        .publish_inventory(InventoryAction::Stock, &recorded.updated_item);

    Ok((
        StatusCode::CREATED,
        Json(RecordSaleResponse {
            sale: recorded.sale,
            updated_item: recorded.updated_item,
            message: "✅ Sale recorded and inventory updated",
        }),
    ))
}

/// UpdateSale: replace the sale's fields and move stock by the difference.
async fn update_sale(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    payload: Result<Json<SaleInput>, JsonRejection>,
) -> ApiResult<Json<UpdateSaleResponse>> {
    let Json(input) = payload?;

    let updated = state
        .db
        .sales()
        .update(id, input)
        .await
        .map_err(|e| sale_error(e, "Failed to update sale"))?;

    info!(
        sale_id = id,
        items_moved = updated.stock_changes.len(),
        "Sale updated"
    );
    for item in &updated.stock_changes {
        state.events.publish_inventory(InventoryAction::Stock, item);
    }

    Ok(Json(UpdateSaleResponse {
        sale: updated.sale,
        message: "✅ Sale updated successfully",
    }))
}

/// DeleteSale: remove the sale and put its units back.
async fn delete_sale(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteSaleResponse>> {
    let deleted = state
        .db
        .sales()
        .delete(id)
        .await
        .map_err(|e| sale_error(e, "Failed to delete sale"))?;

    info!(
        sale_id = id,
        code = %deleted.item_code,
        restored = deleted.restored_quantity,
        "Sale deleted"
    );
    if let Some(item) = &deleted.restored_item {
        state.events.publish_inventory(InventoryAction::Stock, item);
    }

    Ok(Json(DeleteSaleResponse {
        message: "✅ Sale deleted successfully",
        restored_quantity: deleted.restored_quantity,
        item_code: deleted.item_code,
    }))
}

/// A missing sale is a plain 404; every other failure keeps its status
/// under the operation's headline.
fn sale_error(err: DbError, headline: &str) -> ApiError {
    match err {
        DbError::Domain(CoreError::SaleNotFound(_)) => ApiError::not_found("Sale not found"),
        other => ApiError::from(other).context(headline),
    }
}
