//! Inventory item routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;

use hisaab_core::{InventoryItem, ItemInput};

use crate::error::{ApiError, ApiResult};
use crate::events::InventoryAction;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/{id}", put(update_item).delete(delete_item))
}

async fn list_items(State(state): State<SharedState>) -> ApiResult<Json<Vec<InventoryItem>>> {
    let items = state
        .db
        .items()
        .list()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch items"))?;

    Ok(Json(items))
}

async fn create_item(
    State(state): State<SharedState>,
    payload: Result<Json<ItemInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InventoryItem>)> {
    let Json(input) = payload?;

    let item = state.db.items().create(&input).await?;

    info!(item_id = item.id, code = %item.code, quantity = item.quantity, "Item added");
    state.events.publish_inventory(InventoryAction::Add, &item);

    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    payload: Result<Json<ItemInput>, JsonRejection>,
) -> ApiResult<Json<InventoryItem>> {
    let Json(input) = payload?;

    let item = state
        .db
        .items()
        .update(id, &input)
        .await
        .map_err(|e| item_error(e.into()))?;

    state.events.publish_inventory(InventoryAction::Update, &item);
    Ok(Json(item))
}

async fn delete_item(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let item = state
        .db
        .items()
        .delete(id)
        .await
        .map_err(|e| item_error(e.into()))?;

    info!(item_id = id, code = %item.code, "Item deleted");
    state.events.publish_inventory(InventoryAction::Delete, &item);

    Ok(Json(json!({ "message": "✅ Item deleted successfully" })))
}

fn item_error(err: ApiError) -> ApiError {
    if err.is_not_found() {
        ApiError::not_found("Item not found")
    } else {
        err
    }
}
