//! # GST Invoice Routes
//!
//! ```text
//! GET  /api/sales/gst-invoice/items/{code}  → product for the invoice screen
//! POST /api/sales/gst-invoice               → 201 {success, invoice_id, invoice_number, invoice, message}
//! GET  /api/sales/gst-invoice/{id}          → invoice with its lines
//! ```
//!
//! Prices are always taken from the stored item, never from the request.
//! Issuing an invoice does not move stock.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use hisaab_core::invoice::{GstInvoice, GstInvoiceRequest, GstProduct};

use crate::error::{ApiError, ApiResult};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/sales/gst-invoice", post(create_invoice))
        .route("/api/sales/gst-invoice/{id}", get(get_invoice))
        .route("/api/sales/gst-invoice/items/{code}", get(get_product))
}

#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
    pub success: bool,
    pub invoice_id: i64,
    pub invoice_number: String,
    pub invoice: GstInvoice,
    pub message: &'static str,
}

async fn get_product(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> ApiResult<Json<GstProduct>> {
    state
        .db
        .invoices()
        .find_product(&code)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch product"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

async fn create_invoice(
    State(state): State<SharedState>,
    payload: Result<Json<GstInvoiceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateInvoiceResponse>)> {
    let Json(request) = payload?;

    let invoice = state
        .db
        .invoices()
        .create(&request)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to create GST invoice"))?;

    info!(
        invoice_id = invoice.id,
        number = %invoice.invoice_number,
        total = %invoice.total_amount,
        "GST invoice issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateInvoiceResponse {
            success: true,
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            invoice,
            message: "✅ GST invoice created successfully",
        }),
    ))
}

async fn get_invoice(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<GstInvoice>> {
    state
        .db
        .invoices()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Invoice not found"))
}
