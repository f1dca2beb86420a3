//! # Invoice Repository
//!
//! Stores GST invoices. Issuing an invoice never touches inventory stock.
//!
//! ## Numbering
//! ```text
//! INSERT INTO gst_invoices (invoice_number, ...)
//! SELECT 'INV-05032024-' || printf('%02d', COUNT(*) + 1), ...
//! FROM gst_invoices WHERE invoice_date = '2024-03-05'
//! ```
//! The count and the insert are one statement inside the write lock, so two
//! invoices issued at the same moment cannot draw the same number.

use chrono::{Local, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use hisaab_core::invoice::{
    invoice_number_prefix, price_line, GstInvoice, GstInvoiceLine, GstInvoiceRequest, GstProduct,
    InvoiceTotals, PricedLine,
};
use hisaab_core::validation::validate_invoice_request;
use hisaab_core::CoreError;

const INVOICE_COLUMNS: &str = "id, invoice_number, invoice_date, customer_name, customer_address, \
     customer_gstin, customer_phone, payment_mode, purchase_mode, \
     subtotal_paise AS subtotal, total_tax_paise AS total_tax, \
     total_amount_paise AS total_amount, created_at";

const LINE_COLUMNS: &str = "id, invoice_id, product_code, description, hsn_code, quantity, \
     rate_paise AS rate, taxable_value_paise AS taxable_value, gst_bps AS gst_percent, \
     cgst_paise AS cgst, sgst_paise AS sgst, total_paise AS total";

/// Repository for GST invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Looks up the invoice view of an inventory item.
    pub async fn find_product(&self, code: &str) -> DbResult<Option<GstProduct>> {
        let product = sqlx::query_as::<_, GstProduct>(
            "SELECT code, hsn_code, company_name, category,
                    sub_category AS subcategory,
                    selling_price_mrp_paise AS selling_price_mrp,
                    gst_rate_bps AS gst
             FROM items WHERE code = ?1",
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Issues an invoice dated today.
    pub async fn create(&self, request: &GstInvoiceRequest) -> DbResult<GstInvoice> {
        self.create_on(request, Local::now().date_naive()).await
    }

    /// Issues an invoice dated `date`.
    ///
    /// ## What This Does
    /// 1. Validates the request
    /// 2. Prices every line from the current item data (MRP, GST rate)
    /// 3. Stores header and lines in one transaction
    ///
    /// ## Errors
    /// `Domain(ItemNotFound)` if any line names an unknown code; nothing is
    /// stored in that case.
    pub async fn create_on(
        &self,
        request: &GstInvoiceRequest,
        date: NaiveDate,
    ) -> DbResult<GstInvoice> {
        validate_invoice_request(request)?;

        let mut priced: Vec<PricedLine> = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = self
                .find_product(&line.code)
                .await?
                .ok_or_else(|| CoreError::ItemNotFound(line.code.trim().to_string()))?;
            let quantity = line.quantity.unwrap_or_default();
            priced.push(price_line(&product, quantity, line.taxable_value)?);
        }
        let totals = InvoiceTotals::from_lines(&priced)?;

        debug!(lines = priced.len(), total = %totals.total_amount, "Invoice priced");

        let customer = &request.customer_details;
        let mut tx = self.pool.begin().await?;

        let header_sql = format!(
            "INSERT INTO gst_invoices (
                invoice_number, invoice_date, customer_name, customer_address,
                customer_gstin, customer_phone, payment_mode, purchase_mode,
                subtotal_paise, total_tax_paise, total_amount_paise, created_at
            )
            SELECT ?1 || printf('%02d', COUNT(*) + 1), ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12
            FROM gst_invoices WHERE invoice_date = ?2
            RETURNING {INVOICE_COLUMNS}"
        );
        let mut invoice = sqlx::query_as::<_, GstInvoice>(&header_sql)
            .bind(invoice_number_prefix(date))
            .bind(date)
            .bind(customer.name.trim())
            .bind(customer.address.trim())
            .bind(customer.gstin.as_deref())
            .bind(customer.phone.trim())
            .bind(request.payment_mode.trim())
            .bind(request.purchase_mode.trim())
            .bind(totals.subtotal)
            .bind(totals.total_tax)
            .bind(totals.total_amount)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        let line_sql = format!(
            "INSERT INTO gst_invoice_items (
                invoice_id, product_code, description, hsn_code, quantity,
                rate_paise, taxable_value_paise, gst_bps, cgst_paise, sgst_paise, total_paise
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            RETURNING {LINE_COLUMNS}"
        );
        for line in &priced {
            let stored = sqlx::query_as::<_, GstInvoiceLine>(&line_sql)
                .bind(invoice.id)
                .bind(&line.product_code)
                .bind(&line.description)
                .bind(line.hsn_code.as_deref())
                .bind(line.quantity)
                .bind(line.rate)
                .bind(line.taxable_value)
                .bind(line.gst_percent)
                .bind(line.cgst)
                .bind(line.sgst)
                .bind(line.total)
                .fetch_one(&mut *tx)
                .await?;
            invoice.items.push(stored);
        }

        tx.commit().await?;

        info!(
            invoice_id = invoice.id,
            invoice_number = %invoice.invoice_number,
            lines = invoice.items.len(),
            total = %invoice.total_amount,
            "GST invoice issued"
        );

        Ok(invoice)
    }

    /// Gets an invoice with its lines.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<GstInvoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM gst_invoices WHERE id = ?1");
        let Some(mut invoice) = sqlx::query_as::<_, GstInvoice>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let sql = format!("SELECT {LINE_COLUMNS} FROM gst_invoice_items WHERE invoice_id = ?1 ORDER BY id");
        invoice.items = sqlx::query_as::<_, GstInvoiceLine>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(invoice))
    }
}
