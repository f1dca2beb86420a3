//! # Item Repository
//!
//! Database operations for inventory items.
//!
//! ## Key Operations
//! - CRUD for the inventory screen
//! - Stock movement through one conditional statement
//!
//! ## Stock Movement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Stock Is Moved                                   │
//! │                                                                         │
//! │  apply_stock_delta(tx, "X1", -10, Reject)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE items SET quantity = quantity + (-10)                          │
//! │  WHERE code = 'X1'                                                     │
//! │    AND (allow_negative OR -10 >= 0 OR quantity + (-10) >= 0)           │
//! │  RETURNING *                                                           │
//! │       │                                                                 │
//! │       ├── row returned  → Some(item)      stock moved                   │
//! │       └── no row        → None            unknown code, or the guard    │
//! │                                           refused the oversell          │
//! │                                                                         │
//! │  Read and write happen in ONE statement: two concurrent sales of the   │
//! │  same code can never both read 100 and both write 90.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use hisaab_core::validation::validate_item_input;
use hisaab_core::{CoreError, InventoryItem, ItemInput, StockPolicy};

/// Column list shared by every query that returns an [`InventoryItem`].
const ITEM_COLUMNS: &str = "id, code, hsn_code, company_name, category, sub_category, quantity, \
     purchase_price_paise AS purchase_price, \
     selling_price_mrp_paise AS selling_price_mrp, \
     gst_rate_bps AS gst_rate, \
     rack_no, created_at, updated_at";

/// Name of the unique index on (company, category, sub-category).
const IDENTITY_INDEX: &str = "idx_items_identity";

/// Repository for inventory item operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ItemRepository::new(pool);
///
/// let item = repo.create(&input).await?;
/// let same = repo.find_by_code(&item.code).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Lists every item, oldest first.
    pub async fn list(&self) -> DbResult<Vec<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id");

        let items = sqlx::query_as::<_, InventoryItem>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Gets an item by its row id.
    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");

        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Gets an item by its business code.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE code = ?1");

        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Creates an item.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for malformed input
    /// - `Domain(DuplicateItem)` when company/category/sub-category is taken
    ///   (compared trimmed and case-insensitively by the identity index)
    /// - `UniqueViolation` when the code is taken
    pub async fn create(&self, input: &ItemInput) -> DbResult<InventoryItem> {
        validate_item_input(input)?;

        let now = Utc::now();
        debug!(code = %input.code, "Creating item");

        let sql = format!(
            "INSERT INTO items (
                code, hsn_code, company_name, category, sub_category, quantity,
                purchase_price_paise, selling_price_mrp_paise, gst_rate_bps, rack_no,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            RETURNING {ITEM_COLUMNS}"
        );

        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(input.code.trim())
            .bind(input.hsn_code.as_deref())
            .bind(input.company_name.trim())
            .bind(input.category.trim())
            .bind(input.sub_category.trim())
            .bind(input.quantity.unwrap_or(0))
            .bind(input.purchase_price)
            .bind(input.selling_price_mrp)
            .bind(input.gst_rate)
            .bind(input.rack_no.as_deref())
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify_write_error(e.into(), input))?;

        info!(id = item.id, code = %item.code, quantity = item.quantity, "Item created");
        Ok(item)
    }

    /// Overwrites every field of an item.
    ///
    /// Sales already recorded against the item keep their snapshot values.
    pub async fn update(&self, id: i64, input: &ItemInput) -> DbResult<InventoryItem> {
        validate_item_input(input)?;

        let sql = format!(
            "UPDATE items SET
                code = ?2, hsn_code = ?3, company_name = ?4, category = ?5,
                sub_category = ?6, quantity = COALESCE(?7, quantity),
                purchase_price_paise = ?8, selling_price_mrp_paise = ?9,
                gst_rate_bps = ?10, rack_no = ?11, updated_at = ?12
            WHERE id = ?1
            RETURNING {ITEM_COLUMNS}"
        );

        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(id)
            .bind(input.code.trim())
            .bind(input.hsn_code.as_deref())
            .bind(input.company_name.trim())
            .bind(input.category.trim())
            .bind(input.sub_category.trim())
            .bind(input.quantity)
            .bind(input.purchase_price)
            .bind(input.selling_price_mrp)
            .bind(input.gst_rate)
            .bind(input.rack_no.as_deref())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify_write_error(e.into(), input))?
            .ok_or_else(|| DbError::not_found("Item", id))?;

        info!(id, code = %item.code, "Item updated");
        Ok(item)
    }

    /// Hard-deletes an item and returns the removed row.
    pub async fn delete(&self, id: i64) -> DbResult<InventoryItem> {
        let sql = format!("DELETE FROM items WHERE id = ?1 RETURNING {ITEM_COLUMNS}");

        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))?;

        info!(id, code = %item.code, "Item deleted");
        Ok(item)
    }

    /// Moves stock for `code` by `delta` (negative takes units out).
    ///
    /// Used for manual stock corrections; the sale engine calls
    /// [`apply_stock_delta_strict`] inside its own transaction instead.
    pub async fn adjust_quantity(
        &self,
        code: &str,
        delta: i64,
        policy: StockPolicy,
    ) -> DbResult<InventoryItem> {
        let mut tx = self.pool.begin().await?;
        let item = apply_stock_delta_strict(&mut *tx, code, delta, policy).await?;
        tx.commit().await?;

        info!(code = %item.code, delta, quantity = item.quantity, "Stock adjusted");
        Ok(item)
    }

    /// Counts items (diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Adds `delta` to the stock of `code` in a single conditional statement.
///
/// Returns `None` when no row was touched: either no item has this code,
/// or `policy` is [`StockPolicy::Reject`] and the result would be negative.
/// Adding stock (`delta >= 0`) is never refused.
pub(crate) async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    code: &str,
    delta: i64,
    policy: StockPolicy,
) -> DbResult<Option<InventoryItem>> {
    let sql = format!(
        "UPDATE items
         SET quantity = quantity + ?2, updated_at = ?3
         WHERE code = ?1 AND (?4 OR ?2 >= 0 OR quantity + ?2 >= 0)
         RETURNING {ITEM_COLUMNS}"
    );

    let item = sqlx::query_as::<_, InventoryItem>(&sql)
        .bind(code)
        .bind(delta)
        .bind(Utc::now())
        .bind(policy.allows_negative())
        .fetch_optional(&mut *conn)
        .await?;

    debug!(code, delta, applied = item.is_some(), "Stock delta");
    Ok(item)
}

/// Like [`apply_stock_delta`], but a refused movement is an error.
///
/// ## Errors
/// - `CoreError::ItemNotFound` when no item has this code
/// - `CoreError::InsufficientStock` when the reject policy refused it
pub(crate) async fn apply_stock_delta_strict(
    conn: &mut SqliteConnection,
    code: &str,
    delta: i64,
    policy: StockPolicy,
) -> DbResult<InventoryItem> {
    if let Some(item) = apply_stock_delta(&mut *conn, code, delta, policy).await? {
        return Ok(item);
    }

    // Same transaction, so this sees exactly what the UPDATE saw
    let available: Option<i64> = sqlx::query_scalar("SELECT quantity FROM items WHERE code = ?1")
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        None => Err(CoreError::ItemNotFound(code.to_string()).into()),
        Some(available) => Err(CoreError::InsufficientStock {
            code: code.to_string(),
            available,
            requested: -delta,
        }
        .into()),
    }
}

/// Maps unique-index violations on insert/update to domain errors.
fn classify_write_error(err: DbError, input: &ItemInput) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } if field.contains(IDENTITY_INDEX) => {
            CoreError::DuplicateItem {
                company_name: input.company_name.trim().to_string(),
                category: input.category.trim().to_string(),
                sub_category: input.sub_category.trim().to_string(),
            }
            .into()
        }
        DbError::UniqueViolation { .. } => DbError::duplicate("code", input.code.trim()),
        other => other,
    }
}
