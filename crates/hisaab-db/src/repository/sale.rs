//! # Sale Repository
//!
//! The sale reconciliation engine: every sale write moves inventory stock
//! in the same SQLite transaction.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. RECORD                                                             │
//! │     └── validate_sale_input()          (no transaction on failure)     │
//! │     └── BEGIN                                                          │
//! │     └── INSERT sale                                                    │
//! │     └── stock(code) += -quantity       (unknown code → rollback)       │
//! │     └── COMMIT → { sale, updated_item }                                │
//! │                                                                         │
//! │  2. UPDATE                                                             │
//! │     └── BEGIN, lock + read the old row                                 │
//! │     └── same code:    stock(code) += old.qty - new.qty  (if ≠ 0)       │
//! │     └── code changed: stock(old) += old.qty  (missing item: no-op)     │
//! │                       stock(new) -= new.qty  (missing item: rollback)  │
//! │     └── UPDATE sale fields, COMMIT                                     │
//! │                                                                         │
//! │  3. DELETE                                                             │
//! │     └── BEGIN, DELETE sale RETURNING row                               │
//! │     └── stock(code) += quantity        (missing item: no-op)           │
//! │     └── COMMIT → { restored_quantity, item_code }                      │
//! │                                                                         │
//! │  While a sale exists its net effect on stock is exactly -quantity;     │
//! │  once deleted it is zero.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! The first statement of every transaction here is a write, so SQLite hands
//! out its write lock before anything is read. Concurrent engine calls queue
//! on that lock (bounded by the pool's `busy_timeout`) and each one sees the
//! stock the previous one committed.

use chrono::{Local, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::item::{apply_stock_delta, apply_stock_delta_strict};
use hisaab_core::validation::validate_sale_input;
use hisaab_core::{CoreError, InventoryItem, SaleDraft, SaleInput, SaleRecord, StockPolicy};

/// Column list shared by every query that returns a [`SaleRecord`].
const SALE_COLUMNS: &str = "id, date, code, hsn_code, company_name, category, subcategory, \
     purchase_price_paise AS purchase_price, \
     selling_price_mrp_paise AS selling_price_mrp, \
     quantity, \
     discount_bps AS discount, \
     total_amount_paise AS total_amount, \
     created_at, updated_at";

/// Outcome of [`SaleRepository::record`].
#[derive(Debug, Clone)]
pub struct RecordedSale {
    pub sale: SaleRecord,
    /// The inventory row after the decrement.
    pub updated_item: InventoryItem,
}

/// Outcome of [`SaleRepository::update`].
#[derive(Debug, Clone)]
pub struct UpdatedSale {
    pub sale: SaleRecord,
    /// Inventory rows whose stock moved (zero, one or two).
    pub stock_changes: Vec<InventoryItem>,
}

/// Outcome of [`SaleRepository::delete`].
#[derive(Debug, Clone)]
pub struct DeletedSale {
    pub sale: SaleRecord,
    pub restored_quantity: i64,
    pub item_code: String,
    /// The inventory row after the restore, `None` if the item is gone.
    pub restored_item: Option<InventoryItem>,
}

/// The sale reconciliation engine.
///
/// ## Usage
/// ```rust,ignore
/// let sales = db.sales();
///
/// let recorded = sales.record(input).await?;        // stock 100 → 90
/// sales.update(recorded.sale.id, edited).await?;    // quantity 10 → 5, stock 95
/// sales.delete(recorded.sale.id).await?;            // stock back to 100
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    policy: StockPolicy,
}

impl SaleRepository {
    /// Creates a new SaleRepository with the given oversell policy.
    pub fn new(pool: SqlitePool, policy: StockPolicy) -> Self {
        SaleRepository { pool, policy }
    }

    /// Lists sales, newest first.
    pub async fn list(&self) -> DbResult<Vec<SaleRecord>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY date DESC, id DESC");

        let sales = sqlx::query_as::<_, SaleRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<SaleRecord>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let sale = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Counts sale rows (diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Records a sale and takes its quantity out of stock.
    ///
    /// ## Errors
    /// - `Domain(Validation)` before any write
    /// - `Domain(ItemNotFound)` when no item carries the sale's code
    /// - `Domain(InsufficientStock)` under [`StockPolicy::Reject`]
    ///
    /// On any error the inserted sale row is rolled back with the rest.
    pub async fn record(&self, input: SaleInput) -> DbResult<RecordedSale> {
        let draft = validate_sale_input(input, Local::now().date_naive())?;

        let mut tx = self.pool.begin().await?;

        let sale = insert_sale(&mut *tx, &draft).await?;
        debug!(sale_id = sale.id, code = %sale.code, "Sale row inserted");

        let updated_item =
            apply_stock_delta_strict(&mut *tx, &sale.code, -sale.quantity, self.policy).await?;

        tx.commit().await?;

        info!(
            sale_id = sale.id,
            code = %sale.code,
            quantity = sale.quantity,
            total = %sale.total_amount,
            stock = updated_item.quantity,
            "Sale recorded"
        );

        Ok(RecordedSale { sale, updated_item })
    }

    /// Replaces every field of a sale and reconciles stock.
    ///
    /// `input.quantity` is the new total, not a delta: repeating the same
    /// update leaves stock where the first one put it.
    ///
    /// ## Stock Rules
    /// - Same code: stock moves by `old - new`. Returning units to an item
    ///   that no longer exists is a no-op; taking units requires the item.
    /// - Code changed: the old item gets `old` back (no-op if it is gone),
    ///   then the new item gives up `new` (it must exist).
    pub async fn update(&self, id: i64, input: SaleInput) -> DbResult<UpdatedSale> {
        let draft = validate_sale_input(input, Local::now().date_naive())?;

        let mut tx = self.pool.begin().await?;

        // A no-op write, so the write lock is held before the old row is read
        let lock_sql = format!("UPDATE sales SET id = id WHERE id = ?1 RETURNING {SALE_COLUMNS}");
        let old = sqlx::query_as::<_, SaleRecord>(&lock_sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::SaleNotFound(id))?;

        let mut stock_changes = Vec::new();

        if old.code == draft.code {
            let delta = old.quantity - draft.quantity;
            if let Some(item) = self.move_stock(&mut *tx, &draft.code, delta).await? {
                stock_changes.push(item);
            }
        } else {
            debug!(sale_id = id, from = %old.code, to = %draft.code, "Sale moved to another item");

            if let Some(item) = self.move_stock(&mut *tx, &old.code, old.quantity).await? {
                stock_changes.push(item);
            }
            if let Some(item) = self.move_stock(&mut *tx, &draft.code, -draft.quantity).await? {
                stock_changes.push(item);
            }
        }

        let update_sql = format!(
            "UPDATE sales SET
                date = ?2, code = ?3, hsn_code = ?4, company_name = ?5,
                category = ?6, subcategory = ?7,
                purchase_price_paise = ?8, selling_price_mrp_paise = ?9,
                quantity = ?10, discount_bps = ?11, total_amount_paise = ?12,
                updated_at = ?13
            WHERE id = ?1
            RETURNING {SALE_COLUMNS}"
        );
        let sale = sqlx::query_as::<_, SaleRecord>(&update_sql)
            .bind(id)
            .bind(draft.date)
            .bind(&draft.code)
            .bind(draft.hsn_code.as_deref())
            .bind(&draft.company_name)
            .bind(&draft.category)
            .bind(&draft.subcategory)
            .bind(draft.purchase_price)
            .bind(draft.selling_price_mrp)
            .bind(draft.quantity)
            .bind(draft.discount)
            .bind(draft.total_amount)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            sale_id = id,
            code = %sale.code,
            old_quantity = old.quantity,
            new_quantity = sale.quantity,
            items_adjusted = stock_changes.len(),
            "Sale updated"
        );

        Ok(UpdatedSale {
            sale,
            stock_changes,
        })
    }

    /// Deletes a sale and puts its quantity back in stock.
    ///
    /// If the item was deleted in the meantime the restore is skipped and
    /// the sale is still removed.
    pub async fn delete(&self, id: i64) -> DbResult<DeletedSale> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("DELETE FROM sales WHERE id = ?1 RETURNING {SALE_COLUMNS}");
        let sale = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::SaleNotFound(id))?;

        let restored_item = apply_stock_delta(&mut *tx, &sale.code, sale.quantity, self.policy).await?;

        tx.commit().await?;

        info!(
            sale_id = id,
            code = %sale.code,
            restored_quantity = sale.quantity,
            item_present = restored_item.is_some(),
            "Sale deleted"
        );

        Ok(DeletedSale {
            restored_quantity: sale.quantity,
            item_code: sale.code.clone(),
            restored_item,
            sale,
        })
    }

    /// Moves stock for one code during an update.
    ///
    /// Units coming back (`delta > 0`) never fail; units going out must find
    /// the item and pass the stock policy.
    async fn move_stock(
        &self,
        conn: &mut SqliteConnection,
        code: &str,
        delta: i64,
    ) -> DbResult<Option<InventoryItem>> {
        match delta {
            0 => Ok(None),
            d if d > 0 => apply_stock_delta(conn, code, d, self.policy).await,
            d => apply_stock_delta_strict(conn, code, d, self.policy)
                .await
                .map(Some),
        }
    }
}

/// Inserts the sale row for a validated draft.
async fn insert_sale(conn: &mut SqliteConnection, draft: &SaleDraft) -> DbResult<SaleRecord> {
    let sql = format!(
        "INSERT INTO sales (
            date, code, hsn_code, company_name, category, subcategory,
            purchase_price_paise, selling_price_mrp_paise,
            quantity, discount_bps, total_amount_paise,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
        RETURNING {SALE_COLUMNS}"
    );

    let sale = sqlx::query_as::<_, SaleRecord>(&sql)
        .bind(draft.date)
        .bind(&draft.code)
        .bind(draft.hsn_code.as_deref())
        .bind(&draft.company_name)
        .bind(&draft.category)
        .bind(&draft.subcategory)
        .bind(draft.purchase_price)
        .bind(draft.selling_price_mrp)
        .bind(draft.quantity)
        .bind(draft.discount)
        .bind(draft.total_amount)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

    Ok(sale)
}
