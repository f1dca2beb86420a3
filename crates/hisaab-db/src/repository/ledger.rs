//! # Ledger Repositories
//!
//! Cash-flow entries and monthly profit & loss entries. Both are plain
//! ledgers: no entry here affects inventory or any other table.
//!
//! ## Cash-Flow Filters
//! ```text
//! filterType=single  &customDate=2024-05-02     → date = '2024-05-02'
//! filterType=range   &startDate=…&endDate=…     → date BETWEEN start AND end
//! filterType=month   &month=5                   → May of any year
//! filterType=year    &year=2024                 → 2024
//! subcategory=in-flow                           → combined with any of the above
//! ```
//! A filter type whose parameters are missing lists every date.

use chrono::{Local, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use hisaab_core::ledger::{
    CashFlowEntry, CashFlowFilter, CashFlowInput, PeriodFilter, PnlEntry, PnlFilter, PnlInput,
};
use hisaab_core::validation::{validate_cash_flow_input, validate_pnl_input};

const CASH_FLOW_COLUMNS: &str =
    "id, category, subcategory, amount_paise AS amount, date, created_at, updated_at";

const PNL_COLUMNS: &str =
    "id, month, category, type AS kind, amount_paise AS amount, created_at, updated_at";

// =============================================================================
// Cash Flow
// =============================================================================

/// Repository for cash-flow entries.
#[derive(Debug, Clone)]
pub struct CashFlowRepository {
    pool: SqlitePool,
}

impl CashFlowRepository {
    /// Creates a new CashFlowRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashFlowRepository { pool }
    }

    /// Lists entries matching `filter`, newest date first.
    pub async fn list(&self, filter: &CashFlowFilter) -> DbResult<Vec<CashFlowEntry>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {CASH_FLOW_COLUMNS} FROM cash_flow WHERE 1 = 1"));

        let period = filter.period();
        match period {
            PeriodFilter::All => {}
            PeriodFilter::Day(day) => {
                query.push(" AND date = ").push_bind(day);
            }
            PeriodFilter::Range(start, end) => {
                query
                    .push(" AND date BETWEEN ")
                    .push_bind(start)
                    .push(" AND ")
                    .push_bind(end);
            }
            PeriodFilter::Month(month) => {
                query
                    .push(" AND CAST(strftime('%m', date) AS INTEGER) = ")
                    .push_bind(i64::from(month));
            }
            PeriodFilter::Year(year) => {
                query
                    .push(" AND CAST(strftime('%Y', date) AS INTEGER) = ")
                    .push_bind(i64::from(year));
            }
        }

        if let Some(direction) = filter.subcategory {
            query.push(" AND subcategory = ").push_bind(direction);
        }

        query.push(" ORDER BY date DESC, id DESC");

        debug!(?period, subcategory = ?filter.subcategory, "Listing cash flow");

        let entries = query
            .build_query_as::<CashFlowEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Records an entry; a missing date means today.
    pub async fn create(&self, input: &CashFlowInput) -> DbResult<CashFlowEntry> {
        validate_cash_flow_input(input)?;

        let sql = format!(
            "INSERT INTO cash_flow (category, subcategory, amount_paise, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {CASH_FLOW_COLUMNS}"
        );

        let entry = sqlx::query_as::<_, CashFlowEntry>(&sql)
            .bind(input.category.trim())
            .bind(input.subcategory)
            .bind(input.amount)
            .bind(input.date.unwrap_or_else(|| Local::now().date_naive()))
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        info!(id = entry.id, direction = ?entry.subcategory, amount = %entry.amount, "Cash flow recorded");
        Ok(entry)
    }

    /// Overwrites an entry.
    pub async fn update(&self, id: i64, input: &CashFlowInput) -> DbResult<CashFlowEntry> {
        validate_cash_flow_input(input)?;

        let sql = format!(
            "UPDATE cash_flow
             SET category = ?2, subcategory = ?3, amount_paise = ?4,
                 date = COALESCE(?5, date), updated_at = ?6
             WHERE id = ?1
             RETURNING {CASH_FLOW_COLUMNS}"
        );

        let entry = sqlx::query_as::<_, CashFlowEntry>(&sql)
            .bind(id)
            .bind(input.category.trim())
            .bind(input.subcategory)
            .bind(input.amount)
            .bind(input.date)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Cash flow entry", id))?;

        info!(id, "Cash flow updated");
        Ok(entry)
    }

    /// Deletes an entry.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cash_flow WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cash flow entry", id));
        }

        info!(id, "Cash flow deleted");
        Ok(())
    }
}

// =============================================================================
// Profit & Loss
// =============================================================================

/// Repository for monthly profit & loss entries.
#[derive(Debug, Clone)]
pub struct ProfitLossRepository {
    pool: SqlitePool,
}

impl ProfitLossRepository {
    /// Creates a new ProfitLossRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProfitLossRepository { pool }
    }

    /// Lists entries, newest month first, optionally narrowed to one month
    /// and/or one type.
    pub async fn list(&self, filter: &PnlFilter) -> DbResult<Vec<PnlEntry>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PNL_COLUMNS} FROM profit_loss WHERE 1 = 1"));

        if let Some(month) = filter.month.as_deref() {
            query.push(" AND month = ").push_bind(month.trim().to_string());
        }
        if let Some(kind) = filter.kind {
            query.push(" AND type = ").push_bind(kind);
        }
        query.push(" ORDER BY month DESC, id DESC");

        let entries = query
            .build_query_as::<PnlEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    pub async fn create(&self, input: &PnlInput) -> DbResult<PnlEntry> {
        validate_pnl_input(input)?;

        let sql = format!(
            "INSERT INTO profit_loss (month, category, type, amount_paise, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {PNL_COLUMNS}"
        );

        let entry = sqlx::query_as::<_, PnlEntry>(&sql)
            .bind(&input.month)
            .bind(input.category.trim())
            .bind(input.kind)
            .bind(input.amount)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        info!(id = entry.id, month = %entry.month, kind = ?entry.kind, "P&L entry recorded");
        Ok(entry)
    }

    pub async fn update(&self, id: i64, input: &PnlInput) -> DbResult<PnlEntry> {
        validate_pnl_input(input)?;

        let sql = format!(
            "UPDATE profit_loss
             SET month = ?2, category = ?3, type = ?4, amount_paise = ?5, updated_at = ?6
             WHERE id = ?1
             RETURNING {PNL_COLUMNS}"
        );

        let entry = sqlx::query_as::<_, PnlEntry>(&sql)
            .bind(id)
            .bind(&input.month)
            .bind(input.category.trim())
            .bind(input.kind)
            .bind(input.amount)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("P&L entry", id))?;

        Ok(entry)
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM profit_loss WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("P&L entry", id));
        }

        Ok(())
    }
}
