//! # Credit Repository
//!
//! The cash-credit account: bank transactions, saved interest calculations
//! and the account limit.
//!
//! ## Summary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transactions ──┐                                                       │
//! │  calculations ──┼──► CreditSummary::compute()  (hisaab-core)           │
//! │  account limit ─┘        outstanding, pending, available, usage        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Local, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use hisaab_core::ledger::{
    CreditSummary, CreditTransaction, CreditTransactionInput, InterestCalculation, InterestInput,
};
use hisaab_core::pricing::simple_interest;
use hisaab_core::validation::{
    validate_amount, validate_credit_transaction, validate_interest_input,
};
use hisaab_core::{Money, DEFAULT_ACCOUNT_LIMIT};

const TRANSACTION_COLUMNS: &str =
    "id, date, type AS kind, description, amount_paise AS amount, created_at";

const CALCULATION_COLUMNS: &str = "id, date, principal_paise AS principal, \
     interest_rate_bps AS interest_rate, days, \
     calculated_interest_paise AS calculated_interest, created_at";

/// `account_settings` key holding the limit, in paise.
const ACCOUNT_LIMIT_KEY: &str = "account_limit";

/// Repository for the cash-credit account.
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    /// Creates a new CreditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    /// Lists transactions, newest first.
    pub async fn list_transactions(&self) -> DbResult<Vec<CreditTransaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY date DESC, id DESC");

        let rows = sqlx::query_as::<_, CreditTransaction>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn create_transaction(
        &self,
        input: &CreditTransactionInput,
    ) -> DbResult<CreditTransaction> {
        validate_credit_transaction(input)?;

        let sql = format!(
            "INSERT INTO transactions (date, type, description, amount_paise, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {TRANSACTION_COLUMNS}"
        );

        let txn = sqlx::query_as::<_, CreditTransaction>(&sql)
            .bind(input.date.unwrap_or_else(|| Local::now().date_naive()))
            .bind(input.kind)
            .bind(input.description.as_deref().map(str::trim))
            .bind(input.amount)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        info!(id = txn.id, kind = ?txn.kind, amount = %txn.amount, "Credit transaction recorded");
        Ok(txn)
    }

    pub async fn delete_transaction(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Interest calculations
    // -------------------------------------------------------------------------

    /// Lists saved calculations, most recent first.
    pub async fn list_calculations(&self) -> DbResult<Vec<InterestCalculation>> {
        let sql = format!(
            "SELECT {CALCULATION_COLUMNS} FROM cash_credit_calculations ORDER BY created_at DESC, id DESC"
        );

        let rows = sqlx::query_as::<_, InterestCalculation>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Computes simple interest for `input` and saves the result.
    ///
    /// The client's own figure, if any, is ignored; the stored interest is
    /// always `principal × rate × days / 36500`.
    pub async fn create_calculation(&self, input: &InterestInput) -> DbResult<InterestCalculation> {
        let days = validate_interest_input(input)?;
        let interest = simple_interest(input.principal, input.interest_rate, days);

        let sql = format!(
            "INSERT INTO cash_credit_calculations (
                date, principal_paise, interest_rate_bps, days, calculated_interest_paise, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {CALCULATION_COLUMNS}"
        );

        let calc = sqlx::query_as::<_, InterestCalculation>(&sql)
            .bind(input.date.unwrap_or_else(|| Local::now().date_naive()))
            .bind(input.principal)
            .bind(input.interest_rate)
            .bind(days)
            .bind(interest)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        info!(id = calc.id, days, interest = %calc.calculated_interest, "Interest calculated");
        Ok(calc)
    }

    pub async fn delete_calculation(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cash_credit_calculations WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Calculation", id));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Account limit & summary
    // -------------------------------------------------------------------------

    /// The saved account limit, or [`DEFAULT_ACCOUNT_LIMIT`] if none was saved.
    pub async fn account_limit(&self) -> DbResult<Money> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT value FROM account_settings WHERE key = ?1")
                .bind(ACCOUNT_LIMIT_KEY)
                .fetch_optional(&self.pool)
                .await?;

        match stored {
            None => Ok(DEFAULT_ACCOUNT_LIMIT),
            Some(value) => value.parse::<i64>().map(Money::from_paise).map_err(|_| {
                warn!(value = %value, "Unreadable account limit setting");
                DbError::Internal(format!("invalid account limit setting: {value}"))
            }),
        }
    }

    /// Saves the account limit.
    pub async fn set_account_limit(&self, limit: Money) -> DbResult<Money> {
        validate_amount("limit", limit)?;

        sqlx::query(
            "INSERT INTO account_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(ACCOUNT_LIMIT_KEY)
        .bind(limit.paise().to_string())
        .execute(&self.pool)
        .await?;

        info!(limit = %limit, "Account limit saved");
        Ok(limit)
    }

    /// Dashboard figures over every transaction and calculation.
    pub async fn summary(&self) -> DbResult<CreditSummary> {
        let transactions = self.list_transactions().await?;
        let calculations = self.list_calculations().await?;
        let limit = self.account_limit().await?;

        Ok(CreditSummary::compute(&transactions, &calculations, limit))
    }
}
