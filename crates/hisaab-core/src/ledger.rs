//! # Ledger Types
//!
//! Bookkeeping records that sit beside the inventory: the cash-flow book,
//! the monthly profit & loss book, and the cash-credit (overdraft) account.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Ledgers                                        │
//! │                                                                         │
//! │  Cash flow            Profit & loss          Cash-credit account        │
//! │  ─────────            ─────────────          ───────────────────        │
//! │  in-flow / out-flow   Income / Expense       withdrawal / deposit       │
//! │  by date              by month (YYYY-MM)     interest_bank / _us        │
//! │                                              + interest calculations    │
//! │                                              + account limit            │
//! │                                                   │                     │
//! │                                                   ▼                     │
//! │                                             CreditSummary               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These records do not touch inventory.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::money::Money;
use crate::types::Percentage;

// =============================================================================
// Cash Flow
// =============================================================================

/// Direction of a cash-flow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum FlowDirection {
    #[serde(rename = "in-flow")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "in-flow"))]
    InFlow,

    #[serde(rename = "out-flow")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "out-flow"))]
    OutFlow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashFlowEntry {
    pub id: i64,
    pub category: String,
    pub subcategory: FlowDirection,
    pub amount: Money,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CashFlowInput {
    #[serde(default)]
    pub category: String,
    pub subcategory: FlowDirection,
    pub amount: Money,
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub date: Option<NaiveDate>,
}

/// Query parameters of the cash-flow list screen.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowFilter {
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub filter_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub custom_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub month: Option<i64>,
    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub subcategory: Option<FlowDirection>,
}

/// The date restriction a [`CashFlowFilter`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodFilter {
    All,
    Day(NaiveDate),
    Range(NaiveDate, NaiveDate),
    /// Calendar month 1-12, in any year.
    Month(u32),
    Year(i32),
}

impl CashFlowFilter {
    /// Resolves the period. A filter type applies only when its parameters
    /// are present; anything else lists every date.
    pub fn period(&self) -> PeriodFilter {
        match self.filter_type.as_deref() {
            Some("single") => match self.custom_date {
                Some(day) => PeriodFilter::Day(day),
                None => PeriodFilter::All,
            },
            Some("range") => match (self.start_date, self.end_date) {
                (Some(start), Some(end)) => PeriodFilter::Range(start, end),
                _ => PeriodFilter::All,
            },
            Some("month") => match self.month.and_then(|m| u32::try_from(m).ok()) {
                Some(m) if (1..=12).contains(&m) => PeriodFilter::Month(m),
                _ => PeriodFilter::All,
            },
            Some("year") => match self.year.and_then(|y| i32::try_from(y).ok()) {
                Some(y) => PeriodFilter::Year(y),
                None => PeriodFilter::All,
            },
            _ => PeriodFilter::All,
        }
    }
}

// =============================================================================
// Profit & Loss
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum PnlKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PnlEntry {
    pub id: i64,
    /// `YYYY-MM`
    pub month: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: PnlKind,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PnlInput {
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type")]
    pub kind: PnlKind,
    pub amount: Money,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PnlFilter {
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub month: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::blank_as_none")]
    pub kind: Option<PnlKind>,
}

// =============================================================================
// Cash-Credit Account
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Withdrawal,
    Deposit,
    /// Interest charged by the bank.
    InterestBank,
    /// Interest paid by us.
    InterestUs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditTransaction {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditTransactionInput {
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub description: Option<String>,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InterestCalculation {
    pub id: i64,
    pub date: NaiveDate,
    pub principal: Money,
    pub interest_rate: Percentage,
    pub days: i64,
    pub calculated_interest: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterestInput {
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub date: Option<NaiveDate>,
    pub principal: Money,
    pub interest_rate: Percentage,
    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub days: Option<i64>,
}

/// Dashboard figures for the cash-credit account.
///
/// ```text
/// outstanding      = -(withdrawals + interest_bank - interest_us - deposits)
/// pending_deposits = withdrawals - deposits
/// pending_interest = interest_bank - interest_us
/// available        = limit - |outstanding|
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditSummary {
    pub withdrawals: Money,
    pub deposits: Money,
    pub interest_bank: Money,
    pub interest_us: Money,
    pub outstanding: Money,
    pub pending_deposits: Money,
    pub pending_interest: Money,
    pub calculated_interest: Money,
    pub account_limit: Money,
    pub available: Money,
    /// Share of the limit in use, as a percentage.
    pub usage: Percentage,
}

impl CreditSummary {
    pub fn compute(
        transactions: &[CreditTransaction],
        calculations: &[InterestCalculation],
        account_limit: Money,
    ) -> Self {
        let total_of = |kind: TransactionKind| -> Money {
            transactions
                .iter()
                .filter(|t| t.kind == kind)
                .map(|t| t.amount)
                .sum()
        };

        let withdrawals = total_of(TransactionKind::Withdrawal);
        let deposits = total_of(TransactionKind::Deposit);
        let interest_bank = total_of(TransactionKind::InterestBank);
        let interest_us = total_of(TransactionKind::InterestUs);

        let outstanding = -(withdrawals + interest_bank - interest_us - deposits);
        let used = outstanding.abs();

        let usage = if account_limit.is_positive() {
            let bps = used.paise() as i128 * 10_000 / account_limit.paise() as i128;
            Percentage::from_bps(u32::try_from(bps).unwrap_or(u32::MAX))
        } else {
            Percentage::zero()
        };

        CreditSummary {
            withdrawals,
            deposits,
            interest_bank,
            interest_us,
            outstanding,
            pending_deposits: withdrawals - deposits,
            pending_interest: interest_bank - interest_us,
            calculated_interest: calculations.iter().map(|c| c.calculated_interest).sum(),
            account_limit,
            available: account_limit - used,
            usage,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(kind: TransactionKind, rupees: i64) -> CreditTransaction {
        CreditTransaction {
            id: 0,
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            kind,
            description: None,
            amount: Money::from_rupees(rupees),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_credit_summary() {
        let txns = vec![
            txn(TransactionKind::Withdrawal, 300_000),
            txn(TransactionKind::Withdrawal, 200_000),
            txn(TransactionKind::Deposit, 100_000),
            txn(TransactionKind::InterestBank, 5_000),
            txn(TransactionKind::InterestUs, 2_000),
        ];

        let summary = CreditSummary::compute(&txns, &[], Money::from_rupees(1_000_000));

        assert_eq!(summary.withdrawals, Money::from_rupees(500_000));
        assert_eq!(summary.outstanding, Money::from_rupees(-403_000));
        assert_eq!(summary.pending_deposits, Money::from_rupees(400_000));
        assert_eq!(summary.pending_interest, Money::from_rupees(3_000));
        assert_eq!(summary.available, Money::from_rupees(597_000));
        assert_eq!(summary.usage.bps(), 4030);
    }

    #[test]
    fn test_credit_summary_zero_limit() {
        let summary = CreditSummary::compute(&[], &[], Money::zero());
        assert!(summary.usage.is_zero());
        assert!(summary.outstanding.is_zero());
    }

    #[test]
    fn test_transaction_kind_wire_names() {
        let kind: TransactionKind = serde_json::from_str("\"interest_bank\"").unwrap();
        assert_eq!(kind, TransactionKind::InterestBank);

        let dir: FlowDirection = serde_json::from_str("\"out-flow\"").unwrap();
        assert_eq!(dir, FlowDirection::OutFlow);
    }

    #[test]
    fn test_cash_flow_period_requires_parameters() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        let filter = CashFlowFilter {
            filter_type: Some("single".into()),
            custom_date: Some(day),
            ..Default::default()
        };
        assert_eq!(filter.period(), PeriodFilter::Day(day));

        let filter = CashFlowFilter {
            filter_type: Some("range".into()),
            start_date: Some(day),
            ..Default::default()
        };
        assert_eq!(filter.period(), PeriodFilter::All);

        let filter = CashFlowFilter {
            filter_type: Some("month".into()),
            month: Some(13),
            ..Default::default()
        };
        assert_eq!(filter.period(), PeriodFilter::All);

        let filter = CashFlowFilter {
            filter_type: Some("year".into()),
            year: Some(2024),
            ..Default::default()
        };
        assert_eq!(filter.period(), PeriodFilter::Year(2024));
    }
}
