//! # hisaab-core: Pure Business Logic for hisaab
//!
//! Everything hisaab computes, with zero I/O: money, percentages, sale
//! totals, GST lines, interest, ledger summaries and input validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        hisaab Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser (React SPA)                          │   │
//! │  │   Inventory ── Sales entry ── GST invoice ── Ledgers ── Users   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    hisaab-api (axum)                            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ hisaab-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │ pricing │ │ invoice │ │ ledger  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                     validation · error · lenient               │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           hisaab-db (SQLite repositories, sale engine)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Inventory items, sale records, users, percentages
//! - [`money`] - Money in integer paise
//! - [`pricing`] - Sale totals, GST lines, simple interest
//! - [`invoice`] - GST invoice types and line pricing
//! - [`ledger`] - Cash flow, profit & loss, cash-credit account
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//! - [`lenient`] - Serde helpers for browser form payloads
//!
//! ## Example Usage
//!
//! ```rust
//! use hisaab_core::money::Money;
//! use hisaab_core::pricing::sale_total;
//! use hisaab_core::types::Percentage;
//!
//! // 10 units at ₹50, no discount
//! let total = sale_total(Money::from_rupees(50), 10, Percentage::zero()).unwrap();
//! assert_eq!(total.to_string(), "₹500.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod ledger;
pub mod lenient;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest item code accepted.
pub const MAX_CODE_LEN: usize = 50;

/// Longest free-text field accepted (names, categories, descriptions).
pub const MAX_TEXT_LEN: usize = 200;

/// Largest quantity on a single sale or invoice line.
///
/// ## Business Reason
/// Catches slips such as typing 10000 instead of 100 at the counter.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Largest single amount accepted on input (₹100 crore).
///
/// Keeps `MAX_AMOUNT × MAX_LINE_QUANTITY` well inside `i64` paise.
pub const MAX_AMOUNT: Money = Money::from_rupees(1_000_000_000);

/// Cash-credit limit used until one is saved (₹10,00,000).
pub const DEFAULT_ACCOUNT_LIMIT: Money = Money::from_rupees(1_000_000);
