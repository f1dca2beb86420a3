//! # Error Types
//!
//! Domain-specific error types for hisaab-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  hisaab-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  hisaab-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What the browser sees ({error, details})       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Browser      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No inventory item carries this code.
    ///
    /// ## When This Occurs
    /// - Recording a sale against an unknown code
    /// - Moving a sale to an unknown code on update
    /// - GST invoice line for an unknown code
    #[error("Item not found in inventory: {0}")]
    ItemNotFound(String),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    /// Insufficient stock to complete the sale.
    ///
    /// ## When This Occurs
    /// Only under `StockPolicy::Reject`.
    /// ```text
    /// RecordSale(code: "X1", qty: 15)
    ///      │
    ///      ▼
    /// Conditional decrement finds quantity = 12
    ///      │
    ///      ▼
    /// InsufficientStock { code: "X1", available: 12, requested: 15 }
    ///      │
    ///      ▼
    /// Transaction rolls back, sale row is discarded
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// An item with the same company/category/sub-category already exists.
    #[error("Item already exists: {company_name} | {category} | {sub_category}")]
    DuplicateItem {
        company_name: String,
        category: String,
        sub_category: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write happens, so no transaction is ever opened for
/// input that fails these checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., bad month, bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate username).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
