//! # Validation Module
//!
//! Input validation for every write hisaab performs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Browser form                                                 │
//! │  └── Required markers, numeric inputs                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Request parsing (serde)                                      │
//! │  └── Numbers or numeric strings, blanks become None                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                  │
//! │  └── Business rules, before any transaction is opened                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite                                                       │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (item code, username)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use chrono::NaiveDate;
//! use hisaab_core::types::SaleInput;
//! use hisaab_core::validation::validate_sale_input;
//!
//! let input = SaleInput {
//!     code: "X1".into(),
//!     company_name: Some("Acme".into()),
//!     quantity: Some(2),
//!     ..Default::default()
//! };
//! let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! let draft = validate_sale_input(input, today).unwrap();
//! assert_eq!(draft.date, today);
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::invoice::GstInvoiceRequest;
use crate::ledger::{CashFlowInput, CreditTransactionInput, InterestInput, PnlInput};
use crate::money::Money;
use crate::pricing::sale_total;
use crate::types::{ItemInput, Percentage, SaleDraft, SaleInput};
use crate::{MAX_AMOUNT, MAX_CODE_LEN, MAX_LINE_QUANTITY, MAX_TEXT_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an item code.
///
/// ## Rules
/// - Must not be blank
/// - At most 50 characters
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }

    if code.chars().count() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LEN,
        });
    }

    Ok(())
}

/// Validates a required free-text field.
pub fn validate_text(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(())
}

/// Validates a sale or invoice line quantity.
///
/// ## Rules
/// - Must be positive (no zero-quantity sales)
/// - At most [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount that may be zero but not negative.
///
/// ## Rules
/// - Not negative
/// - At most [`MAX_AMOUNT`]
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    check_max_amount(field, amount)
}

/// Validates an amount that must be strictly positive.
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    check_max_amount(field, amount)
}

fn check_max_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount > MAX_AMOUNT {
        return Err(amount_out_of_range(field));
    }
    Ok(())
}

/// Range error for an amount, bounds in rupees.
pub(crate) fn amount_out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: MAX_AMOUNT.rupees(),
    }
}

/// Validates a percentage is within 0-100%.
pub fn validate_percentage(field: &str, pct: Percentage) -> ValidationResult<()> {
    if pct > Percentage::FULL {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

/// Validates a `YYYY-MM` month.
///
/// ```rust
/// use hisaab_core::validation::validate_month;
///
/// assert!(validate_month("2024-03").is_ok());
/// assert!(validate_month("2024-3").is_err());
/// assert!(validate_month("2024-13").is_err());
/// ```
pub fn validate_month(month: &str) -> ValidationResult<()> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "month".to_string(),
        reason: reason.to_string(),
    };

    let (year, mm) = month.split_once('-').ok_or_else(|| invalid("expected YYYY-MM"))?;
    if year.len() != 4 || mm.len() != 2 {
        return Err(invalid("expected YYYY-MM"));
    }

    let _year: u32 = year.parse().map_err(|_| invalid("year is not a number"))?;
    let mm: u32 = mm.parse().map_err(|_| invalid("month is not a number"))?;
    if !(1..=12).contains(&mm) {
        return Err(invalid("month must be 01-12"));
    }

    Ok(())
}

/// Validates a username.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::required("username"));
    }
    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if username.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "only letters, digits, '.', '_' and '-' are allowed".to_string(),
        });
    }

    Ok(())
}

/// Validates a new password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a sale request and resolves it into a [`SaleDraft`].
///
/// ## Rules
/// - `company_name` and `quantity` are required (checked first, in that order)
/// - `code` is required
/// - prices and a supplied `total_amount` cannot be negative
/// - `discount` is at most 100%
///
/// A missing `date` becomes `today`; a missing `total_amount` is computed
/// with [`sale_total`].
pub fn validate_sale_input(input: SaleInput, today: NaiveDate) -> ValidationResult<SaleDraft> {
    let company_name = match input.company_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(ValidationError::required("company_name")),
    };

    let quantity = match input.quantity {
        Some(0) | None => return Err(ValidationError::required("quantity")),
        Some(q) => q,
    };
    validate_quantity(quantity)?;
    validate_code(&input.code)?;

    validate_amount("purchase_price", input.purchase_price)?;
    validate_amount("selling_price_mrp", input.selling_price_mrp)?;
    validate_percentage("discount", input.discount)?;

    let total_amount = match input.total_amount {
        Some(total) => {
            validate_amount("total_amount", total)?;
            total
        }
        None => sale_total(input.selling_price_mrp, quantity, input.discount)
            .ok_or_else(|| amount_out_of_range("total_amount"))?,
    };

    Ok(SaleDraft {
        date: input.date.unwrap_or(today),
        code: input.code.trim().to_string(),
        hsn_code: input.hsn_code,
        company_name,
        category: input.category,
        subcategory: input.subcategory,
        purchase_price: input.purchase_price,
        selling_price_mrp: input.selling_price_mrp,
        quantity,
        discount: input.discount,
        total_amount,
    })
}

/// Validates an item create/overwrite request.
pub fn validate_item_input(input: &ItemInput) -> ValidationResult<()> {
    validate_code(&input.code)?;
    validate_text("company_name", &input.company_name)?;
    validate_text("category", &input.category)?;

    if let Some(qty) = input.quantity {
        if qty < 0 {
            return Err(ValidationError::Negative {
                field: "quantity".to_string(),
            });
        }
    }

    validate_amount("purchase_price", input.purchase_price)?;
    validate_amount("selling_price_mrp", input.selling_price_mrp)?;
    validate_percentage("gst_rate", input.gst_rate)?;
    Ok(())
}

/// Validates a GST invoice request (before product lookup).
pub fn validate_invoice_request(request: &GstInvoiceRequest) -> ValidationResult<()> {
    validate_text("customer_details.name", &request.customer_details.name)?;

    if request.items.is_empty() {
        return Err(ValidationError::required("items"));
    }

    for line in &request.items {
        validate_code(&line.code)?;
        match line.quantity {
            Some(q) => validate_quantity(q)?,
            None => return Err(ValidationError::required("quantity")),
        }
        if let Some(taxable) = line.taxable_value {
            validate_amount("taxable_value", taxable)?;
        }
    }

    Ok(())
}

pub fn validate_cash_flow_input(input: &CashFlowInput) -> ValidationResult<()> {
    validate_text("category", &input.category)?;
    validate_positive_amount("amount", input.amount)
}

pub fn validate_pnl_input(input: &PnlInput) -> ValidationResult<()> {
    validate_month(&input.month)?;
    validate_text("category", &input.category)?;
    validate_positive_amount("amount", input.amount)
}

pub fn validate_credit_transaction(input: &CreditTransactionInput) -> ValidationResult<()> {
    validate_positive_amount("amount", input.amount)
}

pub fn validate_interest_input(input: &InterestInput) -> ValidationResult<i64> {
    validate_positive_amount("principal", input.principal)?;
    validate_percentage("interest_rate", input.interest_rate)?;

    match input.days {
        Some(days) if (1..=36_500).contains(&days) => Ok(days),
        Some(_) => Err(ValidationError::OutOfRange {
            field: "days".to_string(),
            min: 1,
            max: 36_500,
        }),
        None => Err(ValidationError::required("days")),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
