//! # GST Invoices
//!
//! Invoice types and the pure pricing of invoice lines.
//!
//! ## Invoice Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GstInvoiceRequest { customer_details, items: [{code, quantity}] }      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  look up each code → GstProduct { mrp, gst, descriptive fields }        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  price_line() per item  ← pricing::gst_line                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  InvoiceTotals::from_lines()                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INV-15032024-03 stored with its lines (inventory untouched)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::money::Money;
use crate::pricing::gst_line;
use crate::types::Percentage;
use crate::validation::{amount_out_of_range, ValidationResult};

// =============================================================================
// Product Lookup
// =============================================================================

/// The slice of an inventory item the invoice screen needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GstProduct {
    pub code: String,
    pub hsn_code: Option<String>,
    pub company_name: String,
    pub category: String,
    pub subcategory: String,
    pub selling_price_mrp: Money,
    pub gst: Percentage,
}

impl GstProduct {
    /// `"company | category | subcategory"`, printed on the invoice.
    pub fn description(&self) -> String {
        format!("{} | {} | {}", self.company_name, self.category, self.subcategory)
    }
}

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub gstin: Option<String>,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceLineRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub quantity: Option<i64>,
    /// Manually keyed taxable value, overriding `unit_rate × quantity`.
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub taxable_value: Option<Money>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GstInvoiceRequest {
    #[serde(default)]
    pub customer_details: CustomerDetails,
    #[serde(default)]
    pub items: Vec<InvoiceLineRequest>,
    #[serde(default)]
    pub payment_mode: String,
    #[serde(default)]
    pub purchase_mode: String,
}

// =============================================================================
// Stored Invoice
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GstInvoiceLine {
    pub id: i64,
    pub invoice_id: i64,
    pub product_code: String,
    pub description: String,
    pub hsn_code: Option<String>,
    pub quantity: i64,
    /// Tax-exclusive unit rate.
    pub rate: Money,
    pub taxable_value: Money,
    pub gst_percent: Percentage,
    pub cgst: Money,
    pub sgst: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GstInvoice {
    pub id: i64,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_gstin: Option<String>,
    pub customer_phone: String,
    pub payment_mode: String,
    pub purchase_mode: String,
    pub subtotal: Money,
    pub total_tax: Money,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<GstInvoiceLine>,
}

// =============================================================================
// Pricing
// =============================================================================

/// An invoice line priced but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_code: String,
    pub description: String,
    pub hsn_code: Option<String>,
    pub quantity: i64,
    pub rate: Money,
    pub taxable_value: Money,
    pub gst_percent: Percentage,
    pub cgst: Money,
    pub sgst: Money,
    pub total: Money,
}

/// Prices `quantity` units of `product`.
///
/// A line whose total does not fit in `Money` is an `OutOfRange` error on
/// `total`.
pub fn price_line(
    product: &GstProduct,
    quantity: i64,
    manual_taxable: Option<Money>,
) -> ValidationResult<PricedLine> {
    let breakdown = gst_line(product.selling_price_mrp, product.gst, quantity, manual_taxable)
        .ok_or_else(|| amount_out_of_range("total"))?;

    Ok(PricedLine {
        product_code: product.code.clone(),
        description: product.description(),
        hsn_code: product.hsn_code.clone(),
        quantity,
        rate: breakdown.unit_rate,
        taxable_value: breakdown.taxable_value,
        gst_percent: product.gst,
        cgst: breakdown.cgst,
        sgst: breakdown.sgst,
        total: breakdown.total,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub total_tax: Money,
    pub total_amount: Money,
}

impl InvoiceTotals {
    /// Sums the lines, failing on `total_amount` if a sum overflows.
    pub fn from_lines(lines: &[PricedLine]) -> ValidationResult<Self> {
        let add = |acc: InvoiceTotals, line: &PricedLine| -> Option<InvoiceTotals> {
            Some(InvoiceTotals {
                subtotal: acc.subtotal.checked_add(line.taxable_value)?,
                total_tax: acc.total_tax.checked_add(line.cgst)?.checked_add(line.sgst)?,
                total_amount: acc.total_amount.checked_add(line.total)?,
            })
        };

        lines.iter().try_fold(InvoiceTotals::default(), |acc, line| {
            add(acc, line).ok_or_else(|| amount_out_of_range("total_amount"))
        })
    }
}

/// Formats an invoice number: `INV-DDMMYYYY-NN`, `NN` being the 1-based
/// sequence of the invoice within its day.
///
/// ```rust
/// use chrono::NaiveDate;
/// use hisaab_core::invoice::invoice_number;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert_eq!(invoice_number(day, 7), "INV-05032024-07");
/// ```
pub fn invoice_number(date: NaiveDate, sequence: u32) -> String {
    format!("{}{:02}", invoice_number_prefix(date), sequence)
}

/// The `INV-DDMMYYYY-` part shared by every invoice issued on `date`.
///
/// Storage appends the zero-padded sequence itself so that numbering and
/// insertion happen in one statement.
pub fn invoice_number_prefix(date: NaiveDate) -> String {
    format!("INV-{}-", date.format("%d%m%Y"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn product(code: &str, mrp_rupees: i64, gst_pct: u32) -> GstProduct {
        GstProduct {
            code: code.to_string(),
            hsn_code: Some("8482".to_string()),
            company_name: "SKF".to_string(),
            category: "Bearing".to_string(),
            subcategory: "6203".to_string(),
            selling_price_mrp: Money::from_rupees(mrp_rupees),
            gst: Percentage::from_percent(gst_pct),
        }
    }

    #[test]
    fn test_price_line_and_totals() {
        let a = price_line(&product("A", 118, 18), 2, None).unwrap();
        let b = price_line(&product("B", 100, 18), 3, None).unwrap();

        assert_eq!(a.description, "SKF | Bearing | 6203");
        assert_eq!(a.rate, Money::from_rupees(100));
        assert_eq!(a.total, Money::from_rupees(236));

        let totals = InvoiceTotals::from_lines(&[a, b]).unwrap();
        assert_eq!(totals.subtotal.paise(), 20000 + 25425);
        assert_eq!(totals.total_tax.paise(), 3600 + 4576);
        assert_eq!(totals.total_amount.paise(), 23600 + 30001);
    }

    #[test]
    fn test_line_too_large_to_price_is_rejected() {
        let mut expensive = product("A", 0, 0);
        expensive.selling_price_mrp = Money::from_paise(9_000_000_000_000_000_000);

        let err = price_line(&expensive, 2, None).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "total"));
    }

    #[test]
    fn test_totals_overflow_is_rejected() {
        let mut big = product("A", 0, 0);
        big.selling_price_mrp = Money::from_paise(5_000_000_000_000_000_000);
        let line = price_line(&big, 1, None).unwrap();

        let err = InvoiceTotals::from_lines(&[line.clone(), line]).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "total_amount"));
    }

    #[test]
    fn test_invoice_number_sequence_beyond_99() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(invoice_number(day, 1), "INV-31122024-01");
        assert_eq!(invoice_number(day, 120), "INV-31122024-120");
        assert!(invoice_number(day, 3).starts_with(&invoice_number_prefix(day)));
    }
}
