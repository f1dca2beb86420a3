//! # Pricing Arithmetic
//!
//! Derived totals shared by the sale engine, GST invoicing and the interest
//! calculator. Every result is rounded half-up to the paisa.
//!
//! ## Formulas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SALE TOTAL                                                             │
//! │    total = quantity × mrp × (1 − discount/100)                          │
//! │                                                                         │
//! │  GST LINE (MRP is tax inclusive)                                        │
//! │    unit_rate = mrp / (1 + gst/100)          ← rounded                   │
//! │    taxable   = unit_rate × quantity         (or a manual override)     │
//! │    cgst      = sgst = taxable × gst / 200   ← rounded                   │
//! │    total     = taxable + cgst + sgst                                    │
//! │                                                                         │
//! │  SIMPLE INTEREST                                                        │
//! │    interest  = principal × rate × days / 36500                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Intermediate products are computed in i128 and narrowed back with a
//! checked conversion. A result that does not fit in `Money` comes back as
//! `None` instead of wrapping.

use serde::Serialize;

use crate::money::{div_round_half_up, Money};
use crate::types::Percentage;

// =============================================================================
// Sale Total
// =============================================================================

/// Computes the total of a sale line.
///
/// ## Example
/// ```rust
/// use hisaab_core::money::Money;
/// use hisaab_core::pricing::sale_total;
/// use hisaab_core::types::Percentage;
///
/// // 10 × ₹50 with no discount
/// let total = sale_total(Money::from_rupees(50), 10, Percentage::zero());
/// assert_eq!(total.map(|t| t.paise()), Some(50000));
/// ```
pub fn sale_total(mrp: Money, quantity: i64, discount: Percentage) -> Option<Money> {
    let keep_bps = 10_000_i128 - discount.bps() as i128;
    let scaled = quantity as i128 * mrp.paise() as i128 * keep_bps;
    narrow(div_round_half_up(scaled, 10_000))
}

/// Converts an i128 paise value back to `Money`.
fn narrow(paise: i128) -> Option<Money> {
    i64::try_from(paise).ok().map(Money::from_paise)
}

// =============================================================================
// GST Line
// =============================================================================

/// Tax breakdown of one invoice line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GstBreakdown {
    /// Tax-exclusive price per unit.
    pub unit_rate: Money,
    pub taxable_value: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub total: Money,
}

impl GstBreakdown {
    /// CGST plus SGST.
    pub fn total_tax(&self) -> Money {
        self.cgst + self.sgst
    }
}

/// Back-calculates the tax-exclusive unit rate from a tax-inclusive MRP.
///
/// `mrp / (1 + gst/100)` is `mrp × 10000 / (10000 + bps)`.
pub fn unit_rate_from_mrp(mrp: Money, gst_rate: Percentage) -> Money {
    let num = mrp.paise() as i128 * 10_000;
    let den = 10_000_i128 + gst_rate.bps() as i128;
    // den >= 10000, so the rate never exceeds the MRP
    Money::from_paise(div_round_half_up(num, den) as i64)
}

/// Computes the GST breakdown for `quantity` units at a tax-inclusive MRP.
///
/// `manual_taxable` replaces the computed taxable value when the billing
/// clerk keys one in; the tax split is then taken from that value.
///
/// ## Example
/// ```rust
/// use hisaab_core::money::Money;
/// use hisaab_core::pricing::gst_line;
/// use hisaab_core::types::Percentage;
///
/// let line = gst_line(Money::from_rupees(118), Percentage::from_percent(18), 2, None).unwrap();
/// assert_eq!(line.taxable_value, Money::from_rupees(200));
/// assert_eq!(line.cgst, Money::from_rupees(18));
/// assert_eq!(line.total, Money::from_rupees(236));
/// ```
pub fn gst_line(
    mrp: Money,
    gst_rate: Percentage,
    quantity: i64,
    manual_taxable: Option<Money>,
) -> Option<GstBreakdown> {
    let unit_rate = unit_rate_from_mrp(mrp, gst_rate);
    let taxable_value = match manual_taxable {
        Some(taxable) => taxable,
        None => unit_rate.checked_multiply_quantity(quantity)?,
    };

    // taxable × gst / 200 == taxable × bps / 20000
    let cgst = narrow(div_round_half_up(
        taxable_value.paise() as i128 * gst_rate.bps() as i128,
        20_000,
    ))?;
    let sgst = cgst;
    let total = taxable_value.checked_add(cgst)?.checked_add(sgst)?;

    Some(GstBreakdown {
        unit_rate,
        taxable_value,
        cgst,
        sgst,
        total,
    })
}

// =============================================================================
// Interest
// =============================================================================

/// Simple interest on a cash-credit balance for a number of days.
///
/// `principal × rate% × days / 36500`, i.e. a 365-day year.
pub fn simple_interest(principal: Money, rate: Percentage, days: i64) -> Money {
    let num = principal.paise() as i128 * rate.bps() as i128 * days as i128;
    // rate is in bps, so 36500 × 100
    Money::from_paise(div_round_half_up(num, 3_650_000) as i64)
}

// =============================================================================
// Unit Tests
// =============================================================================
