//! # Domain Types
//!
//! Inventory and sales types shared by every layer of hisaab.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐        code        ┌──────────────────┐          │
//! │  │  InventoryItem   │◄───────────────────│   SaleRecord     │          │
//! │  │  ──────────────  │  (logical, no FK)  │  ──────────────  │          │
//! │  │  id (surrogate)  │                    │  id (surrogate)  │          │
//! │  │  code (business) │                    │  code            │          │
//! │  │  quantity        │                    │  quantity        │          │
//! │  │  selling_price   │                    │  snapshot fields │          │
//! │  │  gst_rate        │                    │  total_amount    │          │
//! │  └──────────────────┘                    └──────────────────┘          │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │   Percentage     │   │   StockPolicy    │   │      User        │    │
//! │  │  bps (u32)       │   │  Reject          │   │  id, username    │    │
//! │  │  1800 = 18%      │   │  Backorder       │   │  email           │    │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Items have a surrogate `id` (used by the edit/delete screens) and a
//! business `code` (used by sales). Sales join to items by `code` only.
//!
//! ## Snapshot-on-Write
//! A [`SaleRecord`] copies the item's descriptive fields and prices at the
//! moment of sale, so a sale stays readable after its item is edited or
//! deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::lenient;
use crate::money::{Money, ScaledVisitor};

// =============================================================================
// Percentage
// =============================================================================

/// A percentage held in basis points (1 bps = 0.01%).
///
/// Used for GST rates, sale discounts and interest rates. On the wire it is
/// the plain percent figure: `18` means 18%, `12.5` means 12.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Percentage(u32);

impl Percentage {
    /// One hundred percent.
    pub const FULL: Percentage = Percentage(10_000);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a percentage from a whole percent figure (`18` → 18%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        Percentage(pct * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percent figure (for display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Half of this rate, as used for the CGST/SGST split.
    #[inline]
    pub const fn half(&self) -> Self {
        Percentage(self.0 / 2)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.percent())
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bps = deserializer.deserialize_any(ScaledVisitor {
            scale: 2,
            expecting: "a percentage as a number or numeric string",
        })?;
        u32::try_from(bps)
            .map(Percentage)
            .map_err(|_| serde::de::Error::custom("percentage cannot be negative"))
    }
}

// =============================================================================
// Stock Policy
// =============================================================================

/// What happens when a sale asks for more units than are in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Refuse the sale; stock never goes below zero.
    #[default]
    Reject,
    /// Accept the sale and let stock go negative (units owed to customers).
    Backorder,
}

impl StockPolicy {
    #[inline]
    pub const fn allows_negative(&self) -> bool {
        matches!(self, StockPolicy::Backorder)
    }
}

// =============================================================================
// Inventory Item
// =============================================================================

/// One stock record per item code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryItem {
    /// Surrogate key.
    pub id: i64,

    /// Business key; sales reference this.
    pub code: String,

    pub hsn_code: Option<String>,
    pub company_name: String,
    pub category: String,
    pub sub_category: String,

    /// Units on hand. Negative only under [`StockPolicy::Backorder`].
    pub quantity: i64,

    pub purchase_price: Money,

    /// GST-inclusive sticker price.
    pub selling_price_mrp: Money,

    pub gst_rate: Percentage,
    pub rack_no: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or overwriting an item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub code: String,

    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub hsn_code: Option<String>,

    #[serde(default)]
    pub company_name: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub sub_category: String,

    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub quantity: Option<i64>,

    #[serde(default)]
    pub purchase_price: Money,

    #[serde(default)]
    pub selling_price_mrp: Money,

    #[serde(default)]
    pub gst_rate: Percentage,

    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub rack_no: Option<String>,
}

// =============================================================================
// Sale Record
// =============================================================================

/// One sale transaction against one item code.
///
/// While a record exists, the inventory effect it has applied to its item is
/// exactly `-quantity`. Deleting it restores `+quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub code: String,
    pub hsn_code: Option<String>,
    pub company_name: String,
    pub category: String,
    pub subcategory: String,
    pub purchase_price: Money,
    pub selling_price_mrp: Money,
    pub quantity: i64,
    pub discount: Percentage,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for recording or replacing a sale.
///
/// Everything is optional at this stage so that a missing `company_name`
/// or `quantity` surfaces as a validation error instead of a parse error.
/// See [`crate::validation::validate_sale_input`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleInput {
    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub code: String,

    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub hsn_code: Option<String>,

    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub company_name: Option<String>,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub subcategory: String,

    #[serde(default)]
    pub purchase_price: Money,

    #[serde(default)]
    pub selling_price_mrp: Money,

    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub quantity: Option<i64>,

    #[serde(default)]
    pub discount: Percentage,

    #[serde(default, deserialize_with = "lenient::blank_as_none")]
    pub total_amount: Option<Money>,
}

/// A validated sale, ready to be written.
///
/// Produced only by [`crate::validation::validate_sale_input`]; every
/// field is present and `total_amount` is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub date: NaiveDate,
    pub code: String,
    pub hsn_code: Option<String>,
    pub company_name: String,
    pub category: String,
    pub subcategory: String,
    pub purchase_price: Money,
    pub selling_price_mrp: Money,
    pub quantity: i64,
    pub discount: Percentage,
    pub total_amount: Money,
}

// =============================================================================
// User
// =============================================================================

/// A back-office login. The password hash never leaves the db crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_wire_format() {
        let p: Percentage = serde_json::from_str("18").unwrap();
        assert_eq!(p.bps(), 1800);

        let p: Percentage = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(p.bps(), 1250);

        assert_eq!(serde_json::to_string(&Percentage::from_bps(1250)).unwrap(), "12.5");
        assert!(serde_json::from_str::<Percentage>("-5").is_err());
    }

    #[test]
    fn test_percentage_display_and_half() {
        assert_eq!(Percentage::from_percent(18).to_string(), "18%");
        assert_eq!(Percentage::from_bps(1250).to_string(), "12.50%");
        assert_eq!(Percentage::from_percent(18).half().bps(), 900);
    }

    #[test]
    fn test_stock_policy() {
        assert_eq!(StockPolicy::default(), StockPolicy::Reject);
        assert!(!StockPolicy::Reject.allows_negative());
        assert!(StockPolicy::Backorder.allows_negative());
    }

    #[test]
    fn test_sale_input_from_form_strings() {
        let input: SaleInput = serde_json::from_str(
            r#"{
                "date": "2024-03-15",
                "code": "X1",
                "hsn_code": "",
                "company_name": "Acme",
                "category": "Bearings",
                "subcategory": "6203",
                "purchase_price": "40",
                "selling_price_mrp": "50",
                "quantity": "10",
                "discount": "0",
                "total_amount": "500.00"
            }"#,
        )
        .unwrap();

        assert_eq!(input.quantity, Some(10));
        assert_eq!(input.hsn_code, None);
        assert_eq!(input.selling_price_mrp.paise(), 5000);
        assert_eq!(input.total_amount, Some(Money::from_rupees(500)));
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2024, 3, 15));
    }

    #[test]
    fn test_item_input_defaults() {
        let input: ItemInput =
            serde_json::from_str(r#"{"code": "A1", "company_name": "Acme"}"#).unwrap();
        assert_eq!(input.quantity, None);
        assert!(input.gst_rate.is_zero());
        assert!(input.selling_price_mrp.is_zero());
    }
}
