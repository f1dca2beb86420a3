//! # Money Module
//!
//! Provides the `Money` type for rupee amounts.
//!
//! ## Why Integer Paise?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A sale of 3 × ₹99.99 at 12.5% discount:                                │
//! │    299.97 × 0.875 = 262.47374999999997 → rounds to 262.47 by accident   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    29997 × 8750 = 262473750 / 10000 = 26247.375 → 26247 (half-up)       │
//! │    Every rounding step is explicit and exact                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Amounts travel as plain rupee numbers (`500.0`, `84.75`). The browser
//! forms post numeric strings (`"84.75"`), so deserialization accepts both
//! and rounds the decimal text half-up to paise without going through `f64`
//! arithmetic.
//!
//! ## Usage
//! ```rust
//! use hisaab_core::money::Money;
//!
//! let price = Money::from_paise(5000); // ₹50.00
//! let line = price.checked_multiply_quantity(10).unwrap();
//! assert_eq!(line.paise(), 50000);
//! assert_eq!(line.to_string(), "₹500.00");
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::Percentage;

// =============================================================================
// Money Type
// =============================================================================

/// A rupee amount held in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: ledgers carry negative balances (outstanding credit)
/// - **Single field tuple struct**: stored as a plain INTEGER column
/// - **Serde**: rupee numbers on the wire, paise everywhere else
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ## Example
    /// ```rust
    /// use hisaab_core::money::Money;
    ///
    /// let price = Money::from_paise(1099); // ₹10.99
    /// assert_eq!(price.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    ///
    /// ## Example
    /// ```rust
    /// use hisaab_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(-550).paise_part(), 50);
    /// ```
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Rupee value as a float, for JSON output only.
    #[inline]
    pub fn as_rupees_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns `rate` percent of this amount, rounded half-up to the paisa.
    ///
    /// ## Implementation
    /// `(amount * bps + 5000) / 10000` in i128, mirrored for negatives.
    ///
    /// ## Example
    /// ```rust
    /// use hisaab_core::money::Money;
    /// use hisaab_core::types::Percentage;
    ///
    /// let taxable = Money::from_paise(25425);   // ₹254.25
    /// let half_gst = Percentage::from_bps(900); // 9%
    /// assert_eq!(taxable.percentage_of(half_gst).paise(), 2288); // ₹22.88
    /// ```
    pub fn percentage_of(&self, rate: Percentage) -> Money {
        let scaled = self.0 as i128 * rate.bps() as i128;
        Money::from_paise(div_round_half_up(scaled, 10_000) as i64)
    }

    /// Multiplies money by a quantity, `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use hisaab_core::money::Money;
    /// use hisaab_core::types::Percentage;
    ///
    /// let subtotal = Money::from_paise(10000); // ₹100.00
    /// let discounted = subtotal.apply_percentage_discount(Percentage::from_bps(1000));
    /// assert_eq!(discounted.paise(), 9000);
    /// ```
    pub fn apply_percentage_discount(&self, discount: Percentage) -> Money {
        *self - self.percentage_of(discount)
    }
}

// =============================================================================
// Decimal Parsing
// =============================================================================

/// Integer division rounding half away from zero.
///
/// `den` must be positive.
pub(crate) fn div_round_half_up(num: i128, den: i128) -> i128 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        -((-num + den / 2) / den)
    }
}

/// Parses a decimal string into an integer scaled by `10^scale`, rounding
/// extra fraction digits half-up.
///
/// ```text
/// parse_scaled("84.745", 2) → Some(8475)
/// parse_scaled("-5.5", 2)   → Some(-550)
/// parse_scaled("12", 2)     → Some(1200)
/// parse_scaled("1e3", 2)    → None
/// ```
pub(crate) fn parse_scaled(input: &str, scale: u32) -> Option<i64> {
    let s = input.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut value: i128 = 0;
    for b in whole.bytes() {
        value = value.checked_mul(10)?.checked_add((b - b'0') as i128)?;
    }

    let frac = frac.as_bytes();
    for i in 0..scale as usize {
        let digit = frac.get(i).map(|b| (b - b'0') as i128).unwrap_or(0);
        value = value.checked_mul(10)?.checked_add(digit)?;
    }
    if let Some(next) = frac.get(scale as usize) {
        if *next >= b'5' {
            value = value.checked_add(1)?;
        }
    }

    let value = if negative { -value } else { value };
    i64::try_from(value).ok()
}

/// Serde visitor that accepts a JSON number or numeric string and yields
/// the value scaled by `10^scale`.
pub(crate) struct ScaledVisitor {
    pub(crate) scale: u32,
    pub(crate) expecting: &'static str,
}

impl<'de> Visitor<'de> for ScaledVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.expecting)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        v.checked_mul(10_i64.pow(self.scale))
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        let v = i64::try_from(v).map_err(|_| E::custom("amount out of range"))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        // Display of f64 is the shortest text that round-trips, so
        // 84.745 is rounded as written rather than as 84.74499999...
        parse_scaled(&v.to_string(), self.scale).ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        if v.trim().is_empty() {
            return Ok(0);
        }
        parse_scaled(v, self.scale)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_rupees_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(ScaledVisitor {
                scale: 2,
                expecting: "a rupee amount as a number or numeric string",
            })
            .map(Money)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    /// Parses a rupee amount such as `"1250.50"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s, 2)
            .map(Money)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: format!("'{}' is not a rupee amount", s),
            })
    }
}

/// Displays as `₹10.99`. Debug aid; the UI formats its own strings.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
