//! # Money Module
//!
//! Provides the `Money` type for monetary values and `DiscountPercent` for the
//! cart-wide discount rule.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Every amount is a whole number of cents (i64).                       │
//! │    Decimals only exist at the wire boundary and in the discount         │
//! │    percent, and both are converted with explicit rounding.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Policy
//! Round-half-up to two decimal places. Amounts handled here are never
//! negative, so half-up and half-away-from-zero coincide.
//!
//! ## Usage
//! ```rust
//! use tally_core::money::{DiscountPercent, Money};
//!
//! let subtotal = Money::from_cents(10_000); // 100.00
//! let pct = DiscountPercent::from_whole(10).unwrap();
//! assert_eq!(subtotal.percent_of(pct).cents(), 1_000); // 10.00
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::CartError;
use crate::MAX_DISCOUNT_PERCENT;

// =============================================================================
// Money Type
// =============================================================================

/// Monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// InventoryItem.unit_price ──► CartLine.unit_price_snapshot ──► line total
///                                                                  │
///                      Totals.subtotal ◄───────────────────────────┘
///                           │
///                           ├──► Totals.discount_amount (percent_of)
///                           └──► Totals.total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
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
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity; `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_mul_quantity(3).unwrap().cents(), 897);
    /// assert!(Money::from_cents(i64::MAX).checked_mul_quantity(2).is_none());
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtracts `other`; `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts; `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Converts a wire decimal (major units) into Money.
    ///
    /// Sub-cent digits are rounded half-up. Returns `None` when the value does
    /// not fit in an i64 count of cents.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_decimal(Decimal::new(10995, 3)).unwrap(); // 10.995
    /// assert_eq!(price.cents(), 1100);
    /// ```
    pub fn from_decimal(value: Decimal) -> Option<Money> {
        value
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money)
    }

    /// Returns the value as a two-place decimal in major units.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns `round2(self × pct / 100)`.
    ///
    /// The whole amount is scaled once and rounded once, so applying the
    /// discount to a subtotal never compounds per-line rounding.
    pub fn percent_of(&self, pct: DiscountPercent) -> Money {
        let raw = Decimal::from(self.0) * pct.value() / Decimal::ONE_HUNDRED;
        let cents = raw
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(self.0);
        Money(cents)
    }
}

/// Shows the amount in major units with two decimals, e.g. `90.00`.
///
/// Currency symbols and localisation belong to the UI layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Discount Percent
// =============================================================================

/// Cart-wide discount percent, guaranteed to lie in `[0, 100]`.
///
/// Kept as an exact decimal so fractional percents such as `12.5` survive
/// without float error. Serialized as a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct DiscountPercent(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl DiscountPercent {
    /// Validates and wraps a percent value.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tally_core::money::DiscountPercent;
    ///
    /// assert!(DiscountPercent::new(Decimal::new(125, 1)).is_ok()); // 12.5%
    /// assert!(DiscountPercent::new(Decimal::new(-1, 0)).is_err());
    /// assert!(DiscountPercent::new(Decimal::new(101, 0)).is_err());
    /// ```
    pub fn new(percent: Decimal) -> Result<Self, CartError> {
        check_percent(percent)?;
        Ok(DiscountPercent(percent.normalize()))
    }

    /// Whole-number percent, e.g. `from_whole(10)` for 10%.
    pub fn from_whole(percent: u32) -> Result<Self, CartError> {
        Self::new(Decimal::from(percent))
    }

    /// No discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountPercent(Decimal::ZERO)
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for DiscountPercent {
    type Error = CartError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        DiscountPercent::new(value)
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Checks the `[0, 100]` bound on a raw percent.
pub(crate) fn check_percent(percent: Decimal) -> Result<(), CartError> {
    if (percent.is_sign_negative() && !percent.is_zero())
        || percent > Decimal::from(MAX_DISCOUNT_PERCENT)
    {
        return Err(CartError::InvalidDiscount { percent });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!(a.checked_add(b).unwrap().cents(), 1500);
        assert_eq!(a.checked_sub(b).unwrap().cents(), 500);
        assert_eq!(b.checked_mul_quantity(3).unwrap().cents(), 1500);

        let huge = Money::from_cents(10_000_000_000_000);
        assert!(huge.checked_mul_quantity(1_000_000).is_none());
        assert!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)).is_none());
    }

    #[test]
    fn test_from_decimal_rounds_half_up() {
        assert_eq!(Money::from_decimal(Decimal::new(5000, 2)).unwrap().cents(), 5000);
        assert_eq!(Money::from_decimal(Decimal::new(50, 0)).unwrap().cents(), 5000);
        assert_eq!(Money::from_decimal(Decimal::new(10005, 4)).unwrap().cents(), 100); // 1.0005
        assert_eq!(Money::from_decimal(Decimal::new(1005, 3)).unwrap().cents(), 101); // 1.005
        assert_eq!(Money::from_decimal(Decimal::new(1004, 3)).unwrap().cents(), 100); // 1.004
    }

    #[test]
    fn test_from_decimal_overflow_is_none() {
        assert!(Money::from_decimal(Decimal::MAX).is_none());
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Money::from_cents(9000).to_decimal(), Decimal::new(9000, 2));
        assert_eq!(Money::from_cents(9000).to_decimal().to_string(), "90.00");
    }

    #[test]
    fn test_percent_of() {
        let subtotal = Money::from_cents(10_000);
        assert_eq!(subtotal.percent_of(DiscountPercent::from_whole(10).unwrap()).cents(), 1_000);
        assert_eq!(subtotal.percent_of(DiscountPercent::zero()).cents(), 0);
        assert_eq!(subtotal.percent_of(DiscountPercent::from_whole(100).unwrap()).cents(), 10_000);
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // 0.05 × 50% = 0.025 → 0.03
        let amount = Money::from_cents(5);
        assert_eq!(amount.percent_of(DiscountPercent::from_whole(50).unwrap()).cents(), 3);

        // 33.33 × 12.5% = 4.166.. → 4.17
        let amount = Money::from_cents(3333);
        let pct = DiscountPercent::new(Decimal::new(125, 1)).unwrap();
        assert_eq!(amount.percent_of(pct).cents(), 417);
    }

    #[test]
    fn test_discount_percent_bounds() {
        assert!(DiscountPercent::new(Decimal::ZERO).is_ok());
        assert!(DiscountPercent::new(Decimal::from(100)).is_ok());
        assert!(DiscountPercent::new(Decimal::new(10001, 2)).is_err());
        assert!(matches!(
            DiscountPercent::new(Decimal::new(-1, 2)),
            Err(CartError::InvalidDiscount { .. })
        ));
    }

    #[test]
    fn test_discount_percent_serde() {
        let pct = DiscountPercent::new(Decimal::new(125, 1)).unwrap();
        assert_eq!(serde_json::to_string(&pct).unwrap(), "12.5");

        let parsed: DiscountPercent = serde_json::from_str("10").unwrap();
        assert_eq!(parsed, DiscountPercent::from_whole(10).unwrap());

        assert!(serde_json::from_str::<DiscountPercent>("150").is_err());
    }
}
