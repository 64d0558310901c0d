//! # Pricing Engine
//!
//! Pure computation of cart totals.
//!
//! ## Formula
//! ```text
//! subtotal        = Σ (unit_price_snapshot × requested_quantity)
//! discount_amount = round2(subtotal × discount_percent / 100)
//! total           = subtotal − discount_amount
//! ```
//!
//! The discount is taken once from the whole subtotal, never per line, so
//! rounding error cannot accumulate across lines. Totals are always derived
//! from the lines; nothing here keeps state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CartError, CartResult};
use crate::money::{DiscountPercent, Money};
use crate::types::CartLine;

/// Derived cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
}

/// Computes totals for a set of lines under a discount percent.
///
/// ## Errors
/// - `InvalidDiscount` when the percent is outside `[0, 100]`
/// - `AmountOverflow` when a line total, the subtotal or the item count does
///   not fit in an i64
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use tally_core::pricing::compute;
///
/// let totals = compute(&[], Decimal::from(10)).unwrap();
/// assert!(totals.total.is_zero());
/// assert!(compute(&[], Decimal::from(101)).is_err());
/// ```
pub fn compute(lines: &[CartLine], discount_percent: Decimal) -> CartResult<Totals> {
    let pct = DiscountPercent::new(discount_percent)?;
    compute_with(lines, pct)
}

/// Same as [`compute`] for an already-validated percent.
pub fn compute_with(lines: &[CartLine], discount: DiscountPercent) -> CartResult<Totals> {
    let mut subtotal = Money::zero();
    let mut total_quantity: i64 = 0;
    for line in lines {
        subtotal = line
            .line_total()
            .and_then(|amount| subtotal.checked_add(amount))
            .ok_or(CartError::AmountOverflow)?;
        total_quantity = total_quantity
            .checked_add(line.requested_quantity)
            .ok_or(CartError::AmountOverflow)?;
    }

    let discount_amount = subtotal.percent_of(discount);
    let total = subtotal
        .checked_sub(discount_amount)
        .ok_or(CartError::AmountOverflow)?;

    Ok(Totals {
        line_count: lines.len(),
        total_quantity,
        subtotal,
        discount_amount,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
