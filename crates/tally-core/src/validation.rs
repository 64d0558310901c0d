//! # Validation Module
//!
//! Input validation for values that arrive as free text or raw numbers from
//! the UI layer.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI (external)                                                │
//! │  ├── Input masks, immediate feedback                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Quantity text / buyer name / discount text                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: CartStore                                                    │
//! │  ├── Stock ceilings, discount bounds                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Backend                                                      │
//! │  └── Authoritative stock deduction                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{parse_discount_percent, validate_buyer_name};
//!
//! let name = validate_buyer_name("  Ayesha  ").unwrap();
//! assert_eq!(name, "Ayesha");
//!
//! let pct = parse_discount_percent("12.5").unwrap();
//! assert_eq!(pct.to_string(), "12.5%");
//! ```

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::DiscountPercent;
use crate::MAX_BUYER_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates the optional buyer name sent as `sold_to`.
///
/// ## Rules
/// - Surrounding whitespace is trimmed
/// - Empty is allowed (walk-in customer)
/// - At most [`MAX_BUYER_NAME_LEN`] characters
///
/// ## Returns
/// The trimmed name.
pub fn validate_buyer_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.chars().count() > MAX_BUYER_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "buyer name".to_string(),
            max: MAX_BUYER_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// Only the lower bound lives here; the upper bound is the stock ceiling the
/// cart checks against the inventory snapshot.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Parses a quantity typed into a line's quantity box.
///
/// ## User Workflow
/// ```text
/// Cashier types "3" in the quantity box
///      │
///      ▼
/// parse_quantity("3") ← THIS FUNCTION
///      │
///      ├── blank?              → Required
///      ├── not a whole number? → InvalidFormat
///      ├── < 1?                → OutOfRange
///      │
///      └── OK(3) → CartStore::set_quantity(id, 3)
/// ```
pub fn parse_quantity(input: &str) -> ValidationResult<i64> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::Required {
            field: "quantity".to_string(),
        });
    }

    let qty: i64 = input
        .parse()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "must be a whole number".to_string(),
        })?;
    validate_quantity(qty)?;
    Ok(qty)
}

/// Parses the discount box.
///
/// Blank input means no discount. Anything else must be a decimal in
/// `[0, 100]`.
pub fn parse_discount_percent(input: &str) -> ValidationResult<DiscountPercent> {
    let input = input.trim().trim_end_matches('%').trim();
    if input.is_empty() {
        return Ok(DiscountPercent::zero());
    }

    let value = Decimal::from_str(input).map_err(|_| ValidationError::InvalidFormat {
        field: "discount".to_string(),
        reason: "must be a number".to_string(),
    })?;

    DiscountPercent::new(value).map_err(|_| ValidationError::OutOfRange {
        field: "discount".to_string(),
        min: 0,
        max: crate::MAX_DISCOUNT_PERCENT as i64,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
