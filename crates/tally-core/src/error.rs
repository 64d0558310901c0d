//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CartError        - Cart mutation / pricing rule violations        │
//! │  └── ValidationError  - Input field validation failures                │
//! │                                                                         │
//! │  tally-client errors (separate crate)                                  │
//! │  ├── SubmitError      - Checkout failures (network, rejection, ...)    │
//! │  └── ClientError      - Config, inventory loading                      │
//! │                                                                         │
//! │  Flow: ValidationError → CartError → SubmitError → UI message          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart errors are returned, never panicked: a rejected mutation leaves the
//! cart exactly as it was so the UI can show a specific message.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::ProductId;

// =============================================================================
// Cart Error
// =============================================================================

/// Rejected cart mutation or pricing request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Requested quantity is above the stock observed in the inventory snapshot.
    ///
    /// ## User Workflow
    /// ```text
    /// Tap "+" on a line (qty 10, stock 10)
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 7, available: 10, requested: 11 }
    ///      │
    ///      ▼
    /// UI shows: "Insufficient stock" and the line stays at 10
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// Quantity below 1.
    #[error("Invalid quantity {requested}: must be at least 1")]
    InvalidQuantity { requested: i64 },

    /// Discount percent outside [0, 100].
    #[error("Invalid discount {percent}%: must be between 0 and 100")]
    InvalidDiscount { percent: Decimal },

    /// The product has no line in the cart.
    #[error("Product {0} is not in the cart")]
    LineNotFound(ProductId),

    /// The product is not part of the session inventory snapshot.
    #[error("Product {0} is not in the inventory snapshot")]
    UnknownProduct(ProductId),

    /// A line total, the subtotal or the item count does not fit in an i64.
    #[error("Cart amount out of range")]
    AmountOverflow,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CartError {
    /// Short message suitable for a toast.
    pub fn user_message(&self) -> &'static str {
        match self {
            CartError::InsufficientStock { .. } => "Insufficient stock",
            CartError::InvalidQuantity { .. } => "Quantity must be at least 1",
            CartError::InvalidDiscount { .. } => "Discount must be between 0 and 100",
            CartError::LineNotFound(_) => "Item is no longer in the cart",
            CartError::UnknownProduct(_) => "Product is not available",
            CartError::AmountOverflow => "Cart total is too large",
            CartError::Validation(_) => "Invalid input",
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., unparseable decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CartError.
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================
