//! # tally-core: Pure Business Logic for Tally POS
//!
//! This crate is the **heart** of the POS client. It stages purchase lines
//! against an inventory snapshot and prices them, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI layer (external)                          │   │
//! │  │    Search ──► Cart ──► Discount ──► Complete Sale               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               tally-client (PosSession, SaleSubmitter)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │  pricing  │  │   │
//! │  │   │ Inventory │  │   Money   │  │ CartStore │  │  Totals   │  │   │
//! │  │   │  Receipt  │  │ Discount  │  │ CartLine  │  │  compute  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryItem, CartLine, SaleReceipt, ...)
//! - [`money`] - Money type with integer arithmetic and the discount percent
//! - [`pricing`] - Subtotal / discount / total computation
//! - [`cart`] - The mutable cart with stock ceilings
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tally_core::{CartStore, DiscountPercent, InventoryItem, InventorySnapshot, Money};
//!
//! let coffee = InventoryItem {
//!     id: 7,
//!     name: "Coffee Beans 250g".into(),
//!     sku: "COF-250".into(),
//!     unit_price: Money::from_cents(5000),
//!     quantity_available: 10,
//!     min_stock_threshold: 2,
//! };
//! let inventory = Arc::new(InventorySnapshot::new(vec![coffee.clone()]));
//! let mut cart = CartStore::new(inventory);
//!
//! cart.add_item(&coffee).unwrap();
//! cart.add_item(&coffee).unwrap();
//! let totals = cart
//!     .set_discount_percent(DiscountPercent::from_whole(10).unwrap())
//!     .unwrap();
//!
//! assert_eq!(totals.subtotal.cents(), 10_000);
//! assert_eq!(totals.discount_amount.cents(), 1_000);
//! assert_eq!(totals.total.cents(), 9_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartSnapshot, CartStore};
pub use error::{CartError, CartResult, ValidationError};
pub use money::{DiscountPercent, Money};
pub use pricing::{compute, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Upper bound for a discount percent (inclusive).
pub const MAX_DISCOUNT_PERCENT: u32 = 100;

/// Maximum length of the free-text buyer name sent as `sold_to`.
pub const MAX_BUYER_NAME_LEN: usize = 120;
