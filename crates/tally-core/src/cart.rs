//! # Cart Store
//!
//! The mutable set of staged purchase lines for one POS session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action              CartStore                 Result                │
//! │  ─────────              ─────────                 ──────                │
//! │                                                                         │
//! │  Tap product ─────────► add_item() ─────────────► +1 or new line       │
//! │  Type quantity ───────► set_quantity() ─────────► qty = n              │
//! │  Tap + / − ───────────► increment() / decrement()                      │
//! │  Tap remove ──────────► remove_item() ──────────► line gone            │
//! │  Type discount ───────► set_discount_percent()                         │
//! │  Sale confirmed ──────► clear() ────────────────► empty, 0% discount   │
//! │                                                                         │
//! │  Every mutation returns freshly computed Totals.                        │
//! │  A rejected mutation leaves the cart exactly as it was.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` and keep insertion order
//! - `1 ≤ requested_quantity ≤ quantity_available` as seen in the snapshot
//! - Discount percent is always within `[0, 100]`
//! - Totals are derived on demand and never cached
//! - Every committed state prices without overflowing i64 cents

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{CartError, CartResult};
use crate::money::DiscountPercent;
use crate::pricing::{compute_with, Totals};
use crate::types::{CartLine, InventoryItem, InventorySnapshot, ProductId};
use crate::validation::validate_quantity;

/// Immutable copy of the cart taken at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub discount_percent: DiscountPercent,
    pub totals: Totals,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The shopping cart.
#[derive(Debug, Clone)]
pub struct CartStore {
    inventory: Arc<InventorySnapshot>,
    lines: Vec<CartLine>,
    discount: DiscountPercent,
}

impl CartStore {
    /// Creates an empty cart bound to the session inventory.
    pub fn new(inventory: Arc<InventorySnapshot>) -> Self {
        CartStore {
            inventory,
            lines: Vec::new(),
            discount: DiscountPercent::zero(),
        }
    }

    pub fn inventory(&self) -> &InventorySnapshot {
        &self.inventory
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit of an item.
    ///
    /// ## Behavior
    /// - Already in cart: +1 if that stays within stock
    /// - Not in cart: new line of 1, price frozen from the item
    /// - Either way, going above stock is `InsufficientStock` and nothing changes
    pub fn add_item(&mut self, item: &InventoryItem) -> CartResult<Totals> {
        let requested = match self.find(item.id) {
            Some(line) => line
                .requested_quantity
                .checked_add(1)
                .ok_or(CartError::AmountOverflow)?,
            None => 1,
        };

        if requested > item.quantity_available {
            return Err(CartError::InsufficientStock {
                product_id: item.id,
                available: item.quantity_available,
                requested,
            });
        }

        let mut lines = self.lines.clone();
        match lines.iter_mut().find(|line| line.product_id == item.id) {
            Some(line) => line.requested_quantity = requested,
            None => lines.push(CartLine::from_item(item)),
        }
        self.commit(lines, self.discount)
    }

    /// Adds one unit of a product looked up in the session inventory.
    pub fn add_product(&mut self, product_id: ProductId) -> CartResult<Totals> {
        let inventory = Arc::clone(&self.inventory);
        let item = inventory
            .get(product_id)
            .ok_or(CartError::UnknownProduct(product_id))?;
        self.add_item(item)
    }

    /// Sets a line's quantity.
    ///
    /// ## Errors
    /// - `InvalidQuantity` when `qty < 1`
    /// - `LineNotFound` when the product has no line
    /// - `UnknownProduct` when the line's product is missing from the snapshot
    /// - `InsufficientStock` when `qty` is above the snapshot's stock
    /// - `AmountOverflow` when the new totals do not fit in cents
    pub fn set_quantity(&mut self, product_id: ProductId, qty: i64) -> CartResult<Totals> {
        validate_quantity(qty).map_err(|_| CartError::InvalidQuantity { requested: qty })?;

        if self.find(product_id).is_none() {
            return Err(CartError::LineNotFound(product_id));
        }

        let available = self
            .inventory
            .get(product_id)
            .map(|item| item.quantity_available)
            .ok_or(CartError::UnknownProduct(product_id))?;

        if qty > available {
            return Err(CartError::InsufficientStock {
                product_id,
                available,
                requested: qty,
            });
        }

        self.with_quantity(product_id, qty)
    }

    /// The "+" button.
    pub fn increment(&mut self, product_id: ProductId) -> CartResult<Totals> {
        let next = self
            .find(product_id)
            .ok_or(CartError::LineNotFound(product_id))?
            .requested_quantity
            .checked_add(1)
            .ok_or(CartError::AmountOverflow)?;
        self.set_quantity(product_id, next)
    }

    /// The "−" button. Stops at 1; removing a line is explicit.
    pub fn decrement(&mut self, product_id: ProductId) -> CartResult<Totals> {
        let current = self
            .find(product_id)
            .ok_or(CartError::LineNotFound(product_id))?
            .requested_quantity;
        self.with_quantity(product_id, (current - 1).max(1))
    }

    /// Removes a line. Removing an absent product is a no-op.
    pub fn remove_item(&mut self, product_id: ProductId) -> CartResult<Totals> {
        let lines = self
            .lines
            .iter()
            .filter(|line| line.product_id != product_id)
            .cloned()
            .collect();
        self.commit(lines, self.discount)
    }

    pub fn set_discount_percent(&mut self, pct: DiscountPercent) -> CartResult<Totals> {
        let totals = compute_with(&self.lines, pct)?;
        self.discount = pct;
        Ok(totals)
    }

    /// Sets the discount from a raw decimal, rejecting values outside `[0, 100]`.
    pub fn set_discount(&mut self, percent: Decimal) -> CartResult<Totals> {
        self.set_discount_percent(DiscountPercent::new(percent)?)
    }

    /// Empties the cart and resets the discount.
    pub fn clear(&mut self) -> Totals {
        self.lines.clear();
        self.discount = DiscountPercent::zero();
        Totals::default()
    }

    /// Prices the candidate lines and keeps them only if that succeeds.
    fn commit(&mut self, lines: Vec<CartLine>, discount: DiscountPercent) -> CartResult<Totals> {
        let totals = compute_with(&lines, discount)?;
        self.lines = lines;
        self.discount = discount;
        Ok(totals)
    }

    fn with_quantity(&mut self, product_id: ProductId, qty: i64) -> CartResult<Totals> {
        let mut lines = self.lines.clone();
        if let Some(line) = lines.iter_mut().find(|line| line.product_id == product_id) {
            line.requested_quantity = qty;
        }
        self.commit(lines, self.discount)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Recomputes totals from the current lines and discount.
    pub fn totals(&self) -> CartResult<Totals> {
        compute_with(&self.lines, self.discount)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn discount_percent(&self) -> DiscountPercent {
        self.discount
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, product_id: ProductId) -> Option<i64> {
        self.find(product_id).map(|line| line.requested_quantity)
    }

    /// Owned copy of lines, discount and totals.
    pub fn snapshot(&self) -> CartResult<CartSnapshot> {
        Ok(CartSnapshot {
            lines: self.lines.clone(),
            discount_percent: self.discount,
            totals: self.totals()?,
        })
    }

    fn find(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

}

// =============================================================================
// Unit Tests
// =============================================================================
