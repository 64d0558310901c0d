//! # Shared Cart State
//!
//! The one [`CartStore`] of a POS session, shared between the session (UI
//! edits) and the submitter (checkout).
//!
//! ## Thread Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   PosSession ──with_cart_mut──┐                                         │
//! │                               ▼                                         │
//! │                   Arc<Mutex<CartStore>>                                 │
//! │                               ▲                                         │
//! │   SaleSubmitter ─with_cart────┘  (snapshot on entry, clear on success)  │
//! │                                                                         │
//! │   The lock is held only inside the closure, never across an .await,    │
//! │   so the cashier can keep editing while a sale is in flight.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use tally_core::{CartStore, InventorySnapshot};

/// Cloneable handle to the session cart.
#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<CartStore>>,
}

impl CartState {
    /// Creates an empty cart over the session inventory.
    pub fn new(inventory: Arc<InventorySnapshot>) -> Self {
        CartState {
            cart: Arc::new(Mutex::new(CartStore::new(inventory))),
        }
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|cart| cart.totals())?;
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CartStore) -> R,
    {
        // Mutations validate before writing, so a poisoned cart is still consistent.
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add_product(7))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CartStore) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{InventoryItem, Money};

    #[test]
    fn test_clones_share_one_cart() {
        let inventory = Arc::new(InventorySnapshot::new(vec![InventoryItem {
            id: 1,
            name: "Tea".into(),
            sku: "TEA-1".into(),
            unit_price: Money::from_cents(250),
            quantity_available: 4,
            min_stock_threshold: 1,
        }]));
        let state = CartState::new(inventory);
        let other = state.clone();

        state.with_cart_mut(|cart| cart.add_product(1)).unwrap();
        assert_eq!(other.with_cart(|cart| cart.totals().unwrap().subtotal.cents()), 250);
    }
}
