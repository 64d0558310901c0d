//! # POS Session
//!
//! Wires one inventory snapshot, one cart, one event bus and one submitter
//! together for the lifetime of a cashier's session.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  start() ──► load inventory ──► empty cart ──► ready                    │
//! │                                                  │                      │
//! │        ┌─────────────────────────────────────────┤                      │
//! │        ▼                                         ▼                      │
//! │  add / set qty / +/− / remove / discount    checkout(buyer)             │
//! │        │                                         │                      │
//! │        ├── ok  ──► CartChanged(totals)           ├── ok  ──► receipt    │
//! │        └── err ──► Notice(warning)               └── err ──► cart kept  │
//! │                                                                         │
//! │  end() ──► bus closed, subscribers see end-of-stream                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use std::sync::Arc;
use tally_core::{
    CartLine, CartResult, CartStore, DiscountPercent, InventoryItem, InventorySnapshot,
    ProductId, SaleReceipt, Totals,
};
use tracing::{debug, info};

use crate::backend::PosBackend;
use crate::cart_state::CartState;
use crate::config::ClientConfig;
use crate::context::SessionContext;
use crate::error::{ClientResult, SubmitResult};
use crate::events::{EventBus, Notice, PosEvent, Subscription};
use crate::inventory::load_inventory;
use crate::submitter::SaleSubmitter;

/// A running POS session.
pub struct PosSession {
    context: SessionContext,
    inventory: Arc<InventorySnapshot>,
    cart: CartState,
    bus: EventBus,
    submitter: SaleSubmitter,
}

impl PosSession {
    /// Loads the inventory and builds an empty cart.
    pub async fn start(
        config: &ClientConfig,
        backend: Arc<dyn PosBackend>,
        context: SessionContext,
    ) -> ClientResult<Self> {
        let inventory = load_inventory(backend.as_ref(), &context).await?;
        Ok(Self::with_inventory(config, backend, context, inventory))
    }

    /// Builds a session over an already loaded inventory.
    pub fn with_inventory(
        config: &ClientConfig,
        backend: Arc<dyn PosBackend>,
        context: SessionContext,
        inventory: InventorySnapshot,
    ) -> Self {
        let inventory = Arc::new(inventory);
        let cart = CartState::new(Arc::clone(&inventory));
        let bus = EventBus::new();
        let submitter = SaleSubmitter::new(backend, cart.clone(), bus.clone(), config);

        info!(items = inventory.len(), "POS session started");
        PosSession {
            context,
            inventory,
            cart,
            bus,
            submitter,
        }
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    pub fn inventory(&self) -> &InventorySnapshot {
        &self.inventory
    }

    /// Search-box results.
    pub fn search(&self, query: &str) -> Vec<&InventoryItem> {
        self.inventory.search(query)
    }

    // =========================================================================
    // Cart Edits
    // =========================================================================

    pub fn add_product(&self, product_id: ProductId) -> CartResult<Totals> {
        self.edit(|cart| cart.add_product(product_id))
    }

    pub fn set_quantity(&self, product_id: ProductId, qty: i64) -> CartResult<Totals> {
        self.edit(|cart| cart.set_quantity(product_id, qty))
    }

    pub fn increment(&self, product_id: ProductId) -> CartResult<Totals> {
        self.edit(|cart| cart.increment(product_id))
    }

    pub fn decrement(&self, product_id: ProductId) -> CartResult<Totals> {
        self.edit(|cart| cart.decrement(product_id))
    }

    pub fn remove(&self, product_id: ProductId) -> CartResult<Totals> {
        self.edit(|cart| cart.remove_item(product_id))
    }

    pub fn set_discount_percent(&self, percent: Decimal) -> CartResult<Totals> {
        self.edit(|cart| cart.set_discount(percent))
    }

    /// Manual clear by the cashier.
    pub fn clear(&self) -> Totals {
        let totals = self.cart.with_cart_mut(|cart| cart.clear());
        self.bus.publish(PosEvent::CartChanged(totals));
        totals
    }

    fn edit<F>(&self, f: F) -> CartResult<Totals>
    where
        F: FnOnce(&mut CartStore) -> CartResult<Totals>,
    {
        match self.cart.with_cart_mut(f) {
            Ok(totals) => {
                self.bus.publish(PosEvent::CartChanged(totals));
                Ok(totals)
            }
            Err(err) => {
                debug!(error = %err, "Cart edit rejected");
                self.bus.notify(Notice::warning(err.user_message()));
                Err(err)
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn totals(&self) -> CartResult<Totals> {
        self.cart.with_cart(|cart| cart.totals())
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.cart.with_cart(|cart| cart.lines().to_vec())
    }

    pub fn discount_percent(&self) -> DiscountPercent {
        self.cart.with_cart(|cart| cart.discount_percent())
    }

    pub fn is_submitting(&self) -> bool {
        self.submitter.is_submitting()
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submits the cart as one sale.
    pub async fn checkout(&self, buyer_name: &str) -> SubmitResult<SaleReceipt> {
        self.submitter.submit(&self.context, buyer_name).await
    }

    /// Ends the session; every subscription sees end-of-stream.
    pub fn end(self) {
        self.bus.close();
        info!("POS session ended");
    }
}
