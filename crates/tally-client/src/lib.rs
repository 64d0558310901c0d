//! # tally-client: Backend Client & Checkout for Tally POS
//!
//! This crate connects the pure cart logic in `tally-core` to the POS
//! backend: it loads the session inventory, shares the cart between the UI
//! and checkout, and commits sales exactly once per attempt.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  PosSession (per cashier session)                │  │
//! │  │                                                                  │  │
//! │  │  Cart edits ──► CartState ──► CartChanged / warning notice      │  │
//! │  │  checkout() ──► SaleSubmitter                                    │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ SaleSubmitter  │  │   EventBus     │  │  PosBackend            │    │
//! │  │                │  │                │  │                        │    │
//! │  │ In-flight guard│  │ CartChanged    │  │ HttpBackend (reqwest)  │    │
//! │  │ Timeout        │  │ SaleCompleted  │  │ GET  /customer/stock   │    │
//! │  │ Clear on       │  │ Notice         │  │ POST /customer/sell    │    │
//! │  │ success only   │  │                │  │ Bearer from Session-   │    │
//! │  │                │  │                │  │ Context                │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`backend`] - `PosBackend` trait and the HTTP implementation
//! - [`cart_state`] - Shared, lockable session cart
//! - [`config`] - Client configuration (API URL, timeouts, payment method)
//! - [`context`] - Bearer credential passed to every backend call
//! - [`error`] - Client, backend and submission errors
//! - [`events`] - Publish/subscribe channel for cart and sale events
//! - [`inventory`] - Session inventory loading
//! - [`session`] - `PosSession` orchestration
//! - [`submitter`] - One-shot sale commit
//! - [`wire`] - JSON request/response bodies
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_client::{ClientConfig, HttpBackend, PosSession, SessionContext};
//!
//! let config = ClientConfig::load_or_default(None);
//! let backend = Arc::new(HttpBackend::new(&config)?);
//! let session = PosSession::start(&config, backend, SessionContext::new(token)?).await?;
//!
//! let mut events = session.subscribe();
//! session.add_product(7)?;
//! session.set_discount_percent(10.into())?;
//!
//! match session.checkout("Walk-in").await {
//!     Ok(receipt) => println!("Invoice {}", receipt.invoice_number),
//!     Err(e) if e.is_ambiguous() => println!("Check recent sales before retrying"),
//!     Err(e) => println!("{}", e.user_message()),
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod cart_state;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod inventory;
pub mod session;
pub mod submitter;
pub mod wire;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{HttpBackend, PosBackend};
pub use cart_state::CartState;
pub use config::{ApiSettings, ClientConfig, SaleSettings};
pub use context::SessionContext;
pub use error::{
    BackendError, BackendResult, ClientError, ClientResult, SubmitError, SubmitResult,
};
pub use events::{EventBus, Notice, NoticeLevel, PosEvent, Subscription};
pub use inventory::load_inventory;
pub use session::PosSession;
pub use submitter::SaleSubmitter;
pub use wire::{SaleOutcome, SaleRecord, SaleRequest, StockRecord};
