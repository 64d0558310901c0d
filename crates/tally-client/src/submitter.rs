//! # Sale Submitter
//!
//! Turns the staged cart into a persisted sale, exactly once per attempt.
//!
//! ## Checkout State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ── submit() ──► Submitting ──┬── Accepted ──► clear cart ──► Idle│
//! │    ▲                     │          │                 publish receipt   │
//! │    │                     │          │                                   │
//! │    │   second submit()   │          └── anything else ─► cart untouched │
//! │    │   ─► SubmissionIn-  │              publish error notice ──► Idle   │
//! │    │      Progress       │                                              │
//! │    └─────────────────────┘                                              │
//! │                                                                         │
//! │   The in-flight flag is released by a drop guard, so it also resets     │
//! │   when the submit future is cancelled.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - The request is built from a snapshot taken on entry; later edits to the
//!   live cart do not change what is sent
//! - The backend is called at most once per attempt; there is no retry
//! - The live cart is cleared only after the backend confirmed the sale

use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tally_core::validation::validate_buyer_name;
use tally_core::{CartError, CartSnapshot, Money, PaymentMethod, SaleReceipt};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::backend::PosBackend;
use crate::cart_state::CartState;
use crate::config::ClientConfig;
use crate::context::SessionContext;
use crate::error::{SubmitError, SubmitResult};
use crate::events::{EventBus, Notice, PosEvent};
use crate::wire::{SaleOutcome, SaleRecord, SaleRequest};

// =============================================================================
// In-flight Guard
// =============================================================================

/// Holds the in-flight flag for the lifetime of one attempt.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =============================================================================
// Sale Submitter
// =============================================================================

/// One-shot commit of the session cart.
pub struct SaleSubmitter {
    backend: Arc<dyn PosBackend>,
    cart: CartState,
    bus: EventBus,
    payment_method: PaymentMethod,
    timeout: Duration,
    in_flight: AtomicBool,
}

impl SaleSubmitter {
    pub fn new(
        backend: Arc<dyn PosBackend>,
        cart: CartState,
        bus: EventBus,
        config: &ClientConfig,
    ) -> Self {
        SaleSubmitter {
            backend,
            cart,
            bus,
            payment_method: config.payment_method(),
            timeout: config.submit_timeout(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while an attempt is outstanding.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submits the current cart as one sale.
    ///
    /// On success the receipt is returned, the live cart is cleared and
    /// `SaleCompleted` + `CartChanged` are published. On any error the live
    /// cart is left as it is and an error notice is published.
    pub async fn submit(
        &self,
        session: &SessionContext,
        buyer_name: &str,
    ) -> SubmitResult<SaleReceipt> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            warn!("Submit ignored: a sale is already in flight");
            return Err(self.report(SubmitError::SubmissionInProgress));
        };

        let attempt_id = Uuid::new_v4();
        let span = info_span!("submit_sale", %attempt_id);
        self.attempt(session, buyer_name)
            .instrument(span)
            .await
            .map_err(|e| self.report(e))
    }

    async fn attempt(&self, session: &SessionContext, buyer_name: &str) -> SubmitResult<SaleReceipt> {
        let sold_to = validate_buyer_name(buyer_name).map_err(CartError::from)?;

        let snapshot = self.cart.with_cart(|cart| cart.snapshot())?;
        if snapshot.is_empty() {
            return Err(SubmitError::EmptyCart);
        }

        let request = SaleRequest::from_snapshot(&snapshot, self.payment_method, sold_to.clone());
        info!(
            lines = snapshot.lines.len(),
            total = %snapshot.totals.total,
            discount = %snapshot.totals.discount_amount,
            "Submitting sale"
        );

        let secs = self.timeout.as_secs();
        let outcome = match tokio::time::timeout(self.timeout, self.backend.commit_sale(session, &request)).await {
            Err(_) => {
                warn!(timeout_secs = secs, "Sale submission timed out; outcome unknown");
                return Err(SubmitError::NetworkTimeout { secs });
            }
            Ok(result) => result.map_err(|e| SubmitError::from_backend(e, secs))?,
        };

        let record = match outcome {
            SaleOutcome::Accepted(record) => record,
            SaleOutcome::Rejected { message } => {
                return Err(SubmitError::ServerRejected {
                    status: None,
                    message,
                });
            }
        };

        let receipt = build_receipt(record, snapshot, sold_to, self.payment_method);
        let totals = self.cart.with_cart_mut(|cart| cart.clear());

        info!(
            sale_id = receipt.sale_id,
            invoice = %receipt.invoice_number,
            total = %receipt.total_amount,
            "Sale completed"
        );
        self.bus.publish(PosEvent::SaleCompleted(receipt.clone()));
        self.bus.publish(PosEvent::CartChanged(totals));
        self.bus.notify(Notice::success(format!(
            "Sale completed! Invoice {}",
            receipt.invoice_number
        )));

        Ok(receipt)
    }

    /// Logs and publishes a failure, then hands it back.
    fn report(&self, err: SubmitError) -> SubmitError {
        match &err {
            SubmitError::MalformedResponse(msg) => error!(error = %msg, "Malformed sale response"),
            SubmitError::ServerRejected { status, message } => {
                warn!(status = ?status, message = %message, "Sale rejected by server")
            }
            other => debug!(error = %other, "Sale not submitted"),
        }
        let notice = match &err {
            SubmitError::EmptyCart | SubmitError::SubmissionInProgress | SubmitError::Cart(_) => {
                Notice::warning(err.user_message())
            }
            _ => Notice::error(err.user_message()),
        };
        self.bus.notify(notice);
        err
    }
}

/// Builds the receipt from what was sent plus what the backend assigned.
///
/// Amounts come from the snapshot; a different server total or discount is
/// logged.
fn build_receipt(
    record: SaleRecord,
    snapshot: CartSnapshot,
    buyer_name: String,
    payment_method: PaymentMethod,
) -> SaleReceipt {
    if let Some(server_total) = record.total_amount.and_then(Money::from_decimal) {
        if server_total != snapshot.totals.total {
            warn!(
                local = %snapshot.totals.total,
                server = %server_total,
                "Server total differs from submitted total"
            );
        }
    }
    if let Some(server_discount) = record.discount.and_then(Money::from_decimal) {
        if server_discount != snapshot.totals.discount_amount {
            warn!(
                local = %snapshot.totals.discount_amount,
                server = %server_discount,
                "Server discount differs from submitted discount"
            );
        }
    }

    let created_at = record
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);

    SaleReceipt {
        sale_id: record.id,
        invoice_number: record.invoice_number,
        lines: snapshot.lines,
        subtotal: snapshot.totals.subtotal,
        discount_amount: snapshot.totals.discount_amount,
        total_amount: snapshot.totals.total,
        buyer_name,
        payment_method,
        created_at,
    }
}

/// RFC 3339, or the `YYYY-MM-DD HH:MM:SS` form read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendError, BackendResult};
    use crate::events::{NoticeLevel, Subscription};
    use crate::wire::StockRecord;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use proptest::prelude::*;
    use proptest::test_runner::Config;
    use tally_core::{DiscountPercent, InventoryItem, InventorySnapshot};
    use tokio::sync::Notify;

    enum Behavior {
        Accept,
        Reject(&'static str),
        Fail(BackendError),
        Hang,
        /// Waits for `release` before accepting.
        Gate,
    }

    struct FakeBackend {
        behavior: Behavior,
        calls: AtomicUsize,
        last_request: Mutex<Option<SaleRequest>>,
        entered: Notify,
        release: Notify,
    }

    impl FakeBackend {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(FakeBackend {
                behavior,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                entered: Notify::new(),
                release: Notify::new(),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn accepted() -> SaleOutcome {
            SaleOutcome::Accepted(SaleRecord {
                id: 55,
                invoice_number: "INV-0055".into(),
                total_amount: Some(Decimal::new(9000, 2)),
                discount: Some(Decimal::new(1000, 2)),
                created_at: Some("2026-10-16T09:30:00Z".into()),
            })
        }
    }

    #[async_trait]
    impl PosBackend for FakeBackend {
        async fn fetch_inventory(&self, _: &SessionContext) -> BackendResult<Vec<StockRecord>> {
            Ok(Vec::new())
        }

        async fn commit_sale(
            &self,
            _: &SessionContext,
            request: &SaleRequest,
        ) -> BackendResult<SaleOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.entered.notify_one();
            match &self.behavior {
                Behavior::Accept => Ok(Self::accepted()),
                Behavior::Reject(msg) => Ok(SaleOutcome::Rejected {
                    message: msg.to_string(),
                }),
                Behavior::Fail(err) => Err(err.clone()),
                Behavior::Hang => std::future::pending().await,
                Behavior::Gate => {
                    self.release.notified().await;
                    Ok(Self::accepted())
                }
            }
        }
    }

    fn coffee() -> InventoryItem {
        InventoryItem {
            id: 7,
            name: "Coffee Beans".into(),
            sku: "COF-250".into(),
            unit_price: Money::from_cents(5000),
            quantity_available: 10,
            min_stock_threshold: 2,
        }
    }

    fn tea() -> InventoryItem {
        InventoryItem {
            id: 8,
            name: "Green Tea".into(),
            sku: "TEA-1".into(),
            unit_price: Money::from_cents(1000),
            quantity_available: 5,
            min_stock_threshold: 1,
        }
    }

    struct Fixture {
        submitter: Arc<SaleSubmitter>,
        backend: Arc<FakeBackend>,
        cart: CartState,
        events: Subscription,
        before: CartSnapshot,
    }

    /// Cart with coffee × 2 at 10% off: 100.00 / 10.00 / 90.00.
    fn fixture(behavior: Behavior) -> Fixture {
        fixture_with(behavior, 2, 0, 10)
    }

    fn fixture_with(behavior: Behavior, coffee_qty: i64, tea_qty: i64, percent: u32) -> Fixture {
        let inventory = Arc::new(InventorySnapshot::new(vec![coffee(), tea()]));
        let cart = CartState::new(inventory);
        cart.with_cart_mut(|c| {
            for (id, qty) in [(7, coffee_qty), (8, tea_qty)] {
                if qty > 0 {
                    c.add_product(id).unwrap();
                    c.set_quantity(id, qty).unwrap();
                }
            }
            c.set_discount_percent(DiscountPercent::from_whole(percent).unwrap())
                .unwrap();
        });
        let before = cart.with_cart(|c| c.snapshot().unwrap());

        let bus = EventBus::new();
        let events = bus.subscribe();
        let backend = FakeBackend::new(behavior);
        let submitter = Arc::new(SaleSubmitter::new(
            backend.clone(),
            cart.clone(),
            bus,
            &ClientConfig::default(),
        ));
        Fixture {
            submitter,
            backend,
            cart,
            events,
            before,
        }
    }

    fn session() -> SessionContext {
        SessionContext::new("token").unwrap()
    }

    fn drain(events: &mut Subscription) -> Vec<PosEvent> {
        std::iter::from_fn(|| events.try_recv()).collect()
    }

    fn assert_cart_intact(fx: &Fixture) {
        let now = fx.cart.with_cart(|c| c.snapshot().unwrap());
        assert_eq!(now, fx.before);
    }

    #[tokio::test]
    async fn test_success_clears_cart_and_publishes_receipt() {
        let mut fx = fixture(Behavior::Accept);

        let receipt = fx.submitter.submit(&session(), "  Ayesha ").await.unwrap();

        assert_eq!(receipt.invoice_number, "INV-0055");
        assert_eq!(receipt.total_amount.cents(), 9_000);
        assert_eq!(receipt.discount_amount.cents(), 1_000);
        assert_eq!(receipt.buyer_name, "Ayesha");
        assert_eq!(receipt.total_quantity(), 2);
        assert_eq!(receipt.created_at.to_rfc3339(), "2026-10-16T09:30:00+00:00");

        fx.cart.with_cart(|c| {
            assert!(c.is_empty());
            assert!(c.discount_percent().is_zero());
        });
        assert_eq!(fx.backend.calls(), 1);

        let sent = fx.backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.sold_to, "Ayesha");
        assert_eq!(sent.sale_price, Decimal::new(9000, 2));

        let events = drain(&mut fx.events);
        assert!(matches!(&events[0], PosEvent::SaleCompleted(r) if r.sale_id == 55));
        assert!(matches!(&events[1], PosEvent::CartChanged(t) if t.total.is_zero()));
        assert!(matches!(&events[2], PosEvent::Notice(n) if n.level == NoticeLevel::Success));
        assert!(!fx.submitter.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_cart() {
        let mut fx = fixture(Behavior::Hang);

        let err = fx.submitter.submit(&session(), "").await.unwrap_err();
        assert_eq!(err, SubmitError::NetworkTimeout { secs: 15 });
        assert!(err.is_ambiguous());
        assert_cart_intact(&fx);

        let events = drain(&mut fx.events);
        assert!(matches!(&events[..], [PosEvent::Notice(n)] if n.level == NoticeLevel::Error));
        assert!(!fx.submitter.is_submitting());
    }

    #[tokio::test]
    async fn test_rejection_keeps_cart() {
        let fx = fixture(Behavior::Reject("Insufficient stock for Coffee Beans"));

        let err = fx.submitter.submit(&session(), "").await.unwrap_err();
        assert_eq!(
            err,
            SubmitError::ServerRejected {
                status: None,
                message: "Insufficient stock for Coffee Beans".into()
            }
        );
        assert_cart_intact(&fx);
    }

    #[tokio::test]
    async fn test_backend_failures_map_to_submit_errors() {
        let fx = fixture(Behavior::Fail(BackendError::Network("connection reset".into())));
        let err = fx.submitter.submit(&session(), "").await.unwrap_err();
        assert!(matches!(err, SubmitError::NetworkError(_)));
        assert_cart_intact(&fx);

        let fx = fixture(Behavior::Fail(BackendError::Malformed("missing data".into())));
        let err = fx.submitter.submit(&session(), "").await.unwrap_err();
        assert!(matches!(err, SubmitError::MalformedResponse(_)));
        assert_cart_intact(&fx);
    }

    #[tokio::test]
    async fn test_empty_cart_never_calls_backend() {
        let fx = fixture(Behavior::Accept);
        fx.cart.with_cart_mut(|c| c.clear());

        let err = fx.submitter.submit(&session(), "").await.unwrap_err();
        assert_eq!(err, SubmitError::EmptyCart);
        assert_eq!(fx.backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_overlong_buyer_name_is_refused() {
        let fx = fixture(Behavior::Accept);
        let name = "x".repeat(tally_core::MAX_BUYER_NAME_LEN + 1);

        let err = fx.submitter.submit(&session(), &name).await.unwrap_err();
        assert!(matches!(err, SubmitError::Cart(CartError::Validation(_))));
        assert_eq!(fx.backend.calls(), 0);
        assert_cart_intact(&fx);
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_refused() {
        let fx = fixture(Behavior::Gate);

        let first = {
            let submitter = Arc::clone(&fx.submitter);
            tokio::spawn(async move { submitter.submit(&session(), "").await })
        };
        fx.backend.entered.notified().await;
        assert!(fx.submitter.is_submitting());

        let err = fx.submitter.submit(&session(), "").await.unwrap_err();
        assert_eq!(err, SubmitError::SubmissionInProgress);

        fx.backend.release.notify_one();
        let receipt = first.await.unwrap().unwrap();
        assert_eq!(receipt.sale_id, 55);
        assert_eq!(fx.backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_edits_during_flight_do_not_change_request() {
        let fx = fixture(Behavior::Gate);

        let first = {
            let submitter = Arc::clone(&fx.submitter);
            tokio::spawn(async move { submitter.submit(&session(), "").await })
        };
        fx.backend.entered.notified().await;

        fx.cart.with_cart_mut(|c| c.add_product(8)).unwrap();
        fx.backend.release.notify_one();

        let receipt = first.await.unwrap().unwrap();
        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].product_id, 7);
        let sent = fx.backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.items.len(), 1);
        fx.cart.with_cart(|c| assert!(c.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_submit_releases_guard() {
        let fx = fixture(Behavior::Hang);

        let task = {
            let submitter = Arc::clone(&fx.submitter);
            tokio::spawn(async move { submitter.submit(&session(), "").await })
        };
        fx.backend.entered.notified().await;
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert!(!fx.submitter.is_submitting());
        assert_cart_intact(&fx);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("2026-10-16T09:30:00+06:00").is_some());
        assert_eq!(
            parse_timestamp("2026-10-16 09:30:00").unwrap().to_rfc3339(),
            "2026-10-16T09:30:00+00:00"
        );
        assert!(parse_timestamp("yesterday").is_none());
    }

    fn failure(kind: usize) -> Behavior {
        match kind {
            0 => Behavior::Fail(BackendError::Network("connection reset".into())),
            1 => Behavior::Fail(BackendError::Timeout),
            2 => Behavior::Fail(BackendError::Malformed("missing data".into())),
            3 => Behavior::Fail(BackendError::Rejected {
                status: Some(500),
                message: "Server Error".into(),
            }),
            _ => Behavior::Reject("Insufficient stock"),
        }
    }

    proptest! {
        #![proptest_config(Config::with_cases(64))]
        #[test]
        fn failed_submit_leaves_cart_identical(
            coffee_qty in 0_i64..=10,
            tea_qty in 0_i64..=5,
            percent in 0_u32..=100,
            kind in 0_usize..5
        ) {
            prop_assume!(coffee_qty + tea_qty > 0);
            let fx = fixture_with(failure(kind), coffee_qty, tea_qty, percent);

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let result = rt.block_on(fx.submitter.submit(&session(), "Walk-in"));

            prop_assert!(result.is_err());
            prop_assert_eq!(fx.backend.calls(), 1);
            prop_assert_eq!(fx.cart.with_cart(|c| c.snapshot().unwrap()), fx.before.clone());
            prop_assert!(!fx.submitter.is_submitting());
        }
    }
}
