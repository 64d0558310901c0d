//! # Wire Types
//!
//! JSON bodies exchanged with the POS backend.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  {base}/customer/stock                                             │
//! │       ◄── { success, message, data: [StockRecord, ...] }                │
//! │           or a bare [StockRecord, ...]                                  │
//! │                                                                         │
//! │  POST {base}/customer/sell                                              │
//! │       ──► SaleRequest                                                   │
//! │       ◄── { success, message, data: SaleRecord }                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decimal fields are read from JSON numbers or strings and always written as
//! JSON numbers. Unknown fields are ignored.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tally_core::{CartSnapshot, InventoryItem, Money, PaymentMethod};

use crate::error::BackendError;

// =============================================================================
// Envelope
// =============================================================================

/// `{ success, message, data }` wrapper used by every endpoint.
///
/// `data` is kept as raw JSON until `success` has been checked: rejections
/// often carry `[]` or a validation-error object there instead of a record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiEnvelope {
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub data: Value,
}

impl ApiEnvelope {
    /// Decodes `data` as `T`; JSON `null` or a missing field is `None`.
    pub fn decode_data<T: DeserializeOwned>(self) -> Result<Option<T>, BackendError> {
        if self.data.is_null() {
            return Ok(None);
        }
        serde_json::from_value(self.data)
            .map(Some)
            .map_err(|e| BackendError::Malformed(e.to_string()))
    }

    /// The server message, or `fallback` when it is missing or blank.
    fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Body of a non-2xx response. Only the message is of interest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Stock
// =============================================================================

/// One row of the stock list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StockRecord {
    pub product_id: i64,

    pub product_name: String,

    #[serde(default)]
    pub sku: String,

    /// Selling price in major units.
    pub purchase_price: Decimal,

    pub quantity: i64,

    #[serde(default)]
    pub min_stock: i64,
}

impl StockRecord {
    /// Converts to a domain item, refusing negative prices or stock.
    pub fn into_item(self) -> Result<InventoryItem, BackendError> {
        let unit_price = Money::from_decimal(self.purchase_price).ok_or_else(|| {
            BackendError::Malformed(format!(
                "product {}: price {} out of range",
                self.product_id, self.purchase_price
            ))
        })?;
        if unit_price.is_negative() {
            return Err(BackendError::Malformed(format!(
                "product {}: negative price {}",
                self.product_id, self.purchase_price
            )));
        }
        if self.quantity < 0 || self.min_stock < 0 {
            return Err(BackendError::Malformed(format!(
                "product {}: negative stock",
                self.product_id
            )));
        }

        Ok(InventoryItem {
            id: self.product_id,
            name: self.product_name,
            sku: self.sku,
            unit_price,
            quantity_available: self.quantity,
            min_stock_threshold: self.min_stock,
        })
    }
}

/// The stock endpoint answers either with an envelope or a bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StockListResponse {
    Envelope(ApiEnvelope),
    Bare(Vec<StockRecord>),
}

impl StockListResponse {
    pub fn into_records(self) -> Result<Vec<StockRecord>, BackendError> {
        match self {
            StockListResponse::Bare(records) => Ok(records),
            StockListResponse::Envelope(env) if !env.success => Err(BackendError::Rejected {
                status: None,
                message: env.message_or("Failed to load stock"),
            }),
            StockListResponse::Envelope(env) => Ok(env.decode_data()?.unwrap_or_default()),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One line of the commit request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleItemRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub name: String,
    /// Unit price in major units.
    #[serde(with = "rust_decimal::serde::float")]
    pub sale_price: Decimal,
}

/// Body of `POST /customer/sell`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRequest {
    pub items: Vec<SaleItemRequest>,

    /// Total after discount.
    #[serde(with = "rust_decimal::serde::float")]
    pub sale_price: Decimal,

    /// Discount amount (not percent).
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,

    pub payment_method: PaymentMethod,

    pub sold_to: String,
}

impl SaleRequest {
    /// Builds the request from a checkout snapshot, keeping line order.
    pub fn from_snapshot(
        snapshot: &CartSnapshot,
        payment_method: PaymentMethod,
        sold_to: String,
    ) -> Self {
        SaleRequest {
            items: snapshot
                .lines
                .iter()
                .map(|line| SaleItemRequest {
                    product_id: line.product_id,
                    quantity: line.requested_quantity,
                    name: line.name.clone(),
                    sale_price: line.unit_price_snapshot.to_decimal(),
                })
                .collect(),
            sale_price: snapshot.totals.total.to_decimal(),
            discount: snapshot.totals.discount_amount.to_decimal(),
            payment_method,
            sold_to,
        }
    }
}

/// The persisted sale as the backend reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaleRecord {
    pub id: i64,

    pub invoice_number: String,

    #[serde(default)]
    pub total_amount: Option<Decimal>,

    #[serde(default)]
    pub discount: Option<Decimal>,

    /// RFC 3339 timestamp, when the backend sends one.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Checked interpretation of a sale response.
#[derive(Debug, Clone, PartialEq)]
pub enum SaleOutcome {
    Accepted(SaleRecord),
    Rejected { message: String },
}

impl SaleOutcome {
    /// `success = true` must carry a record; `success = false` is a rejection
    /// whatever `data` holds.
    pub fn from_envelope(env: ApiEnvelope) -> Result<Self, BackendError> {
        if !env.success {
            return Ok(SaleOutcome::Rejected {
                message: env.message_or("Failed to complete sale"),
            });
        }
        match env.decode_data()? {
            Some(record) => Ok(SaleOutcome::Accepted(record)),
            None => Err(BackendError::Malformed(
                "success response without sale data".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tally_core::{CartStore, DiscountPercent, InventorySnapshot};

    fn stock_json() -> &'static str {
        r#"{
            "success": true,
            "message": "ok",
            "data": [
                {"id": 1, "product_id": 7, "product_name": "Coffee Beans", "sku": "COF-250",
                 "category": "Grocery", "quantity": 10, "cost_price": 30,
                 "purchase_price": "50.00", "min_stock": 2, "created_at": "2024-01-01"},
                {"product_id": 8, "product_name": "Tea", "quantity": 0,
                 "purchase_price": 12.5}
            ]
        }"#
    }

    #[test]
    fn test_stock_envelope_and_bare_list() {
        let resp: StockListResponse = serde_json::from_str(stock_json()).unwrap();
        let records = resp.into_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sku, "");

        let bare: StockListResponse = serde_json::from_str(
            r#"[{"product_id": 8, "product_name": "Tea", "quantity": 3, "purchase_price": 1}]"#,
        )
        .unwrap();
        assert_eq!(bare.into_records().unwrap()[0].product_id, 8);
    }

    #[test]
    fn test_stock_record_conversion() {
        let resp: StockListResponse = serde_json::from_str(stock_json()).unwrap();
        let mut records = resp.into_records().unwrap().into_iter();

        let coffee = records.next().unwrap().into_item().unwrap();
        assert_eq!(coffee.unit_price.cents(), 5000);
        assert_eq!(coffee.min_stock_threshold, 2);

        let tea = records.next().unwrap().into_item().unwrap();
        assert_eq!(tea.unit_price.cents(), 1250);
    }

    #[test]
    fn test_negative_stock_is_malformed() {
        let record = StockRecord {
            product_id: 1,
            product_name: "Broken".into(),
            sku: String::new(),
            purchase_price: Decimal::ONE,
            quantity: -1,
            min_stock: 0,
        };
        assert!(matches!(record.into_item(), Err(BackendError::Malformed(_))));
    }

    #[test]
    fn test_sale_request_body() {
        let coffee = InventoryItem {
            id: 7,
            name: "Coffee Beans".into(),
            sku: "COF-250".into(),
            unit_price: Money::from_cents(5000),
            quantity_available: 10,
            min_stock_threshold: 2,
        };
        let mut cart = CartStore::new(Arc::new(InventorySnapshot::new(vec![coffee.clone()])));
        cart.add_item(&coffee).unwrap();
        cart.add_item(&coffee).unwrap();
        cart.set_discount_percent(DiscountPercent::from_whole(10).unwrap())
            .unwrap();

        let body = SaleRequest::from_snapshot(&cart.snapshot().unwrap(), PaymentMethod::Cash, "Ayesha".into());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "items": [{"product_id": 7, "quantity": 2, "name": "Coffee Beans", "sale_price": 50.0}],
                "sale_price": 90.0,
                "discount": 10.0,
                "payment_method": "cash",
                "sold_to": "Ayesha"
            })
        );
    }

    #[test]
    fn test_sale_outcome_interpretation() {
        let accepted: ApiEnvelope = serde_json::from_str(
            r#"{"success": true, "message": "Sale completed",
                "data": {"id": 55, "invoice_number": "INV-0055", "total_amount": "90.00"}}"#,
        )
        .unwrap();
        match SaleOutcome::from_envelope(accepted).unwrap() {
            SaleOutcome::Accepted(record) => {
                assert_eq!(record.invoice_number, "INV-0055");
                assert_eq!(record.total_amount, Some(Decimal::new(9000, 2)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let rejected: ApiEnvelope =
            serde_json::from_str(r#"{"success": false, "message": "Insufficient stock"}"#).unwrap();
        assert_eq!(
            SaleOutcome::from_envelope(rejected).unwrap(),
            SaleOutcome::Rejected {
                message: "Insufficient stock".into()
            }
        );

        let empty: ApiEnvelope = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(
            SaleOutcome::from_envelope(empty),
            Err(BackendError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejection_with_non_record_data() {
        for body in [
            r#"{"success": false, "message": "Insufficient stock", "data": []}"#,
            r#"{"success": false, "message": "Insufficient stock",
                "data": {"errors": {"items.0.quantity": ["Not enough stock"]}}}"#,
        ] {
            let env: ApiEnvelope = serde_json::from_str(body).unwrap();
            assert_eq!(
                SaleOutcome::from_envelope(env).unwrap(),
                SaleOutcome::Rejected {
                    message: "Insufficient stock".into()
                }
            );
        }

        let stock: StockListResponse = serde_json::from_str(
            r#"{"success": false, "message": "Token expired", "data": {"errors": []}}"#,
        )
        .unwrap();
        assert_eq!(
            stock.into_records().unwrap_err(),
            BackendError::Rejected {
                status: None,
                message: "Token expired".into()
            }
        );
    }

    #[test]
    fn test_success_with_wrong_data_shape_is_malformed() {
        let env: ApiEnvelope =
            serde_json::from_str(r#"{"success": true, "data": {"invoice": "INV-1"}}"#).unwrap();
        assert!(matches!(
            SaleOutcome::from_envelope(env),
            Err(BackendError::Malformed(_))
        ));
    }
}
