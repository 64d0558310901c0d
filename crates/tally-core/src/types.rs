//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  InventoryItem  │   │    CartLine     │   │  SaleReceipt    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  product_id     │──►│  invoice_number │       │
//! │  │  unit_price     │   │  quantity       │   │  lines (frozen) │       │
//! │  │  quantity_avail │   │  price snapshot │   │  total_amount   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │          ▲                                                              │
//! │  ┌───────┴─────────┐   ┌─────────────────┐                             │
//! │  │InventorySnapshot│   │ PaymentMethod   │                             │
//! │  │ fetched once per│   │  Cash (default) │                             │
//! │  │ POS session     │   │  Card, Mobile   │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

/// Backend product identifier (`product_id` on the wire).
pub type ProductId = i64;

// =============================================================================
// Inventory
// =============================================================================

/// A purchasable item as fetched at the start of a POS session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    pub id: ProductId,

    /// Display name shown to the cashier and sent with the sale.
    pub name: String,

    pub sku: String,

    /// Current selling price.
    pub unit_price: Money,

    /// Stock on hand; the ceiling for any cart line of this product.
    pub quantity_available: i64,

    /// Reorder threshold used for the low-stock marker.
    pub min_stock_threshold: i64,
}

impl InventoryItem {
    /// Stock at or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity_available <= self.min_stock_threshold
    }

    pub fn in_stock(&self) -> bool {
        self.quantity_available > 0
    }
}

/// Read-only inventory for one POS session.
///
/// Items keep the order the backend returned them in. A product id that
/// appears twice keeps its first record.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    items: Vec<InventoryItem>,
    index: HashMap<ProductId, usize>,
}

impl InventorySnapshot {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        let mut kept = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());
        for item in items {
            if index.contains_key(&item.id) {
                continue;
            }
            index.insert(item.id, kept.len());
            kept.push(item);
        }
        InventorySnapshot { items: kept, index }
    }

    pub fn get(&self, id: ProductId) -> Option<&InventoryItem> {
        self.index.get(&id).map(|&i| &self.items[i])
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Search-box lookup.
    ///
    /// ## Rules
    /// - Blank query returns nothing (the result list is hidden)
    /// - Case-insensitive substring match on name or SKU
    /// - Out-of-stock items are never offered
    pub fn search(&self, query: &str) -> Vec<&InventoryItem> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.items
            .iter()
            .filter(|item| item.in_stock())
            .filter(|item| {
                item.name.to_lowercase().contains(&query)
                    || item.sku.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Items at or below their reorder threshold.
    pub fn low_stock(&self) -> Vec<&InventoryItem> {
        self.items.iter().filter(|item| item.is_low_stock()).collect()
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One product staged in the cart.
///
/// Uses the snapshot pattern: price, name and SKU are frozen when the line is
/// created so later catalog changes never alter an in-progress sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: ProductId,

    /// Always at least 1.
    pub requested_quantity: i64,

    /// Unit price at the moment the line was added (frozen).
    pub unit_price_snapshot: Money,

    /// Product name at the moment the line was added (frozen).
    pub name: String,

    /// SKU at the moment the line was added (frozen).
    pub sku: String,
}

impl CartLine {
    /// Creates a single-unit line from an inventory item.
    pub fn from_item(item: &InventoryItem) -> Self {
        CartLine {
            product_id: item.id,
            requested_quantity: 1,
            unit_price_snapshot: item.unit_price,
            name: item.name.clone(),
            sku: item.sku.clone(),
        }
    }

    /// unit price × quantity, or `None` if it does not fit in cents.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price_snapshot.checked_mul_quantity(self.requested_quantity)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Tender type recorded with the sale. Split tender is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    #[default]
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Mobile wallet transfer.
    MobileWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MobileWallet => "mobile_wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "mobile_wallet" | "mobile" => Ok(PaymentMethod::MobileWallet),
            other => Err(ValidationError::InvalidFormat {
                field: "payment_method".to_string(),
                reason: format!("unknown payment method '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Sale Receipt
// =============================================================================

/// A sale the backend has confirmed. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    /// Backend sale id.
    pub sale_id: i64,

    pub invoice_number: String,

    /// Cart lines exactly as they were submitted.
    pub lines: Vec<CartLine>,

    pub subtotal: Money,

    pub discount_amount: Money,

    pub total_amount: Money,

    /// `sold_to`; may be empty for walk-in customers.
    pub buyer_name: String,

    pub payment_method: PaymentMethod,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleReceipt {
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.requested_quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: ProductId, name: &str, sku: &str, stock: i64) -> InventoryItem {
        InventoryItem {
            id,
            name: name.to_string(),
            sku: sku.to_string(),
            unit_price: Money::from_cents(1000),
            quantity_available: stock,
            min_stock_threshold: 3,
        }
    }

    #[test]
    fn test_low_stock_marker() {
        assert!(item(1, "Rice 5kg", "RICE-5", 3).is_low_stock());
        assert!(!item(1, "Rice 5kg", "RICE-5", 4).is_low_stock());
    }

    #[test]
    fn test_snapshot_keeps_first_duplicate() {
        let snapshot = InventorySnapshot::new(vec![
            item(1, "Rice 5kg", "RICE-5", 10),
            item(1, "Rice 5kg (dup)", "RICE-5", 99),
        ]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(1).unwrap().quantity_available, 10);
    }

    #[test]
    fn test_search_matches_name_and_sku_in_stock_only() {
        let snapshot = InventorySnapshot::new(vec![
            item(1, "Rice 5kg", "RICE-5", 10),
            item(2, "Brown Rice", "BRN-1", 0),
            item(3, "Lentils", "DAL-1", 4),
        ]);

        let hits: Vec<ProductId> = snapshot.search("rice").iter().map(|i| i.id).collect();
        assert_eq!(hits, vec![1]);

        let hits: Vec<ProductId> = snapshot.search("dal").iter().map(|i| i.id).collect();
        assert_eq!(hits, vec![3]);

        assert!(snapshot.search("   ").is_empty());
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("CARD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("mobile".parse::<PaymentMethod>().unwrap(), PaymentMethod::MobileWallet);
        assert!("cheque".parse::<PaymentMethod>().is_err());
        assert_eq!(serde_json::to_string(&PaymentMethod::Cash).unwrap(), "\"cash\"");
    }

    #[test]
    fn test_line_total() {
        let mut line = CartLine::from_item(&item(1, "Rice 5kg", "RICE-5", 10));
        line.requested_quantity = 3;
        assert_eq!(line.line_total().unwrap().cents(), 3000);
    }
}
