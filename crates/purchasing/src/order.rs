use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use retailerp_core::{ProductId, StockId, VariantId, string_id};

string_id!(
    /// Purchase order identifier (backend document id).
    PurchaseOrderId,
    "PurchaseOrderId"
);

/// Purchase order status as reported by the backend.
///
/// The backend moves an order to `partial` or `received` when GRNs are
/// completed; this crate only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Draft,
    Approved,
    Partial,
    Received,
    Cancelled,
}

/// Purchase order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLine {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub size: String,
    pub ordered_quantity: i64,
    /// Quantity already taken in by earlier GRNs.
    #[serde(default)]
    pub received_quantity: i64,
    pub unit_cost: Decimal,
    /// Stock location the goods are delivered to.
    pub stock_id: StockId,
}

impl PurchaseOrderLine {
    /// Quantity still expected from the supplier (never negative).
    pub fn outstanding(&self) -> i64 {
        (self.ordered_quantity - self.received_quantity).max(0)
    }
}

/// Read model of a purchase order, as far as goods receipt needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    #[serde(alias = "_id")]
    pub id: PurchaseOrderId,
    pub po_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    pub status: PurchaseOrderStatus,
    #[serde(alias = "items")]
    pub lines: Vec<PurchaseOrderLine>,
}

impl PurchaseOrder {
    /// Whether goods can still be received against this order.
    pub fn accepts_receipts(&self) -> bool {
        matches!(
            self.status,
            PurchaseOrderStatus::Approved | PurchaseOrderStatus::Partial
        )
    }

    pub fn total_outstanding(&self) -> i64 {
        self.lines.iter().map(PurchaseOrderLine::outstanding).sum()
    }
}
