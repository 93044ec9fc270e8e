//! Purchasing domain module (purchase orders and goods receipt).
//!
//! This crate contains business rules for receiving goods against purchase
//! orders, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod grn;
pub mod order;

pub use grn::{
    FinalizePlan, FinalizedGrn, Grn, GrnDraft, GrnId, GrnItem, GrnStatus, LineDelta,
    ReceiptWarning, ReceivedLine, StockApplication, StockApplier, StockReceipt,
    build_grn_from_po, finalize_grn,
};
pub use order::{PurchaseOrder, PurchaseOrderId, PurchaseOrderLine, PurchaseOrderStatus};
