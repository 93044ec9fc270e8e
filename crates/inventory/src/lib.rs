//! Inventory domain module (stock adjustment documents).
//!
//! This crate contains business rules for inventory adjustments, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). Stock
//! itself is mutated by the backend when an adjustment is approved.

pub mod adjustment;

pub use adjustment::{
    AdjustmentDraft, AdjustmentId, AdjustmentItem, AdjustmentStatus, AdjustmentType,
    InventoryAdjustment, StockEffect, validate_adjustment,
};
