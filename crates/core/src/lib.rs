//! `retailerp-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod validation;
pub mod workflow;

pub use error::{DomainError, DomainResult, ErrorKind};
pub use id::{ProductId, StockId, UserId, VariantId};
pub use validation::{ValidationIssue, ValidationReport};
pub use workflow::Lifecycle;
