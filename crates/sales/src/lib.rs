//! Sales domain module (store exchanges).
//!
//! This crate contains business rules for exchanges, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod exchange;

pub use exchange::{
    ExchangeDirection, ExchangeId, ExchangeItem, ExchangeRecord, ExchangeStatus, ExchangeSummary,
    NewExchange, OrderId, compute_exchange,
};
