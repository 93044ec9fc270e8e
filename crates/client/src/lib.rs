//! Typed client for the RetailERP backend.
//!
//! Every operation validates input with the domain crates before it sends
//! anything, and parses responses into explicit schemas at the boundary.

pub mod adjustments;
pub mod busy;
pub mod config;
pub mod context;
pub mod error;
pub mod exchanges;
pub mod http;
pub mod purchasing;
pub mod reference;
pub mod shipping;

pub use busy::{BusyGuard, InFlight};
pub use config::ClientConfig;
pub use context::AppContext;
pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use reference::StockLocation;
