//! Shipping domain module (weight-banded rate rules).
//!
//! Pure decision logic: the caller supplies the rule set (fetched from the
//! backend) and gets back a cost, never performing IO here.

pub mod resolver;
pub mod rule;

pub use resolver::{
    ChargeSource, FallbackPolicy, RuleOverlap, ShippingCharge, ShippingQuote, detect_overlaps,
    resolve_shipping_cost, resolve_with_fallback,
};
pub use rule::{NewShippingRule, Pricing, ShippingRule, ShippingRuleId};
