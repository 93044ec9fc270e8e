//! Weight-banded shipping cost resolution.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use retailerp_core::{DomainError, DomainResult};

use crate::rule::{ShippingRule, ShippingRuleId};

/// Cost selected for a parcel and the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuote {
    pub rate: Decimal,
    pub rule_id: ShippingRuleId,
}

/// Two active rules whose bands intersect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOverlap {
    pub first: ShippingRuleId,
    pub second: ShippingRuleId,
}

/// What to do when no active rule covers a weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Surface [`DomainError::NoMatchingRule`]; the order cannot be priced.
    Reject,
    /// Charge a fixed amount instead.
    FlatRate(Decimal),
}

/// Where a charge came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeSource {
    Rule(ShippingRuleId),
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingCharge {
    pub amount: Decimal,
    pub source: ChargeSource,
}

/// Resolve the shipping cost for `weight` against `rules`.
///
/// Only active rules whose `[min_weight, max_weight)` band contains the weight
/// are candidates. When several candidates overlap, the one with the smallest
/// `min_weight` wins (input order breaks remaining ties) and the overlap is
/// logged as a configuration problem.
pub fn resolve_shipping_cost(weight: Decimal, rules: &[ShippingRule]) -> DomainResult<ShippingQuote> {
    if weight < Decimal::ZERO {
        return Err(DomainError::validation("weight cannot be negative"));
    }

    let mut candidates: Vec<&ShippingRule> = rules
        .iter()
        .filter(|rule| rule.is_active && rule.contains(weight))
        .collect();
    // Stable: equal min_weight keeps the caller's order.
    candidates.sort_by(|a, b| a.min_weight.cmp(&b.min_weight));

    let Some(selected) = candidates.first() else {
        return Err(DomainError::no_matching_rule(weight));
    };

    if candidates.len() > 1 {
        let overlapping: Vec<&str> = candidates.iter().map(|r| r.id.as_str()).collect();
        tracing::warn!(
            %weight,
            selected = %selected.id,
            ?overlapping,
            "overlapping active shipping rules"
        );
    }

    Ok(ShippingQuote {
        rate: selected.cost_for(weight)?,
        rule_id: selected.id.clone(),
    })
}

/// Resolve with an explicit policy for weights no rule covers.
pub fn resolve_with_fallback(
    weight: Decimal,
    rules: &[ShippingRule],
    policy: FallbackPolicy,
) -> DomainResult<ShippingCharge> {
    match (resolve_shipping_cost(weight, rules), policy) {
        (Ok(quote), _) => Ok(ShippingCharge {
            amount: quote.rate,
            source: ChargeSource::Rule(quote.rule_id),
        }),
        (Err(DomainError::NoMatchingRule { .. }), FallbackPolicy::FlatRate(amount)) => {
            tracing::info!(%weight, %amount, "no shipping rule matched; using fallback rate");
            Ok(ShippingCharge {
                amount,
                source: ChargeSource::Fallback,
            })
        }
        (Err(err), _) => Err(err),
    }
}

/// List every pair of active rules whose bands intersect.
pub fn detect_overlaps(rules: &[ShippingRule]) -> Vec<RuleOverlap> {
    let active: Vec<&ShippingRule> = rules.iter().filter(|r| r.is_active).collect();
    let mut overlaps = Vec::new();
    for (i, a) in active.iter().enumerate() {
        for b in &active[i + 1..] {
            if a.min_weight < b.max_weight && b.min_weight < a.max_weight {
                overlaps.push(RuleOverlap {
                    first: a.id.clone(),
                    second: b.id.clone(),
                });
            }
        }
    }
    overlaps
}
