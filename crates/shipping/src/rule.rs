use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use retailerp_core::{DomainError, DomainResult, string_id};

string_id!(
    /// Shipping rule identifier (backend document id).
    ShippingRuleId,
    "ShippingRuleId"
);

/// How a rule turns a weight into a cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pricing {
    /// The rule's rate is the cost for any weight in its band.
    Flat,
    /// `rate` covers up to `base_weight`; every kilogram beyond costs `per_kg_rate`.
    Incremental {
        base_weight: Decimal,
        per_kg_rate: Decimal,
    },
}

/// A weight-banded shipping rule, covering `[min_weight, max_weight)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleDocument", into = "RuleDocument")]
pub struct ShippingRule {
    pub id: ShippingRuleId,
    pub name: String,
    pub min_weight: Decimal,
    pub max_weight: Decimal,
    pub rate: Decimal,
    pub pricing: Pricing,
    pub is_active: bool,
}

/// A rule that has not been persisted yet (create requests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleDocument", into = "RuleDocument")]
pub struct NewShippingRule {
    pub name: String,
    pub min_weight: Decimal,
    pub max_weight: Decimal,
    pub rate: Decimal,
    pub pricing: Pricing,
    pub is_active: bool,
}

impl ShippingRule {
    /// Whether `weight` falls inside the half-open band.
    pub fn contains(&self, weight: Decimal) -> bool {
        self.min_weight <= weight && weight < self.max_weight
    }

    /// Cost of shipping `weight` under this rule (band membership not checked).
    pub fn cost_for(&self, weight: Decimal) -> DomainResult<Decimal> {
        match self.pricing {
            Pricing::Flat => Ok(self.rate),
            Pricing::Incremental {
                base_weight,
                per_kg_rate,
            } => weight
                .checked_sub(base_weight)
                .map(|excess| excess.max(Decimal::ZERO))
                .and_then(|excess| excess.checked_mul(per_kg_rate))
                .and_then(|surcharge| self.rate.checked_add(surcharge))
                .ok_or_else(|| {
                    DomainError::validation(format!(
                        "shipping cost for weight {weight} under rule {} overflows",
                        self.name
                    ))
                }),
        }
    }

    pub fn is_incremental(&self) -> bool {
        matches!(self.pricing, Pricing::Incremental { .. })
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate_band(
            &self.name,
            self.min_weight,
            self.max_weight,
            self.rate,
            self.pricing,
        )
    }

    /// The editable part of the rule, e.g. to send back in an update request.
    pub fn to_new(&self) -> NewShippingRule {
        NewShippingRule {
            name: self.name.clone(),
            min_weight: self.min_weight,
            max_weight: self.max_weight,
            rate: self.rate,
            pricing: self.pricing,
            is_active: self.is_active,
        }
    }
}

impl NewShippingRule {
    pub fn validate(&self) -> DomainResult<()> {
        validate_band(
            &self.name,
            self.min_weight,
            self.max_weight,
            self.rate,
            self.pricing,
        )
    }

    pub fn with_id(self, id: ShippingRuleId) -> ShippingRule {
        ShippingRule {
            id,
            name: self.name,
            min_weight: self.min_weight,
            max_weight: self.max_weight,
            rate: self.rate,
            pricing: self.pricing,
            is_active: self.is_active,
        }
    }
}

fn validate_band(
    name: &str,
    min_weight: Decimal,
    max_weight: Decimal,
    rate: Decimal,
    pricing: Pricing,
) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("rule name cannot be empty"));
    }
    if min_weight < Decimal::ZERO {
        return Err(DomainError::validation("minWeight cannot be negative"));
    }
    if min_weight >= max_weight {
        return Err(DomainError::validation(
            "minWeight must be less than maxWeight",
        ));
    }
    if rate < Decimal::ZERO {
        return Err(DomainError::validation("rate cannot be negative"));
    }
    if let Pricing::Incremental {
        base_weight,
        per_kg_rate,
    } = pricing
    {
        if base_weight < Decimal::ZERO {
            return Err(DomainError::validation("baseWeight cannot be negative"));
        }
        if per_kg_rate < Decimal::ZERO {
            return Err(DomainError::validation("perKgRate cannot be negative"));
        }
    }
    Ok(())
}

/// Wire shape of a rule as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleDocument {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    min_weight: Decimal,
    max_weight: Decimal,
    rate: Decimal,
    #[serde(default)]
    is_incremental: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    per_kg_rate: Option<Decimal>,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

impl RuleDocument {
    fn pricing(&self) -> DomainResult<Pricing> {
        if !self.is_incremental {
            return Ok(Pricing::Flat);
        }
        match (self.base_weight, self.per_kg_rate) {
            (Some(base_weight), Some(per_kg_rate)) => Ok(Pricing::Incremental {
                base_weight,
                per_kg_rate,
            }),
            _ => Err(DomainError::validation(format!(
                "incremental rule '{}' requires baseWeight and perKgRate",
                self.name
            ))),
        }
    }

    fn from_parts(
        id: Option<String>,
        name: String,
        min_weight: Decimal,
        max_weight: Decimal,
        rate: Decimal,
        pricing: Pricing,
        is_active: bool,
    ) -> Self {
        let (is_incremental, base_weight, per_kg_rate) = match pricing {
            Pricing::Flat => (false, None, None),
            Pricing::Incremental {
                base_weight,
                per_kg_rate,
            } => (true, Some(base_weight), Some(per_kg_rate)),
        };
        Self {
            id,
            name,
            min_weight,
            max_weight,
            rate,
            is_incremental,
            base_weight,
            per_kg_rate,
            is_active,
        }
    }
}

impl TryFrom<RuleDocument> for ShippingRule {
    type Error = DomainError;

    fn try_from(doc: RuleDocument) -> Result<Self, Self::Error> {
        let pricing = doc.pricing()?;
        let id = doc
            .id
            .ok_or_else(|| DomainError::invalid_id("shipping rule without id"))?;
        Ok(Self {
            id: ShippingRuleId::new(id)?,
            name: doc.name,
            min_weight: doc.min_weight,
            max_weight: doc.max_weight,
            rate: doc.rate,
            pricing,
            is_active: doc.is_active,
        })
    }
}

impl From<ShippingRule> for RuleDocument {
    fn from(rule: ShippingRule) -> Self {
        RuleDocument::from_parts(
            Some(rule.id.into()),
            rule.name,
            rule.min_weight,
            rule.max_weight,
            rule.rate,
            rule.pricing,
            rule.is_active,
        )
    }
}

impl TryFrom<RuleDocument> for NewShippingRule {
    type Error = DomainError;

    fn try_from(doc: RuleDocument) -> Result<Self, Self::Error> {
        let pricing = doc.pricing()?;
        Ok(Self {
            name: doc.name,
            min_weight: doc.min_weight,
            max_weight: doc.max_weight,
            rate: doc.rate,
            pricing,
            is_active: doc.is_active,
        })
    }
}

impl From<NewShippingRule> for RuleDocument {
    fn from(rule: NewShippingRule) -> Self {
        RuleDocument::from_parts(
            None,
            rule.name,
            rule.min_weight,
            rule.max_weight,
            rule.rate,
            rule.pricing,
            rule.is_active,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn incremental() -> ShippingRule {
        NewShippingRule {
            name: "1-5kg".into(),
            min_weight: dec!(1),
            max_weight: dec!(5),
            rate: dec!(500),
            pricing: Pricing::Incremental {
                base_weight: dec!(1),
                per_kg_rate: dec!(80),
            },
            is_active: true,
        }
        .with_id(ShippingRuleId::new("r2").unwrap())
    }

    #[test]
    fn band_is_half_open() {
        let rule = incremental();
        assert!(rule.contains(dec!(1)));
        assert!(rule.contains(dec!(4.999)));
        assert!(!rule.contains(dec!(5)));
        assert!(!rule.contains(dec!(0.999)));
    }

    #[test]
    fn incremental_cost_never_drops_below_rate() {
        let rule = incremental();
        assert_eq!(rule.cost_for(dec!(1)).unwrap(), dec!(500));
        assert_eq!(rule.cost_for(dec!(2)).unwrap(), dec!(580));
        assert_eq!(rule.cost_for(dec!(0.5)).unwrap(), dec!(500));
    }

    #[test]
    fn overflowing_incremental_cost_is_a_validation_error() {
        let mut rule = incremental();
        rule.max_weight = Decimal::MAX;
        rule.pricing = Pricing::Incremental {
            base_weight: dec!(1),
            per_kg_rate: dec!(79228162514.26),
        };
        let err = rule.cost_for(Decimal::MAX / Decimal::from(2)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("overflows")));
    }

    #[test]
    fn validate_rejects_inverted_band() {
        let mut rule = incremental();
        rule.max_weight = dec!(1);
        assert!(matches!(rule.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn validate_rejects_negative_per_kg_rate() {
        let mut rule = incremental();
        rule.pricing = Pricing::Incremental {
            base_weight: dec!(1),
            per_kg_rate: dec!(-1),
        };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn parses_backend_document() {
        let json = r#"{
            "_id": "r1",
            "name": "Light parcels",
            "minWeight": 0,
            "maxWeight": 1,
            "rate": 300,
            "isIncremental": false,
            "isActive": true
        }"#;
        let rule: ShippingRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.id.as_str(), "r1");
        assert_eq!(rule.pricing, Pricing::Flat);
        assert_eq!(rule.rate, dec!(300));
    }

    #[test]
    fn incremental_document_without_per_kg_rate_is_rejected() {
        let json = r#"{
            "id": "r2",
            "name": "Heavy",
            "minWeight": 1,
            "maxWeight": 5,
            "rate": 500,
            "isIncremental": true,
            "baseWeight": 1
        }"#;
        let err = serde_json::from_str::<ShippingRule>(json).unwrap_err();
        assert!(err.to_string().contains("perKgRate"));
    }

    #[test]
    fn serializes_in_backend_shape() {
        let value = serde_json::to_value(incremental()).unwrap();
        assert_eq!(value["id"], "r2");
        assert_eq!(value["isIncremental"], true);
        assert_eq!(value["perKgRate"], 80.0);
        assert_eq!(value["minWeight"], 1.0);
    }

    #[test]
    fn new_rule_serializes_without_id() {
        let value = serde_json::to_value(incremental().to_new()).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["name"], "1-5kg");
    }
}
