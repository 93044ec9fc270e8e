//! Shipping rule maintenance and checkout quotes.

use rust_decimal::Decimal;

use retailerp_auth::Permission;
use retailerp_shipping::{
    FallbackPolicy, NewShippingRule, ShippingCharge, ShippingQuote, ShippingRule,
    ShippingRuleId, detect_overlaps, resolve_shipping_cost, resolve_with_fallback,
};

use crate::context::AppContext;
use crate::error::ClientResult;

impl AppContext {
    /// Cached shipping rules, fetched on first use.
    pub async fn shipping_rules(&self) -> ClientResult<Vec<ShippingRule>> {
        if let Some(rules) = self.shipping_rules.read().await.as_ref() {
            return Ok(rules.clone());
        }
        self.refresh_shipping_rules().await
    }

    pub async fn refresh_shipping_rules(&self) -> ClientResult<Vec<ShippingRule>> {
        let rules: Vec<ShippingRule> = self.api.get("/shipping-rules").await?;
        for overlap in detect_overlaps(&rules) {
            tracing::warn!(
                first = %overlap.first,
                second = %overlap.second,
                "shipping rules overlap"
            );
        }
        *self.shipping_rules.write().await = Some(rules.clone());
        Ok(rules)
    }

    pub async fn create_shipping_rule(&self, rule: &NewShippingRule) -> ClientResult<ShippingRule> {
        rule.validate()?;
        self.require(&Permission::SHIPPING_MANAGE).await?;
        let _guard = self.begin("shipping-rule.create")?;

        let created: ShippingRule = self.api.post("/shipping-rules", rule).await?;
        tracing::info!(rule_id = %created.id, "shipping rule created");
        self.invalidate_shipping_rules().await;
        Ok(created)
    }

    pub async fn update_shipping_rule(&self, rule: &ShippingRule) -> ClientResult<ShippingRule> {
        rule.validate()?;
        self.require(&Permission::SHIPPING_MANAGE).await?;
        let _guard = self.begin(format!("shipping-rule.update:{}", rule.id))?;

        let path = format!("/shipping-rules/{}", rule.id);
        let updated: ShippingRule = self.api.put(&path, &rule.to_new()).await?;
        self.invalidate_shipping_rules().await;
        Ok(updated)
    }

    pub async fn delete_shipping_rule(&self, id: &ShippingRuleId) -> ClientResult<()> {
        self.require(&Permission::SHIPPING_MANAGE).await?;
        let _guard = self.begin(format!("shipping-rule.delete:{id}"))?;

        self.api.delete(&format!("/shipping-rules/{id}")).await?;
        tracing::info!(rule_id = %id, "shipping rule deleted");
        self.invalidate_shipping_rules().await;
        Ok(())
    }

    /// Price a parcel against the current rule set.
    pub async fn quote(&self, weight: Decimal) -> ClientResult<ShippingQuote> {
        let rules = self.shipping_rules().await?;
        Ok(resolve_shipping_cost(weight, &rules)?)
    }

    /// Like [`AppContext::quote`], applying `policy` when no rule matches.
    pub async fn quote_with_fallback(
        &self,
        weight: Decimal,
        policy: FallbackPolicy,
    ) -> ClientResult<ShippingCharge> {
        let rules = self.shipping_rules().await?;
        Ok(resolve_with_fallback(weight, &rules, policy)?)
    }

    async fn invalidate_shipping_rules(&self) {
        *self.shipping_rules.write().await = None;
    }
}
