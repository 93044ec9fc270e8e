use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use retailerp_core::{
    DomainError, DomainResult, Lifecycle, ProductId, StockId, ValidationReport, VariantId,
    string_id,
};

string_id!(
    /// Inventory adjustment identifier (backend document id).
    AdjustmentId,
    "AdjustmentId"
);

/// Kind of stock mutation an adjustment requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    Add,
    Remove,
    Damage,
    Return,
    Transfer,
}

impl AdjustmentType {
    pub fn requires_destination(self) -> bool {
        matches!(self, AdjustmentType::Transfer)
    }
}

/// Adjustment status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl core::fmt::Display for AdjustmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            AdjustmentStatus::Draft => "DRAFT",
            AdjustmentStatus::Submitted => "SUBMITTED",
            AdjustmentStatus::Approved => "APPROVED",
            AdjustmentStatus::Rejected => "REJECTED",
        })
    }
}

impl Lifecycle for AdjustmentStatus {
    const ENTITY: &'static str = "adjustment";
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (AdjustmentStatus::Draft, AdjustmentStatus::Submitted),
        (AdjustmentStatus::Submitted, AdjustmentStatus::Approved),
        (AdjustmentStatus::Submitted, AdjustmentStatus::Rejected),
    ];
}

/// One product/size line of an adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub size: String,
    pub quantity: i64,
    pub stock_id: StockId,
    /// Required for transfers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_stock_id: Option<StockId>,
}

/// User-editable part of an adjustment (create/update request body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentDraft {
    #[serde(rename = "type")]
    pub adjustment_type: AdjustmentType,
    pub items: Vec<AdjustmentItem>,
    pub reason: String,
}

/// Signed quantity change at one stock location, as the backend will apply it on approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockEffect {
    pub stock_id: StockId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub size: String,
    pub delta: i64,
}

/// Check a draft before it is sent anywhere.
///
/// Every problem is collected so the caller can show them all at once.
pub fn validate_adjustment(draft: &AdjustmentDraft) -> ValidationReport {
    let mut report = ValidationReport::new();

    if draft.reason.trim().is_empty() {
        report.push("reason", "reason cannot be empty");
    }

    if draft.items.is_empty() {
        report.push("items", "at least one item is required");
    }

    let transfer = draft.adjustment_type.requires_destination();
    for (idx, item) in draft.items.iter().enumerate() {
        if item.quantity <= 0 {
            report.push(format!("items[{idx}].quantity"), "quantity must be positive");
        }
        if item.size.trim().is_empty() {
            report.push(format!("items[{idx}].size"), "size cannot be empty");
        }

        let field = format!("items[{idx}].destinationStockId");
        match (&item.destination_stock_id, transfer) {
            (None, true) => report.push(field, "transfer items need a destination stock"),
            (Some(dest), true) if *dest == item.stock_id => {
                report.push(field, "destination stock must differ from source stock")
            }
            (Some(_), false) => {
                report.push(field, "only transfer adjustments take a destination stock")
            }
            _ => {}
        }
    }

    report
}

impl AdjustmentDraft {
    pub fn validate(&self) -> ValidationReport {
        validate_adjustment(self)
    }

    /// Per-location quantity changes implied by this draft.
    pub fn stock_effects(&self) -> Vec<StockEffect> {
        let mut effects = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let effect = |stock_id: &StockId, delta: i64| StockEffect {
                stock_id: stock_id.clone(),
                product_id: item.product_id.clone(),
                variant_id: item.variant_id.clone(),
                size: item.size.clone(),
                delta,
            };
            match self.adjustment_type {
                AdjustmentType::Add | AdjustmentType::Return => {
                    effects.push(effect(&item.stock_id, item.quantity))
                }
                AdjustmentType::Remove | AdjustmentType::Damage => {
                    effects.push(effect(&item.stock_id, -item.quantity))
                }
                AdjustmentType::Transfer => {
                    effects.push(effect(&item.stock_id, -item.quantity));
                    if let Some(dest) = &item.destination_stock_id {
                        effects.push(effect(dest, item.quantity));
                    }
                }
            }
        }
        effects
    }
}

/// An adjustment document as stored by the backend.
///
/// Content can only change while the document is `DRAFT`; status only moves
/// along the [`AdjustmentStatus`] transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAdjustment {
    #[serde(alias = "_id")]
    id: AdjustmentId,
    adjustment_number: String,
    #[serde(rename = "type")]
    adjustment_type: AdjustmentType,
    items: Vec<AdjustmentItem>,
    reason: String,
    status: AdjustmentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InventoryAdjustment {
    /// A freshly created document (status `DRAFT`).
    pub fn new_draft(
        id: AdjustmentId,
        adjustment_number: impl Into<String>,
        draft: AdjustmentDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            adjustment_number: adjustment_number.into(),
            adjustment_type: draft.adjustment_type,
            items: draft.items,
            reason: draft.reason,
            status: AdjustmentStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &AdjustmentId {
        &self.id
    }

    pub fn adjustment_number(&self) -> &str {
        &self.adjustment_number
    }

    pub fn adjustment_type(&self) -> AdjustmentType {
        self.adjustment_type
    }

    pub fn items(&self) -> &[AdjustmentItem] {
        &self.items
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn status(&self) -> AdjustmentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_editable(&self) -> bool {
        self.status == AdjustmentStatus::Draft
    }

    pub fn to_draft(&self) -> AdjustmentDraft {
        AdjustmentDraft {
            adjustment_type: self.adjustment_type,
            items: self.items.clone(),
            reason: self.reason.clone(),
        }
    }

    pub fn stock_effects(&self) -> Vec<StockEffect> {
        self.to_draft().stock_effects()
    }

    fn ensure_editable(&self) -> DomainResult<()> {
        if !self.is_editable() {
            return Err(DomainError::invariant(format!(
                "adjustment {} is {} and can no longer be edited",
                self.adjustment_number, self.status
            )));
        }
        Ok(())
    }

    /// Replace the item list (DRAFT only). The resulting draft must validate.
    pub fn replace_items(&mut self, items: Vec<AdjustmentItem>, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_editable()?;
        let candidate = AdjustmentDraft {
            adjustment_type: self.adjustment_type,
            items,
            reason: self.reason.clone(),
        };
        candidate.validate().into_result()?;
        self.items = candidate.items;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_reason(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_editable()?;
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::validation("reason cannot be empty"));
        }
        self.reason = reason;
        self.updated_at = now;
        Ok(())
    }

    /// Move to `next` if the transition table allows it.
    ///
    /// Submitting re-validates the content, so an invalid draft never leaves `DRAFT`.
    pub fn transition(&mut self, next: AdjustmentStatus, now: DateTime<Utc>) -> DomainResult<()> {
        let status = self.status.transition(next)?;
        if status == AdjustmentStatus::Submitted {
            self.to_draft().validate().into_result()?;
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    pub fn submit(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(AdjustmentStatus::Submitted, now)
    }

    pub fn approve(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(AdjustmentStatus::Approved, now)
    }

    pub fn reject(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(AdjustmentStatus::Rejected, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(id: &str) -> StockId {
        StockId::new(id).unwrap()
    }

    fn item(qty: i64) -> AdjustmentItem {
        AdjustmentItem {
            product_id: ProductId::new("p-100").unwrap(),
            variant_id: None,
            size: "M".into(),
            quantity: qty,
            stock_id: stock("main"),
            destination_stock_id: None,
        }
    }

    fn draft(kind: AdjustmentType, items: Vec<AdjustmentItem>) -> AdjustmentDraft {
        AdjustmentDraft {
            adjustment_type: kind,
            items,
            reason: "cycle count".into(),
        }
    }

    fn document(kind: AdjustmentType) -> InventoryAdjustment {
        InventoryAdjustment::new_draft(
            AdjustmentId::new("adj-1").unwrap(),
            "ADJ-0001",
            draft(kind, vec![item(3)]),
            Utc::now(),
        )
    }

    #[test]
    fn valid_add_draft_passes() {
        assert!(validate_adjustment(&draft(AdjustmentType::Add, vec![item(5)])).is_valid());
    }

    #[test]
    fn empty_items_and_blank_reason_are_both_reported() {
        let mut d = draft(AdjustmentType::Remove, vec![]);
        d.reason = "   ".into();
        let report = validate_adjustment(&d);
        assert!(report.has_issue_for("items"));
        assert!(report.has_issue_for("reason"));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let report = validate_adjustment(&draft(AdjustmentType::Damage, vec![item(0), item(-2)]));
        assert!(report.has_issue_for("items[0].quantity"));
        assert!(report.has_issue_for("items[1].quantity"));
    }

    #[test]
    fn transfer_needs_a_destination() {
        let report = validate_adjustment(&draft(AdjustmentType::Transfer, vec![item(1)]));
        assert!(report.has_issue_for("items[0].destinationStockId"));
    }

    #[test]
    fn transfer_to_same_stock_is_rejected() {
        let mut line = item(1);
        line.destination_stock_id = Some(stock("main"));
        let report = validate_adjustment(&draft(AdjustmentType::Transfer, vec![line]));
        assert!(!report.is_valid());
        assert!(matches!(report.into_result(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn transfer_to_other_stock_is_accepted() {
        let mut line = item(1);
        line.destination_stock_id = Some(stock("outlet"));
        assert!(validate_adjustment(&draft(AdjustmentType::Transfer, vec![line])).is_valid());
    }

    #[test]
    fn destination_on_non_transfer_is_rejected() {
        let mut line = item(1);
        line.destination_stock_id = Some(stock("outlet"));
        let report = validate_adjustment(&draft(AdjustmentType::Add, vec![line]));
        assert!(report.has_issue_for("items[0].destinationStockId"));
    }

    #[test]
    fn workflow_draft_submit_approve() {
        let mut adj = document(AdjustmentType::Add);
        adj.submit(Utc::now()).unwrap();
        assert_eq!(adj.status(), AdjustmentStatus::Submitted);
        adj.approve(Utc::now()).unwrap();
        assert_eq!(adj.status(), AdjustmentStatus::Approved);
        assert!(adj.status().is_terminal());
    }

    #[test]
    fn cannot_approve_a_draft() {
        let mut adj = document(AdjustmentType::Add);
        let err = adj.approve(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { entity: "adjustment", .. }));
        assert_eq!(adj.status(), AdjustmentStatus::Draft);
    }

    #[test]
    fn rejected_is_terminal() {
        let mut adj = document(AdjustmentType::Add);
        adj.submit(Utc::now()).unwrap();
        adj.reject(Utc::now()).unwrap();
        assert!(adj.submit(Utc::now()).is_err());
        assert!(adj.approve(Utc::now()).is_err());
    }

    #[test]
    fn invalid_draft_cannot_be_submitted() {
        let mut adj = InventoryAdjustment::new_draft(
            AdjustmentId::new("adj-2").unwrap(),
            "ADJ-0002",
            draft(AdjustmentType::Transfer, vec![item(1)]),
            Utc::now(),
        );
        assert!(matches!(adj.submit(Utc::now()), Err(DomainError::Validation(_))));
        assert_eq!(adj.status(), AdjustmentStatus::Draft);
    }

    #[test]
    fn items_are_frozen_after_submission() {
        let mut adj = document(AdjustmentType::Remove);
        adj.replace_items(vec![item(7)], Utc::now()).unwrap();
        assert_eq!(adj.items()[0].quantity, 7);

        adj.submit(Utc::now()).unwrap();
        let err = adj.replace_items(vec![item(1)], Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert!(adj.set_reason("other", Utc::now()).is_err());
    }

    #[test]
    fn replace_items_validates_the_new_content() {
        let mut adj = document(AdjustmentType::Add);
        assert!(adj.replace_items(vec![], Utc::now()).is_err());
        assert_eq!(adj.items().len(), 1);
    }

    #[test]
    fn transfer_effects_move_stock_between_locations() {
        let mut line = item(4);
        line.destination_stock_id = Some(stock("outlet"));
        let effects = draft(AdjustmentType::Transfer, vec![line]).stock_effects();
        assert_eq!(effects.len(), 2);
        assert_eq!((effects[0].stock_id.as_str(), effects[0].delta), ("main", -4));
        assert_eq!((effects[1].stock_id.as_str(), effects[1].delta), ("outlet", 4));
        assert_eq!(effects.iter().map(|e| e.delta).sum::<i64>(), 0);
    }

    #[test]
    fn damage_effects_decrease_stock() {
        let effects = document(AdjustmentType::Damage).stock_effects();
        assert_eq!(effects[0].delta, -3);
    }

    #[test]
    fn parses_backend_document() {
        let json = r#"{
            "_id": "65f0c0ffee",
            "adjustmentNumber": "ADJ-2024-0042",
            "type": "transfer",
            "items": [{
                "productId": "p-1",
                "size": "L",
                "quantity": 2,
                "stockId": "main",
                "destinationStockId": "outlet"
            }],
            "reason": "rebalance",
            "status": "SUBMITTED",
            "createdAt": "2024-03-12T08:00:00Z",
            "updatedAt": "2024-03-12T09:30:00Z"
        }"#;
        let adj: InventoryAdjustment = serde_json::from_str(json).unwrap();
        assert_eq!(adj.id().as_str(), "65f0c0ffee");
        assert_eq!(adj.adjustment_type(), AdjustmentType::Transfer);
        assert_eq!(adj.status(), AdjustmentStatus::Submitted);
        assert_eq!(adj.items()[0].destination_stock_id, Some(stock("outlet")));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: transfer effects always net to zero across locations.
            #[test]
            fn transfer_effects_net_to_zero(quantities in proptest::collection::vec(1i64..1_000, 1..20)) {
                let items = quantities
                    .iter()
                    .map(|&q| {
                        let mut line = item(q);
                        line.destination_stock_id = Some(stock("outlet"));
                        line
                    })
                    .collect();
                let d = draft(AdjustmentType::Transfer, items);
                prop_assert!(d.validate().is_valid());
                prop_assert_eq!(d.stock_effects().iter().map(|e| e.delta).sum::<i64>(), 0);
            }
        }
    }
}
