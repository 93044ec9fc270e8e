//! Inventory adjustment documents.

use chrono::Utc;
use serde::Serialize;

use retailerp_auth::Permission;
use retailerp_inventory::{
    AdjustmentDraft, AdjustmentId, AdjustmentItem, AdjustmentStatus, InventoryAdjustment,
};

use crate::context::AppContext;
use crate::error::ClientResult;

#[derive(Debug, Serialize)]
pub(crate) struct StatusChange<S> {
    pub(crate) status: S,
}

impl AppContext {
    pub async fn list_adjustments(
        &self,
        status: Option<AdjustmentStatus>,
    ) -> ClientResult<Vec<InventoryAdjustment>> {
        let path = match status {
            Some(status) => format!("/inventory/adjustments?status={status}"),
            None => "/inventory/adjustments".to_string(),
        };
        self.api.get(&path).await
    }

    pub async fn get_adjustment(&self, id: &AdjustmentId) -> ClientResult<InventoryAdjustment> {
        self.api.get(&format!("/inventory/adjustments/{id}")).await
    }

    /// Validate `draft` locally, then create it on the backend (status `DRAFT`).
    pub async fn create_adjustment(&self, draft: &AdjustmentDraft) -> ClientResult<InventoryAdjustment> {
        draft.validate().into_result()?;
        self.require(&Permission::ADJUSTMENTS_WRITE).await?;
        let _guard = self.begin("adjustment.create")?;

        let created: InventoryAdjustment = self.api.post("/inventory/adjustments", draft).await?;
        tracing::info!(
            adjustment = created.adjustment_number(),
            kind = ?created.adjustment_type(),
            items = created.items().len(),
            "adjustment created"
        );
        Ok(created)
    }

    /// Replace the items of a DRAFT adjustment.
    pub async fn update_adjustment_items(
        &self,
        current: &InventoryAdjustment,
        items: Vec<AdjustmentItem>,
    ) -> ClientResult<InventoryAdjustment> {
        let mut edited = current.clone();
        edited.replace_items(items, Utc::now())?;
        self.require(&Permission::ADJUSTMENTS_WRITE).await?;
        let _guard = self.begin(format!("adjustment.update:{}", current.id()))?;

        let path = format!("/inventory/adjustments/{}", current.id());
        self.api.put(&path, &edited.to_draft()).await
    }

    pub async fn submit_adjustment(&self, current: &InventoryAdjustment) -> ClientResult<InventoryAdjustment> {
        self.require(&Permission::ADJUSTMENTS_WRITE).await?;
        self.change_adjustment_status(current, AdjustmentStatus::Submitted).await
    }

    pub async fn approve_adjustment(&self, current: &InventoryAdjustment) -> ClientResult<InventoryAdjustment> {
        self.require(&Permission::ADJUSTMENTS_APPROVE).await?;
        self.change_adjustment_status(current, AdjustmentStatus::Approved).await
    }

    pub async fn reject_adjustment(&self, current: &InventoryAdjustment) -> ClientResult<InventoryAdjustment> {
        self.require(&Permission::ADJUSTMENTS_APPROVE).await?;
        self.change_adjustment_status(current, AdjustmentStatus::Rejected).await
    }

    async fn change_adjustment_status(
        &self,
        current: &InventoryAdjustment,
        next: AdjustmentStatus,
    ) -> ClientResult<InventoryAdjustment> {
        // Dry-run locally so invalid transitions never reach the backend.
        current.clone().transition(next, Utc::now())?;
        let _guard = self.begin(format!("adjustment.status:{}", current.id()))?;

        let path = format!("/inventory/adjustments/{}/status", current.id());
        let updated: InventoryAdjustment = self.api.put(&path, &StatusChange { status: next }).await?;
        tracing::info!(
            adjustment = updated.adjustment_number(),
            status = %updated.status(),
            "adjustment status changed"
        );
        Ok(updated)
    }
}
