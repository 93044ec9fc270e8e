//! Purchase orders and Goods Received Notes.

use chrono::Utc;

use retailerp_auth::Permission;
use retailerp_purchasing::{
    FinalizedGrn, Grn, GrnId, GrnStatus, PurchaseOrder, PurchaseOrderId, ReceiptWarning,
    ReceivedLine, StockApplication, StockApplier, build_grn_from_po, finalize_grn,
};

use crate::adjustments::StatusChange;
use crate::context::AppContext;
use crate::error::{ClientError, ClientResult};

impl AppContext {
    pub async fn get_purchase_order(&self, id: &PurchaseOrderId) -> ClientResult<PurchaseOrder> {
        self.api.get(&format!("/purchase-orders/{id}")).await
    }

    pub async fn list_grns(&self) -> ClientResult<Vec<Grn>> {
        self.api.get("/grns").await
    }

    pub async fn get_grn(&self, id: &GrnId) -> ClientResult<Grn> {
        self.api.get(&format!("/grns/{id}")).await
    }

    /// Reconcile `received` against `po` and create the GRN (status `DRAFT`).
    ///
    /// Over-receipts are logged but do not block creation.
    pub async fn create_grn(&self, po: &PurchaseOrder, received: &[ReceivedLine]) -> ClientResult<Grn> {
        let draft = build_grn_from_po(po, received)?;
        self.require(&Permission::GRN_WRITE).await?;
        for warning in &draft.warnings {
            match warning {
                ReceiptWarning::OverReceipt {
                    line,
                    product_id,
                    outstanding,
                    received,
                } => tracing::warn!(
                    po = %po.po_number,
                    line,
                    product_id = %product_id,
                    outstanding,
                    received,
                    "over-receipt"
                ),
            }
        }
        let _guard = self.begin(format!("grn.create:{}", po.id))?;

        let grn: Grn = self.api.post("/grns", &draft).await?;
        tracing::info!(
            grn = grn.grn_number(),
            po = grn.po_number(),
            total = %grn.total_amount(),
            partial = draft.is_partial(),
            "grn created"
        );
        Ok(grn)
    }

    pub async fn submit_grn(&self, grn: &Grn) -> ClientResult<Grn> {
        self.require(&Permission::GRN_WRITE).await?;
        self.change_grn_status(grn, GrnStatus::Submitted).await
    }

    pub async fn approve_grn(&self, grn: &Grn) -> ClientResult<Grn> {
        self.require(&Permission::GRN_APPROVE).await?;
        self.change_grn_status(grn, GrnStatus::Approved).await
    }

    pub async fn reject_grn(&self, grn: &Grn) -> ClientResult<Grn> {
        self.require(&Permission::GRN_APPROVE).await?;
        self.change_grn_status(grn, GrnStatus::Rejected).await
    }

    /// Apply an approved GRN's stock exactly once and return the completed document.
    ///
    /// A GRN that already reports `inventoryUpdated` comes back unchanged with
    /// `inventory_applied = false` and no request is sent. The GRN number is
    /// sent as `Idempotency-Key`; a 409 surfaces as [`ClientError::Conflict`].
    pub async fn finalize_grn(&self, grn: &Grn) -> ClientResult<FinalizedGrn> {
        let mut applier = BackendStockApplier {
            ctx: self,
            applied: None,
        };
        let finalized = finalize_grn(grn.clone(), &mut applier, Utc::now()).await?;
        match applier.applied {
            Some(applied) => Ok(FinalizedGrn {
                grn: applied,
                inventory_applied: true,
            }),
            None => {
                tracing::info!(grn = grn.grn_number(), "stock already applied; nothing to do");
                Ok(finalized)
            }
        }
    }

    async fn change_grn_status(&self, grn: &Grn, next: GrnStatus) -> ClientResult<Grn> {
        grn.clone().transition(next, Utc::now())?;
        let _guard = self.begin(format!("grn.status:{}", grn.id()))?;

        let path = format!("/grns/{}/status", grn.id());
        let updated: Grn = self.api.put(&path, &StatusChange { status: next }).await?;
        tracing::info!(grn = updated.grn_number(), status = %updated.status(), "grn status changed");
        Ok(updated)
    }
}

/// Applies GRN stock through `POST /grns/{id}/apply-inventory`, keeping the
/// document the backend returns.
struct BackendStockApplier<'a> {
    ctx: &'a AppContext,
    applied: Option<Grn>,
}

impl StockApplier for BackendStockApplier<'_> {
    type Error = ClientError;

    async fn apply(&mut self, application: &StockApplication) -> ClientResult<()> {
        self.ctx.require(&Permission::GRN_WRITE).await?;
        let _guard = self.ctx.begin(format!("grn.finalize:{}", application.grn_id))?;

        let path = format!("/grns/{}/apply-inventory", application.grn_id);
        let applied: Grn = self
            .ctx
            .api
            .post_idempotent(&path, application, &application.idempotency_key)
            .await?;

        if !applied.inventory_updated() || applied.status() != GrnStatus::Completed {
            return Err(ClientError::Schema {
                endpoint: format!("POST {path}"),
                detail: format!(
                    "expected a completed grn with inventoryUpdated, got status {} inventoryUpdated={}",
                    applied.status(),
                    applied.inventory_updated()
                ),
            });
        }

        tracing::info!(
            grn = applied.grn_number(),
            receipts = application.receipts.len(),
            "grn stock applied"
        );
        self.applied = Some(applied);
        Ok(())
    }
}
