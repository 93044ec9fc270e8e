//! Goods Received Notes: reconciling what a supplier delivered against the
//! purchase order, and applying the receipt to stock exactly once.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use retailerp_core::{
    DomainError, DomainResult, Lifecycle, ProductId, StockId, VariantId, string_id,
};

use crate::order::{PurchaseOrder, PurchaseOrderId};

string_id!(
    /// GRN identifier (backend document id).
    GrnId,
    "GrnId"
);

/// GRN status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrnStatus {
    Draft,
    Submitted,
    Approved,
    Completed,
    Rejected,
}

impl core::fmt::Display for GrnStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            GrnStatus::Draft => "DRAFT",
            GrnStatus::Submitted => "SUBMITTED",
            GrnStatus::Approved => "APPROVED",
            GrnStatus::Completed => "COMPLETED",
            GrnStatus::Rejected => "REJECTED",
        })
    }
}

impl Lifecycle for GrnStatus {
    const ENTITY: &'static str = "grn";
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (GrnStatus::Draft, GrnStatus::Submitted),
        (GrnStatus::Draft, GrnStatus::Rejected),
        (GrnStatus::Submitted, GrnStatus::Approved),
        (GrnStatus::Submitted, GrnStatus::Rejected),
        (GrnStatus::Approved, GrnStatus::Completed),
    ];
}

/// `unit_cost x quantity`, failing instead of overflowing.
fn line_cost(unit_cost: Decimal, quantity: i64) -> DomainResult<Decimal> {
    unit_cost
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| DomainError::validation(format!("line cost {unit_cost} x {quantity} overflows")))
}

fn sum_line_costs<'a>(items: impl IntoIterator<Item = &'a GrnItem>) -> DomainResult<Decimal> {
    items.into_iter().try_fold(Decimal::ZERO, |acc, item| {
        acc.checked_add(item.total_cost)
            .ok_or_else(|| DomainError::validation("grn total amount overflows"))
    })
}

/// One received line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrnItem {
    product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variant_id: Option<VariantId>,
    #[serde(default)]
    size: String,
    ordered_quantity: i64,
    /// Taken in by earlier GRNs against the same order line.
    #[serde(default)]
    previously_received: i64,
    received_quantity: i64,
    unit_cost: Decimal,
    total_cost: Decimal,
    stock_id: StockId,
}

impl GrnItem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        product_id: ProductId,
        variant_id: Option<VariantId>,
        size: impl Into<String>,
        ordered_quantity: i64,
        previously_received: i64,
        received_quantity: i64,
        unit_cost: Decimal,
        stock_id: StockId,
    ) -> DomainResult<Self> {
        Ok(Self {
            product_id,
            variant_id,
            size: size.into(),
            ordered_quantity,
            previously_received,
            received_quantity,
            unit_cost,
            total_cost: line_cost(unit_cost, received_quantity)?,
            stock_id,
        })
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn variant_id(&self) -> Option<&VariantId> {
        self.variant_id.as_ref()
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn ordered_quantity(&self) -> i64 {
        self.ordered_quantity
    }

    pub fn previously_received(&self) -> i64 {
        self.previously_received
    }

    /// Still expected before this receipt (never negative).
    pub fn outstanding(&self) -> i64 {
        self.ordered_quantity.saturating_sub(self.previously_received).max(0)
    }

    pub fn received_quantity(&self) -> i64 {
        self.received_quantity
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn total_cost(&self) -> Decimal {
        self.total_cost
    }

    pub fn stock_id(&self) -> &StockId {
        &self.stock_id
    }

    pub fn set_received_quantity(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity < 0 {
            return Err(DomainError::validation("received quantity cannot be negative"));
        }
        self.total_cost = line_cost(self.unit_cost, quantity)?;
        self.received_quantity = quantity;
        Ok(())
    }

    /// More arrived than was still outstanding on the order line.
    pub fn is_over_received(&self) -> bool {
        self.received_quantity > self.outstanding()
    }
}

/// User override of the received quantity for one purchase-order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedLine {
    /// Index into [`PurchaseOrder::lines`].
    pub line: usize,
    pub received_quantity: i64,
}

/// Soft problems with a receipt; they do not block the GRN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptWarning {
    /// More goods arrived than were still outstanding on the order.
    OverReceipt {
        line: usize,
        product_id: ProductId,
        outstanding: i64,
        received: i64,
    },
}

/// Per-line reconciliation of the order against this receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDelta {
    pub line: usize,
    pub product_id: ProductId,
    pub ordered: i64,
    pub previously_received: i64,
    pub received_now: i64,
    /// Still outstanding after this receipt (never negative).
    pub remaining: i64,
}

/// A GRN assembled on the client, ready to be created on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrnDraft {
    pub purchase_order_id: PurchaseOrderId,
    pub po_number: String,
    pub items: Vec<GrnItem>,
    pub total_amount: Decimal,
    #[serde(skip)]
    pub warnings: Vec<ReceiptWarning>,
    #[serde(skip)]
    pub deltas: Vec<LineDelta>,
}

impl GrnDraft {
    /// Whether any order line remains outstanding after this receipt.
    pub fn is_partial(&self) -> bool {
        self.deltas.iter().any(|d| d.remaining > 0)
    }
}

/// Build a GRN from a purchase order and the quantities actually received.
///
/// Lines without an override default to their outstanding quantity. Lines that
/// end up with nothing received are left out of the GRN but still reported in
/// [`GrnDraft::deltas`].
pub fn build_grn_from_po(po: &PurchaseOrder, received: &[ReceivedLine]) -> DomainResult<GrnDraft> {
    if !po.accepts_receipts() {
        return Err(DomainError::invariant(format!(
            "purchase order {} does not accept receipts in its current status",
            po.po_number
        )));
    }

    for r in received {
        if r.line >= po.lines.len() {
            return Err(DomainError::validation(format!(
                "received line {} does not exist on purchase order {}",
                r.line, po.po_number
            )));
        }
        if r.received_quantity < 0 {
            return Err(DomainError::validation(format!(
                "received quantity for line {} cannot be negative",
                r.line
            )));
        }
    }

    let mut items = Vec::new();
    let mut warnings = Vec::new();
    let mut deltas = Vec::with_capacity(po.lines.len());

    for (idx, line) in po.lines.iter().enumerate() {
        let outstanding = line.outstanding();
        // Last override for a line wins.
        let received_now = received
            .iter()
            .rev()
            .find(|r| r.line == idx)
            .map(|r| r.received_quantity)
            .unwrap_or(outstanding);

        if received_now > outstanding {
            warnings.push(ReceiptWarning::OverReceipt {
                line: idx,
                product_id: line.product_id.clone(),
                outstanding,
                received: received_now,
            });
        }

        deltas.push(LineDelta {
            line: idx,
            product_id: line.product_id.clone(),
            ordered: line.ordered_quantity,
            previously_received: line.received_quantity,
            received_now,
            remaining: (outstanding - received_now).max(0),
        });

        if received_now > 0 {
            items.push(GrnItem::new(
                line.product_id.clone(),
                line.variant_id.clone(),
                line.size.clone(),
                line.ordered_quantity,
                line.received_quantity,
                received_now,
                line.unit_cost,
                line.stock_id.clone(),
            )?);
        }
    }

    if items.is_empty() {
        return Err(DomainError::validation(format!(
            "nothing received against purchase order {}",
            po.po_number
        )));
    }

    let total_amount = sum_line_costs(&items)?;

    Ok(GrnDraft {
        purchase_order_id: po.id.clone(),
        po_number: po.po_number.clone(),
        items,
        total_amount,
        warnings,
        deltas,
    })
}

/// Quantity to add at one stock location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReceipt {
    pub stock_id: StockId,
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub size: String,
    pub quantity: i64,
}

/// The stock increase a GRN applies, keyed for idempotent submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockApplication {
    pub grn_id: GrnId,
    /// Sent as the `Idempotency-Key`; the GRN number is unique per document.
    pub idempotency_key: String,
    pub receipts: Vec<StockReceipt>,
}

/// Outcome of planning a finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizePlan {
    /// Stock was applied before; nothing must be requested again.
    AlreadyApplied,
    Apply(StockApplication),
}

/// Performs the stock increase for a GRN (usually the backend).
pub trait StockApplier {
    type Error: From<DomainError>;

    fn apply(&mut self, application: &StockApplication) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedGrn {
    pub grn: Grn,
    /// `true` only for the call that actually applied stock.
    pub inventory_applied: bool,
}

/// A GRN document as stored by the backend.
///
/// Deserializing rejects documents whose line costs or total disagree
/// with their quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "GrnDocument")]
pub struct Grn {
    #[serde(alias = "_id")]
    id: GrnId,
    grn_number: String,
    purchase_order_id: PurchaseOrderId,
    #[serde(default)]
    po_number: String,
    items: Vec<GrnItem>,
    total_amount: Decimal,
    #[serde(default)]
    inventory_updated: bool,
    status: GrnStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Grn {
    /// The document the backend returns after creating `draft`.
    pub fn from_draft(id: GrnId, grn_number: impl Into<String>, draft: GrnDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            grn_number: grn_number.into(),
            purchase_order_id: draft.purchase_order_id,
            po_number: draft.po_number,
            items: draft.items,
            total_amount: draft.total_amount,
            inventory_updated: false,
            status: GrnStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &GrnId {
        &self.id
    }

    pub fn grn_number(&self) -> &str {
        &self.grn_number
    }

    pub fn purchase_order_id(&self) -> &PurchaseOrderId {
        &self.purchase_order_id
    }

    pub fn po_number(&self) -> &str {
        &self.po_number
    }

    pub fn items(&self) -> &[GrnItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn inventory_updated(&self) -> bool {
        self.inventory_updated
    }

    pub fn status(&self) -> GrnStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sum of line totals, recomputed from the items.
    pub fn computed_total(&self) -> DomainResult<Decimal> {
        sum_line_costs(&self.items)
    }

    pub fn over_received_items(&self) -> impl Iterator<Item = &GrnItem> {
        self.items.iter().filter(|i| i.is_over_received())
    }

    /// Change a line's received quantity (DRAFT only); totals follow.
    pub fn set_received_quantity(&mut self, line: usize, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != GrnStatus::Draft {
            return Err(DomainError::invariant(format!(
                "grn {} is {} and can no longer be edited",
                self.grn_number, self.status
            )));
        }
        let mut items = self.items.clone();
        items
            .get_mut(line)
            .ok_or_else(|| DomainError::validation(format!("grn line {line} does not exist")))?
            .set_received_quantity(quantity)?;
        self.total_amount = sum_line_costs(&items)?;
        self.items = items;
        self.updated_at = now;
        Ok(())
    }

    pub fn transition(&mut self, next: GrnStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if next == GrnStatus::Completed {
            return Err(DomainError::invariant(
                "a grn is completed by applying its stock, not by a status change",
            ));
        }
        self.status = self.status.transition(next)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn submit(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(GrnStatus::Submitted, now)
    }

    pub fn approve(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(GrnStatus::Approved, now)
    }

    pub fn reject(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(GrnStatus::Rejected, now)
    }

    /// Decide whether finalizing must request a stock application.
    pub fn plan_finalize(&self) -> DomainResult<FinalizePlan> {
        if self.inventory_updated {
            return Ok(FinalizePlan::AlreadyApplied);
        }
        self.status.transition(GrnStatus::Completed)?;

        let receipts = self
            .items
            .iter()
            .filter(|i| i.received_quantity > 0)
            .map(|i| StockReceipt {
                stock_id: i.stock_id.clone(),
                product_id: i.product_id.clone(),
                variant_id: i.variant_id.clone(),
                size: i.size.clone(),
                quantity: i.received_quantity,
            })
            .collect();

        Ok(FinalizePlan::Apply(StockApplication {
            grn_id: self.id.clone(),
            idempotency_key: self.grn_number.clone(),
            receipts,
        }))
    }

    /// Record a successful stock application. Fails if it was already recorded.
    pub fn mark_inventory_applied(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.inventory_updated {
            return Err(DomainError::conflict(format!(
                "stock for grn {} has already been applied",
                self.grn_number
            )));
        }
        self.status = self.status.transition(GrnStatus::Completed)?;
        self.inventory_updated = true;
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrnDocument {
    #[serde(alias = "_id")]
    id: GrnId,
    grn_number: String,
    purchase_order_id: PurchaseOrderId,
    #[serde(default)]
    po_number: String,
    items: Vec<GrnItem>,
    total_amount: Decimal,
    #[serde(default)]
    inventory_updated: bool,
    status: GrnStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GrnDocument> for Grn {
    type Error = DomainError;

    fn try_from(doc: GrnDocument) -> Result<Self, Self::Error> {
        for (line, item) in doc.items.iter().enumerate() {
            let expected = line_cost(item.unit_cost, item.received_quantity)?;
            if item.total_cost != expected {
                return Err(DomainError::validation(format!(
                    "grn {} line {line}: total cost {} does not match {} x {}",
                    doc.grn_number, item.total_cost, item.unit_cost, item.received_quantity
                )));
            }
        }
        let expected = sum_line_costs(&doc.items)?;
        if doc.total_amount != expected {
            return Err(DomainError::validation(format!(
                "grn {}: total amount {} does not match line costs {expected}",
                doc.grn_number, doc.total_amount
            )));
        }
        Ok(Self {
            id: doc.id,
            grn_number: doc.grn_number,
            purchase_order_id: doc.purchase_order_id,
            po_number: doc.po_number,
            items: doc.items,
            total_amount: doc.total_amount,
            inventory_updated: doc.inventory_updated,
            status: doc.status,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

/// Finalize an approved GRN: apply its stock once and mark it completed.
///
/// Re-finalizing a GRN whose inventory is already updated returns it unchanged
/// with `inventory_applied = false`, and the applier is not called.
pub async fn finalize_grn<A: StockApplier>(
    mut grn: Grn,
    applier: &mut A,
    now: DateTime<Utc>,
) -> Result<FinalizedGrn, A::Error> {
    match grn.plan_finalize()? {
        FinalizePlan::AlreadyApplied => Ok(FinalizedGrn {
            grn,
            inventory_applied: false,
        }),
        FinalizePlan::Apply(application) => {
            applier.apply(&application).await?;
            grn.mark_inventory_applied(now)?;
            Ok(FinalizedGrn {
                grn,
                inventory_applied: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{PurchaseOrderLine, PurchaseOrderStatus};
    use rust_decimal_macros::dec;

    #[derive(Default)]
    struct CountingApplier {
        calls: usize,
        last: Option<StockApplication>,
    }

    impl StockApplier for CountingApplier {
        type Error = DomainError;

        async fn apply(&mut self, application: &StockApplication) -> DomainResult<()> {
            self.calls += 1;
            self.last = Some(application.clone());
            Ok(())
        }
    }

    struct FailingApplier;

    impl StockApplier for FailingApplier {
        type Error = DomainError;

        async fn apply(&mut self, _application: &StockApplication) -> DomainResult<()> {
            Err(DomainError::invariant("stock service refused"))
        }
    }

    fn line(ordered: i64, already: i64, cost: Decimal) -> PurchaseOrderLine {
        PurchaseOrderLine {
            product_id: ProductId::new("p-1").unwrap(),
            variant_id: None,
            size: "M".into(),
            ordered_quantity: ordered,
            received_quantity: already,
            unit_cost: cost,
            stock_id: StockId::new("main").unwrap(),
        }
    }

    fn po(lines: Vec<PurchaseOrderLine>) -> PurchaseOrder {
        PurchaseOrder {
            id: PurchaseOrderId::new("po-1").unwrap(),
            po_number: "PO-0001".into(),
            supplier_name: Some("Acme Textiles".into()),
            status: PurchaseOrderStatus::Approved,
            lines,
        }
    }

    fn approved_grn() -> Grn {
        let draft = build_grn_from_po(&po(vec![line(10, 0, dec!(100))]), &[]).unwrap();
        let mut grn = Grn::from_draft(GrnId::new("grn-1").unwrap(), "GRN-0001", draft, Utc::now());
        grn.submit(Utc::now()).unwrap();
        grn.approve(Utc::now()).unwrap();
        grn
    }

    #[test]
    fn over_receipt_is_costed_and_flagged() {
        let draft = build_grn_from_po(
            &po(vec![line(10, 0, dec!(100))]),
            &[ReceivedLine { line: 0, received_quantity: 12 }],
        )
        .unwrap();

        assert_eq!(draft.items[0].total_cost(), dec!(1200));
        assert_eq!(draft.total_amount, dec!(1200));
        assert!(draft.items[0].is_over_received());
        assert_eq!(
            draft.warnings,
            vec![ReceiptWarning::OverReceipt {
                line: 0,
                product_id: ProductId::new("p-1").unwrap(),
                outstanding: 10,
                received: 12,
            }]
        );
    }

    #[test]
    fn over_receipt_is_measured_against_what_is_still_outstanding() {
        let draft = build_grn_from_po(
            &po(vec![line(10, 4, dec!(3))]),
            &[ReceivedLine { line: 0, received_quantity: 8 }],
        )
        .unwrap();

        let item = &draft.items[0];
        assert_eq!(item.previously_received(), 4);
        assert_eq!(item.outstanding(), 6);
        assert!(item.is_over_received());
        assert!(matches!(
            draft.warnings[..],
            [ReceiptWarning::OverReceipt { outstanding: 6, received: 8, .. }]
        ));

        let grn = Grn::from_draft(GrnId::new("grn-9").unwrap(), "GRN-0009", draft, Utc::now());
        assert_eq!(grn.over_received_items().count(), 1);
    }

    #[test]
    fn overflowing_line_cost_is_a_validation_error() {
        let err = build_grn_from_po(
            &po(vec![line(10, 0, dec!(79228162514.26))]),
            &[ReceivedLine { line: 0, received_quantity: i64::MAX }],
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("overflows"), "{msg}"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn overflowing_total_is_a_validation_error() {
        let big = Decimal::MAX / Decimal::from(2);
        let err = build_grn_from_po(&po(vec![line(1, 0, big), line(1, 0, big), line(1, 0, big)]), &[])
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("overflows")));
    }

    #[test]
    fn overflowing_edit_leaves_the_grn_untouched() {
        let draft = build_grn_from_po(&po(vec![line(10, 0, dec!(79228162514.26))]), &[]).unwrap();
        let mut grn = Grn::from_draft(GrnId::new("grn-5").unwrap(), "GRN-0005", draft, Utc::now());
        let before = grn.clone();

        let err = grn.set_received_quantity(0, i64::MAX, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(grn, before);
    }

    #[test]
    fn received_defaults_to_outstanding() {
        let draft = build_grn_from_po(&po(vec![line(10, 4, dec!(25.50))]), &[]).unwrap();
        assert_eq!(draft.items[0].received_quantity(), 6);
        assert_eq!(draft.total_amount, dec!(153.00));
        assert!(draft.warnings.is_empty());
        assert!(!draft.is_partial());
    }

    #[test]
    fn partial_receipt_reports_remaining_per_line() {
        let draft = build_grn_from_po(
            &po(vec![line(10, 0, dec!(5)), line(4, 0, dec!(2))]),
            &[ReceivedLine { line: 0, received_quantity: 7 }],
        )
        .unwrap();

        assert!(draft.is_partial());
        assert_eq!(draft.deltas[0].remaining, 3);
        assert_eq!(draft.deltas[1].remaining, 0);
        assert_eq!(draft.total_amount, dec!(43));
    }

    #[test]
    fn zero_received_lines_are_left_out() {
        let draft = build_grn_from_po(
            &po(vec![line(10, 0, dec!(5)), line(4, 0, dec!(2))]),
            &[ReceivedLine { line: 1, received_quantity: 0 }],
        )
        .unwrap();
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.deltas.len(), 2);
        assert_eq!(draft.deltas[1].remaining, 4);
    }

    #[test]
    fn nothing_received_is_rejected() {
        let err = build_grn_from_po(&po(vec![line(10, 10, dec!(5))]), &[]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unknown_line_is_rejected() {
        let err = build_grn_from_po(
            &po(vec![line(10, 0, dec!(5))]),
            &[ReceivedLine { line: 3, received_quantity: 1 }],
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn cancelled_orders_do_not_accept_receipts() {
        let mut order = po(vec![line(10, 0, dec!(5))]);
        order.status = PurchaseOrderStatus::Cancelled;
        assert!(build_grn_from_po(&order, &[]).is_err());
    }

    #[tokio::test]
    async fn finalize_applies_stock_once() {
        let mut applier = CountingApplier::default();
        let first = finalize_grn(approved_grn(), &mut applier, Utc::now()).await.unwrap();
        assert!(first.inventory_applied);
        assert!(first.grn.inventory_updated());
        assert_eq!(first.grn.status(), GrnStatus::Completed);

        let application = applier.last.clone().unwrap();
        assert_eq!(application.idempotency_key, "GRN-0001");
        assert_eq!(application.receipts[0].quantity, 10);

        let total = first.grn.total_amount();
        let second = finalize_grn(first.grn, &mut applier, Utc::now()).await.unwrap();
        assert!(!second.inventory_applied);
        assert_eq!(second.grn.total_amount(), total);
        assert_eq!(applier.calls, 1);
    }

    #[tokio::test]
    async fn finalize_requires_approval() {
        let draft = build_grn_from_po(&po(vec![line(1, 0, dec!(5))]), &[]).unwrap();
        let grn = Grn::from_draft(GrnId::new("grn-2").unwrap(), "GRN-0002", draft, Utc::now());
        let mut applier = CountingApplier::default();
        let err = finalize_grn(grn, &mut applier, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { entity: "grn", .. }));
        assert_eq!(applier.calls, 0);
    }

    #[tokio::test]
    async fn failed_application_leaves_flag_unset() {
        let grn = approved_grn();
        let err = finalize_grn(grn.clone(), &mut FailingApplier, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert!(!grn.inventory_updated());
        assert!(matches!(grn.plan_finalize(), Ok(FinalizePlan::Apply(_))));
    }

    #[test]
    fn marking_twice_is_a_conflict() {
        let mut grn = approved_grn();
        grn.mark_inventory_applied(Utc::now()).unwrap();
        let err = grn.mark_inventory_applied(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn completed_is_not_reachable_by_status_change() {
        let mut grn = approved_grn();
        assert!(grn.transition(GrnStatus::Completed, Utc::now()).is_err());
        assert_eq!(grn.status(), GrnStatus::Approved);
    }

    #[test]
    fn draft_can_be_rejected_but_approved_cannot() {
        let draft = build_grn_from_po(&po(vec![line(1, 0, dec!(5))]), &[]).unwrap();
        let mut grn = Grn::from_draft(GrnId::new("grn-3").unwrap(), "GRN-0003", draft, Utc::now());
        grn.reject(Utc::now()).unwrap();
        assert!(grn.status().is_terminal());

        let mut approved = approved_grn();
        assert!(approved.reject(Utc::now()).is_err());
    }

    #[test]
    fn editing_received_quantity_recomputes_totals() {
        let draft = build_grn_from_po(&po(vec![line(10, 0, dec!(100))]), &[]).unwrap();
        let mut grn = Grn::from_draft(GrnId::new("grn-4").unwrap(), "GRN-0004", draft, Utc::now());
        grn.set_received_quantity(0, 12, Utc::now()).unwrap();
        assert_eq!(grn.total_amount(), dec!(1200));
        assert_eq!(grn.over_received_items().count(), 1);

        grn.submit(Utc::now()).unwrap();
        assert!(grn.set_received_quantity(0, 3, Utc::now()).is_err());
    }

    #[test]
    fn draft_serializes_as_create_request() {
        let draft = build_grn_from_po(&po(vec![line(2, 0, dec!(10))]), &[]).unwrap();
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["purchaseOrderId"], "po-1");
        assert_eq!(value["items"][0]["totalCost"], 20.0);
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn stored_document_round_trips() {
        let grn = approved_grn();
        let json = serde_json::to_string(&grn).unwrap();
        let back: Grn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grn);
    }

    #[test]
    fn document_with_inconsistent_costs_is_rejected() {
        let mut value = serde_json::to_value(approved_grn()).unwrap();
        value["items"][0]["totalCost"] = serde_json::json!(999.0);
        let err = serde_json::from_value::<Grn>(value).unwrap_err();
        assert!(err.to_string().contains("line 0"), "{err}");

        let mut value = serde_json::to_value(approved_grn()).unwrap();
        value["totalAmount"] = serde_json::json!(1.0);
        let err = serde_json::from_value::<Grn>(value).unwrap_err();
        assert!(err.to_string().contains("total amount"), "{err}");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the GRN total is always the sum of unit cost x received.
            #[test]
            fn total_is_sum_of_line_costs(
                lines in proptest::collection::vec((1i64..500, 0i64..100_000), 1..10),
                extra in 0i64..50,
            ) {
                let order = po(lines
                    .iter()
                    .map(|&(ordered, cents)| line(ordered, 0, Decimal::new(cents, 2)))
                    .collect());
                let overrides = [ReceivedLine { line: 0, received_quantity: lines[0].0 + extra }];
                let draft = build_grn_from_po(&order, &overrides).unwrap();

                let expected: Decimal = draft
                    .items
                    .iter()
                    .map(|i| i.unit_cost() * Decimal::from(i.received_quantity()))
                    .sum();
                prop_assert_eq!(draft.total_amount, sum_line_costs(&draft.items).unwrap());
                prop_assert_eq!(draft.total_amount, expected);
                prop_assert_eq!(draft.warnings.is_empty(), extra == 0);
            }
        }
    }
}
