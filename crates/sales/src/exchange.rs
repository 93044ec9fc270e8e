use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use retailerp_core::{DomainError, DomainResult, Lifecycle, ProductId, VariantId, string_id};

string_id!(
    /// Exchange identifier (backend document id).
    ExchangeId,
    "ExchangeId"
);
string_id!(
    /// Identifier of the customer order an exchange refers to.
    OrderId,
    "OrderId"
);

/// A returned or replacement line.
///
/// `price` is the line price captured on the order it comes from, not the
/// current catalog price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub size: String,
    pub price: Decimal,
    pub quantity: i64,
}

impl ExchangeItem {
    pub fn line_total(&self) -> DomainResult<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity)).ok_or_else(|| {
            DomainError::validation(format!(
                "line total {} x {} overflows",
                self.price, self.quantity
            ))
        })
    }
}

fn items_total(field: &str, items: &[ExchangeItem]) -> DomainResult<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |acc, item| {
        acc.checked_add(item.line_total()?)
            .ok_or_else(|| DomainError::validation(format!("{field} total overflows")))
    })
}

/// Who owes whom once the exchange is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeDirection {
    CustomerPays,
    Refund,
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSummary {
    pub return_total: Decimal,
    pub replacement_total: Decimal,
    /// `replacement_total - return_total`; positive means the customer pays more.
    pub price_difference: Decimal,
    pub direction: ExchangeDirection,
}

fn validate_items(field: &str, items: &[ExchangeItem]) -> DomainResult<()> {
    for (idx, item) in items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "{field}[{idx}].quantity must be positive"
            )));
        }
        if item.price < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "{field}[{idx}].price cannot be negative"
            )));
        }
    }
    Ok(())
}

/// Reconcile returned items against their replacements.
pub fn compute_exchange(
    returned: &[ExchangeItem],
    replacement: &[ExchangeItem],
) -> DomainResult<ExchangeSummary> {
    if returned.is_empty() && replacement.is_empty() {
        return Err(DomainError::EmptyExchange);
    }
    validate_items("returnedItems", returned)?;
    validate_items("replacementItems", replacement)?;

    let return_total = items_total("returnedItems", returned)?;
    let replacement_total = items_total("replacementItems", replacement)?;
    let price_difference = replacement_total - return_total;

    let direction = if price_difference > Decimal::ZERO {
        ExchangeDirection::CustomerPays
    } else if price_difference < Decimal::ZERO {
        ExchangeDirection::Refund
    } else {
        ExchangeDirection::Even
    };

    Ok(ExchangeSummary {
        return_total,
        replacement_total,
        price_difference,
        direction,
    })
}

/// Exchange status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    Pending,
    Completed,
    Cancelled,
}

impl core::fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ExchangeStatus::Pending => "pending",
            ExchangeStatus::Completed => "completed",
            ExchangeStatus::Cancelled => "cancelled",
        })
    }
}

impl Lifecycle for ExchangeStatus {
    const ENTITY: &'static str = "exchange";
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (ExchangeStatus::Pending, ExchangeStatus::Completed),
        (ExchangeStatus::Pending, ExchangeStatus::Cancelled),
    ];
}

/// Create request for an exchange, with totals already reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExchange {
    pub original_order_id: OrderId,
    pub returned_items: Vec<ExchangeItem>,
    pub replacement_items: Vec<ExchangeItem>,
    pub return_total: Decimal,
    pub replacement_total: Decimal,
    pub price_difference: Decimal,
}

impl NewExchange {
    pub fn open(
        original_order_id: OrderId,
        returned_items: Vec<ExchangeItem>,
        replacement_items: Vec<ExchangeItem>,
    ) -> DomainResult<Self> {
        let summary = compute_exchange(&returned_items, &replacement_items)?;
        Ok(Self {
            original_order_id,
            returned_items,
            replacement_items,
            return_total: summary.return_total,
            replacement_total: summary.replacement_total,
            price_difference: summary.price_difference,
        })
    }
}

/// An exchange document as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRecord {
    #[serde(alias = "_id")]
    id: ExchangeId,
    original_order_id: OrderId,
    returned_items: Vec<ExchangeItem>,
    replacement_items: Vec<ExchangeItem>,
    return_total: Decimal,
    replacement_total: Decimal,
    price_difference: Decimal,
    status: ExchangeStatus,
    created_at: DateTime<Utc>,
}

impl ExchangeRecord {
    pub fn from_new(id: ExchangeId, new: NewExchange, now: DateTime<Utc>) -> Self {
        Self {
            id,
            original_order_id: new.original_order_id,
            returned_items: new.returned_items,
            replacement_items: new.replacement_items,
            return_total: new.return_total,
            replacement_total: new.replacement_total,
            price_difference: new.price_difference,
            status: ExchangeStatus::Pending,
            created_at: now,
        }
    }

    pub fn id(&self) -> &ExchangeId {
        &self.id
    }

    pub fn original_order_id(&self) -> &OrderId {
        &self.original_order_id
    }

    pub fn returned_items(&self) -> &[ExchangeItem] {
        &self.returned_items
    }

    pub fn replacement_items(&self) -> &[ExchangeItem] {
        &self.replacement_items
    }

    pub fn price_difference(&self) -> Decimal {
        self.price_difference
    }

    pub fn status(&self) -> ExchangeStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Totals recomputed from the item lines.
    pub fn summary(&self) -> DomainResult<ExchangeSummary> {
        compute_exchange(&self.returned_items, &self.replacement_items)
    }

    pub fn transition(&mut self, next: ExchangeStatus) -> DomainResult<()> {
        self.status = self.status.transition(next)?;
        Ok(())
    }

    pub fn complete(&mut self) -> DomainResult<()> {
        self.transition(ExchangeStatus::Completed)
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        self.transition(ExchangeStatus::Cancelled)
    }
}
