//! Store exchanges.

use retailerp_auth::Permission;
use retailerp_sales::{ExchangeItem, ExchangeRecord, ExchangeStatus, NewExchange, OrderId};

use crate::adjustments::StatusChange;
use crate::context::AppContext;
use crate::error::ClientResult;

impl AppContext {
    /// Reconcile the two sides and record the exchange (status `pending`).
    pub async fn create_exchange(
        &self,
        original_order_id: OrderId,
        returned: Vec<ExchangeItem>,
        replacement: Vec<ExchangeItem>,
    ) -> ClientResult<ExchangeRecord> {
        let new = NewExchange::open(original_order_id, returned, replacement)?;
        self.require(&Permission::EXCHANGES_WRITE).await?;
        let _guard = self.begin(format!("exchange.create:{}", new.original_order_id))?;

        let record: ExchangeRecord = self.api.post("/exchanges", &new).await?;
        tracing::info!(
            exchange = %record.id(),
            order = %record.original_order_id(),
            price_difference = %record.price_difference(),
            "exchange recorded"
        );
        Ok(record)
    }

    pub async fn complete_exchange(&self, record: &ExchangeRecord) -> ClientResult<ExchangeRecord> {
        self.change_exchange_status(record, ExchangeStatus::Completed).await
    }

    pub async fn cancel_exchange(&self, record: &ExchangeRecord) -> ClientResult<ExchangeRecord> {
        self.change_exchange_status(record, ExchangeStatus::Cancelled).await
    }

    async fn change_exchange_status(
        &self,
        record: &ExchangeRecord,
        next: ExchangeStatus,
    ) -> ClientResult<ExchangeRecord> {
        self.require(&Permission::EXCHANGES_WRITE).await?;
        record.clone().transition(next)?;
        let _guard = self.begin(format!("exchange.status:{}", record.id()))?;

        let path = format!("/exchanges/{}/status", record.id());
        self.api.put(&path, &StatusChange { status: next }).await
    }
}
