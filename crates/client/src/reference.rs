//! Reference data: stock locations.

use serde::{Deserialize, Serialize};

use retailerp_core::StockId;

use crate::context::AppContext;
use crate::error::ClientResult;

/// A named inventory-holding location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLocation {
    #[serde(alias = "_id")]
    pub id: StockId,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl AppContext {
    /// Cached stock locations, fetched on first use.
    pub async fn stock_locations(&self) -> ClientResult<Vec<StockLocation>> {
        if let Some(stocks) = self.stocks.read().await.as_ref() {
            return Ok(stocks.clone());
        }
        self.refresh_stock_locations().await
    }

    pub async fn refresh_stock_locations(&self) -> ClientResult<Vec<StockLocation>> {
        let stocks: Vec<StockLocation> = self.api.get("/stocks").await?;
        tracing::debug!(count = stocks.len(), "stock locations refreshed");
        *self.stocks.write().await = Some(stocks.clone());
        Ok(stocks)
    }

    pub async fn active_stock_locations(&self) -> ClientResult<Vec<StockLocation>> {
        Ok(self
            .stock_locations()
            .await?
            .into_iter()
            .filter(|s| s.is_active)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_location_defaults_to_active() {
        let stock: StockLocation =
            serde_json::from_str(r#"{"_id":"s-1","name":"Colombo Warehouse"}"#).unwrap();
        assert_eq!(stock.id.as_str(), "s-1");
        assert!(stock.is_active);
    }
}
