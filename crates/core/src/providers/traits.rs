use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::price::ChartQuery;

/// Trait abstraction over the upstream market data API.
///
/// The fetch services only talk to this trait. Production wires in
/// `CoinGeckoProvider`; tests substitute a scripted fake, which is how
/// the retry and caching behavior gets exercised without a network.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch current prices for a batch of asset identifiers in one call.
    ///
    /// Returns identifier → price in `vs_currency`. Identifiers the
    /// upstream does not know may simply be absent from the result; the
    /// caller decides how to handle the gap.
    async fn simple_price(
        &self,
        api_ids: &[String],
        vs_currency: &str,
    ) -> Result<HashMap<String, f64>, CoreError>;

    /// Fetch a historical market chart for a single identifier.
    ///
    /// The payload is returned exactly as the upstream produced it; the
    /// library treats it as opaque JSON.
    async fn market_chart(
        &self,
        query: &ChartQuery,
        vs_currency: &str,
    ) -> Result<serde_json::Value, CoreError>;
}
