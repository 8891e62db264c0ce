use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;

use super::traits::MarketDataApi;
use crate::errors::CoreError;
use crate::models::price::ChartQuery;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API client.
///
/// - **Free tier**: no API key, but aggressively rate limited (HTTP 429
///   under load). Callers are expected to cache and back off.
/// - **Endpoints**: `/simple/price` (batched current prices),
///   `/coins/{id}/market_chart` (historical series).
///
/// Identifiers are CoinGecko's lowercase ids ("bitcoin", "ethereum"),
/// stored on each asset as `price_api_id`.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different host (self-hosted proxy, test server).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let builder = Client::builder().timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into(),
        }
    }

    /// `/simple/price` request URL for a batch of identifiers.
    pub fn price_url(&self, api_ids: &[String], vs_currency: &str) -> String {
        let ids = api_ids.join(",");
        format!(
            "{}/simple/price?ids={ids}&vs_currencies={vs_currency}",
            self.base_url
        )
    }

    /// `/coins/{id}/market_chart` request URL for a chart query.
    pub fn chart_url(&self, query: &ChartQuery, vs_currency: &str) -> String {
        let mut url = format!(
            "{}/coins/{}/market_chart?vs_currency={vs_currency}&days={}",
            self.base_url, query.api_id, query.range
        );
        if let Some(interval) = &query.interval {
            url.push_str(&format!("&interval={interval}"));
        }
        url
    }

    /// Map a non-2xx response to the error taxonomy. 429 is the only
    /// retryable status.
    async fn status_error(resp: reqwest::Response) -> CoreError {
        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return CoreError::RateLimited;
        }
        let message = resp.text().await.unwrap_or_default();
        CoreError::Upstream {
            status: status.as_u16(),
            message: truncate(&message, 200),
        }
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Upstream error bodies can be whole HTML pages; cap what we carry.
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}

// `/simple/price` responds with `{ "<id>": { "<vs_currency>": 67123.0 } }`.
// There is no wrapper object, so a nested map is the natural shape.
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

#[async_trait]
impl MarketDataApi for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn simple_price(
        &self,
        api_ids: &[String],
        vs_currency: &str,
    ) -> Result<HashMap<String, f64>, CoreError> {
        let url = self.price_url(api_ids, vs_currency);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(Self::status_error(resp).await);
        }

        let data: SimplePriceResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::Decode(format!("price response: {e}")))?;

        let prices = data
            .into_iter()
            .filter_map(|(id, quotes)| quotes.get(vs_currency).map(|p| (id, *p)))
            .collect();

        Ok(prices)
    }

    async fn market_chart(
        &self,
        query: &ChartQuery,
        vs_currency: &str,
    ) -> Result<serde_json::Value, CoreError> {
        let url = self.chart_url(query, vs_currency);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(Self::status_error(resp).await);
        }

        let series: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CoreError::Decode(format!("chart response for {}: {e}", query.api_id)))?;

        Ok(series)
    }
}
