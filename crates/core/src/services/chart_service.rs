use chrono::Utc;
use log::{debug, warn};
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::price::{ChartQuery, PriceCache};
use crate::models::settings::Settings;
use crate::providers::traits::MarketDataApi;
use crate::services::backoff::BackoffPolicy;

/// Pseudo-identifiers the chart endpoint cannot serve (fiat quote
/// currencies have no market chart). Rejected before any network call.
const NON_CHARTABLE_IDS: &[&str] = &["usd", "brl", "eur"];

/// Fetches historical chart series, one identifier at a time.
///
/// Same cache instance and retry policy as the bulk price fetcher, but a
/// longer freshness window and the opposite failure contract: chart
/// failures propagate to the caller instead of degrading to a default,
/// so the transport layer can report a server error.
pub struct ChartService {
    api: Arc<dyn MarketDataApi>,
    cache: Arc<PriceCache>,
    backoff: BackoffPolicy,
    vs_currency: String,
}

impl ChartService {
    pub fn new(api: Arc<dyn MarketDataApi>, cache: Arc<PriceCache>, settings: &Settings) -> Self {
        Self {
            api,
            cache,
            backoff: BackoffPolicy::from_settings(settings),
            vs_currency: settings.vs_currency.clone(),
        }
    }

    /// Override the retry policy (tests use zero delays).
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// The raw upstream chart payload for `query`, cached under the
    /// composite (identifier, range, interval) key.
    pub async fn get_market_chart(
        &self,
        query: &ChartQuery,
    ) -> Result<serde_json::Value, CoreError> {
        if NON_CHARTABLE_IDS.contains(&query.api_id.as_str()) {
            return Err(CoreError::InvalidChartTarget(query.api_id.clone()));
        }

        if let Some(series) = self.cache.get_chart(query, Utc::now()) {
            debug!("chart cache hit for {} ({})", query.api_id, query.range);
            return Ok(series);
        }

        let series = self.fetch_chart_with_retry(query).await?;
        self.cache.put_chart(query, series.clone(), Utc::now());
        Ok(series)
    }

    async fn fetch_chart_with_retry(
        &self,
        query: &ChartQuery,
    ) -> Result<serde_json::Value, CoreError> {
        let mut attempt = 0;
        loop {
            match self.api.market_chart(query, &self.vs_currency).await {
                Ok(series) => return Ok(series),
                Err(e) if e.is_rate_limited() && self.backoff.should_retry(attempt) => {
                    let delay = self.backoff.delay_for(attempt);
                    warn!(
                        "rate limit hit fetching chart for {}, retrying in {:.2}s",
                        query.api_id,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "chart fetch failed for {} (days={}, interval={:?}): {e}",
                        query.api_id, query.range, query.interval
                    );
                    return Err(e);
                }
            }
        }
    }
}
