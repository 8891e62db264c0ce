use chrono::Utc;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::price::PriceCache;
use crate::models::settings::Settings;
use crate::providers::traits::MarketDataApi;
use crate::services::backoff::BackoffPolicy;

/// Fetches current prices in bulk, cache first.
///
/// This is the layer that keeps the rate-limited upstream alive: one
/// batched request covers every cache miss in a call, rate limiting is
/// retried with exponential backoff, and anything that still fails
/// degrades to a 0.0 price instead of an error. Callers always get back
/// exactly the key set they asked for.
///
/// Batching happens per call. Two concurrent callers missing the same
/// identifier may each hit the upstream; cache writes are idempotent, so
/// the duplicate work is wasteful but harmless.
pub struct PriceService {
    api: Arc<dyn MarketDataApi>,
    cache: Arc<PriceCache>,
    backoff: BackoffPolicy,
    vs_currency: String,
}

impl PriceService {
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

    /// Current price for every identifier in `api_ids`.
    ///
    /// Infallible by contract: the result maps every distinct requested
    /// identifier to a price, 0.0 standing in for anything the upstream
    /// could not supply. A 0.0 obtained this way is never cached, so the
    /// next call re-attempts the fetch.
    pub async fn get_current_prices(&self, api_ids: &[String]) -> HashMap<String, f64> {
        let now = Utc::now();
        let mut prices = HashMap::new();
        let mut to_fetch: Vec<String> = Vec::new();

        for api_id in api_ids {
            if prices.contains_key(api_id) || to_fetch.contains(api_id) {
                continue; // duplicate in the request
            }
            match self.cache.get_price(api_id, now) {
                Some(price) => {
                    prices.insert(api_id.clone(), price);
                }
                None => to_fetch.push(api_id.clone()),
            }
        }

        if to_fetch.is_empty() {
            return prices;
        }
        debug!(
            "price cache: {} hit(s), fetching {} identifier(s) from {}",
            prices.len(),
            to_fetch.len(),
            self.api.name()
        );

        match self.fetch_batch_with_retry(&to_fetch).await {
            Ok(fetched) => {
                let fetched_at = Utc::now();
                for api_id in &to_fetch {
                    let price = fetched.get(api_id).copied().unwrap_or(0.0);
                    prices.insert(api_id.clone(), price);
                    // Only strictly positive prices are cache-worthy; a
                    // transient gap in the response must not poison the
                    // cache for the whole window.
                    if price > 0.0 {
                        self.cache.put_price(api_id, price, fetched_at);
                    }
                }
            }
            Err(e) => {
                warn!(
                    "bulk price fetch failed for {} identifier(s), serving 0.0: {e}",
                    to_fetch.len()
                );
                for api_id in &to_fetch {
                    prices.insert(api_id.clone(), 0.0);
                }
            }
        }

        prices
    }

    /// One upstream batch request, retried on rate limiting only.
    async fn fetch_batch_with_retry(
        &self,
        api_ids: &[String],
    ) -> Result<HashMap<String, f64>, CoreError> {
        let mut attempt = 0;
        loop {
            match self.api.simple_price(api_ids, &self.vs_currency).await {
                Ok(prices) => return Ok(prices),
                Err(e) if e.is_rate_limited() && self.backoff.should_retry(attempt) => {
                    let delay = self.backoff.delay_for(attempt);
                    warn!(
                        "rate limit hit fetching {} price(s), retrying in {:.2}s",
                        api_ids.len(),
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
