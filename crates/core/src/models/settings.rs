use serde::{Deserialize, Serialize};

/// Tunables for the price-fetch layer. Embedders mostly keep the
/// defaults and only swap `vs_currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Quote currency for all prices and valuations (e.g., "usd")
    pub vs_currency: String,

    /// Freshness window for current-price cache entries, in seconds
    pub price_cache_secs: u64,

    /// Freshness window for chart-series cache entries, in seconds
    pub chart_cache_secs: u64,

    /// Total upstream attempts per batch before giving up (first try
    /// included)
    pub retry_attempts: u32,

    /// Base delay for exponential backoff between retries, in seconds
    pub retry_base_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vs_currency: "usd".to_string(),
            price_cache_secs: 120,
            chart_cache_secs: 3600,
            retry_attempts: 3,
            retry_base_secs: 2,
        }
    }
}
