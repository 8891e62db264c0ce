use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use super::settings::Settings;

/// How many days of history a chart request covers.
///
/// The upstream API accepts a day count or the literal `max`, so the
/// rendered query value is either "7"-style or "max".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartRange {
    Days(u32),
    Max,
}

impl std::fmt::Display for ChartRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartRange::Days(d) => write!(f, "{d}"),
            ChartRange::Max => write!(f, "max"),
        }
    }
}

/// A single chart lookup: which asset, how far back, at what granularity.
///
/// Chart results vary by range and interval, so all three fields
/// participate in the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChartQuery {
    /// Upstream price API identifier (e.g., "bitcoin")
    pub api_id: String,

    pub range: ChartRange,

    /// Optional sampling interval (e.g., "daily"); upstream default when None
    pub interval: Option<String>,
}

impl ChartQuery {
    pub fn new(api_id: impl Into<String>, range: ChartRange) -> Self {
        Self {
            api_id: api_id.into(),
            range,
            interval: None,
        }
    }

    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::Chart {
            api_id: self.api_id.clone(),
            range: self.range.clone(),
            interval: self.interval.clone(),
        }
    }
}

/// Which freshness window applies to a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Current spot price; short window
    Price,
    /// Historical chart series; long window
    Chart,
}

/// Cache key. Price and chart entries for the same asset identifier must
/// never collide: they have different payload shapes and windows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Price(String),
    Chart {
        api_id: String,
        range: ChartRange,
        interval: Option<String>,
    },
}

impl CacheKey {
    pub fn kind(&self) -> CacheKind {
        match self {
            CacheKey::Price(_) => CacheKind::Price,
            CacheKey::Chart { .. } => CacheKind::Chart,
        }
    }
}

/// What a cache entry holds: a spot price, or an opaque chart payload
/// exactly as the upstream returned it.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Price(f64),
    Chart(serde_json::Value),
}

/// A cached value plus when it was fetched. Freshness is decided on read.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: CachedValue,
    pub fetched_at: DateTime<Utc>,
}

/// Process-wide, time-bucketed price cache shared by every request.
///
/// Semantics:
/// - An entry is servable iff `now - fetched_at` is within its kind's
///   window (price: short, chart: long).
/// - Stale entries are treated as misses on read and left in place; a
///   successful refetch overwrites them. A failed refetch changes nothing,
///   so readers must always check freshness.
/// - No eviction. The key space is bounded by the portfolio's distinct
///   assets and chart query shapes.
///
/// Interior mutex so a single instance can be shared via `Arc` across
/// concurrent requests. The lock is held only for the map operation,
/// never across an await.
#[derive(Debug)]
pub struct PriceCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    price_window: Duration,
    chart_window: Duration,
}

impl PriceCache {
    /// Cache with the freshness windows from `settings`.
    pub fn new(settings: &Settings) -> Self {
        Self::with_windows(
            Duration::seconds(settings.price_cache_secs as i64),
            Duration::seconds(settings.chart_cache_secs as i64),
        )
    }

    pub fn with_windows(price_window: Duration, chart_window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            price_window,
            chart_window,
        }
    }

    fn window_for(&self, kind: CacheKind) -> Duration {
        match kind {
            CacheKind::Price => self.price_window,
            CacheKind::Chart => self.chart_window,
        }
    }

    /// Get a servable value. `None` covers both "absent" and "stale";
    /// callers cannot tell the two apart.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<CachedValue> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;
        if now.signed_duration_since(entry.fetched_at) < self.window_for(key.kind()) {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Unconditionally overwrite the entry for `key`.
    pub fn put(&self, key: CacheKey, value: CachedValue, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: now,
            },
        );
    }

    // ── Typed helpers ───────────────────────────────────────────────

    pub fn get_price(&self, api_id: &str, now: DateTime<Utc>) -> Option<f64> {
        match self.get(&CacheKey::Price(api_id.to_string()), now)? {
            CachedValue::Price(p) => Some(p),
            CachedValue::Chart(_) => None,
        }
    }

    pub fn put_price(&self, api_id: &str, price: f64, now: DateTime<Utc>) {
        self.put(
            CacheKey::Price(api_id.to_string()),
            CachedValue::Price(price),
            now,
        );
    }

    pub fn get_chart(&self, query: &ChartQuery, now: DateTime<Utc>) -> Option<serde_json::Value> {
        match self.get(&query.cache_key(), now)? {
            CachedValue::Chart(series) => Some(series),
            CachedValue::Price(_) => None,
        }
    }

    pub fn put_chart(&self, query: &ChartQuery, series: serde_json::Value, now: DateTime<Utc>) {
        self.put(query.cache_key(), CachedValue::Chart(series), now);
    }

    /// Number of entries currently held, fresh or stale.
    pub fn entry_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}
