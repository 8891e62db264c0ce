use serde::{Deserialize, Serialize};

/// A tracked crypto asset.
///
/// `price_api_id` is the identifier the upstream price API understands
/// (e.g., "bitcoin", "ethereum"). It is distinct from the internal `id`
/// and doubles as the price cache key, so no two assets may share one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Internal primary key, assigned by the ledger store.
    pub id: i64,

    /// Human-readable name (e.g., "Bitcoin")
    pub name: String,

    /// Ticker symbol (e.g., "BTC")
    pub symbol: String,

    /// Identifier used to query the upstream price API (e.g., "bitcoin")
    pub price_api_id: String,
}

/// Payload for creating or updating an asset. The ledger store assigns
/// the primary key on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDraft {
    pub name: String,
    pub symbol: String,
    pub price_api_id: String,
}

impl AssetDraft {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        price_api_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            price_api_id: price_api_id.into(),
        }
    }
}
