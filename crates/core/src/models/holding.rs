use serde::{Deserialize, Serialize};

/// Current state of one held asset, derived fresh from the ledger on
/// every portfolio read. Never persisted; only price lookups are cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub asset_id: i64,
    pub name: String,
    pub symbol: String,
    pub price_api_id: String,

    /// Units currently held (always > 0; zeroed-out positions are dropped)
    pub quantity: f64,

    /// Sum of buy costs still attributed to the position
    pub total_cost: f64,

    /// `total_cost / quantity`, or 0 when the position is all free-basis
    pub avg_price: f64,

    /// Latest market price; 0.0 when no price could be obtained
    pub current_price: f64,

    /// `quantity * current_price`
    pub current_value: f64,

    /// Unrealized profit/loss as a percentage of cost; 0 for free-basis
    pub unrealized_pl_pct: f64,
}

/// The full portfolio read: per-asset holdings plus totals over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioView {
    pub assets: Vec<Holding>,

    /// Sum of `current_value` over all holdings
    pub total_value: f64,

    /// Sum of `current_value - total_cost` over all holdings (absolute,
    /// not percentage)
    pub total_pl: f64,
}

/// Outcome of simulating a sale against the current average cost basis.
///
/// Selling does not change the average price of what remains, so
/// `new_avg_price` equals the pre-sale average. It is reported anyway
/// because callers display it next to the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleProjection {
    /// `(sale_price - avg_price) * quantity`
    pub realized_pl: f64,

    pub new_avg_price: f64,

    pub remaining_quantity: f64,
}
