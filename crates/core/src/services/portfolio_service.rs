use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::holding::{Holding, PortfolioView, SaleProjection};
use crate::models::transaction::{Transaction, TransactionKind};

/// Aggregates the transaction ledger into current holdings.
///
/// Pure business logic, no I/O. Everything is recomputed fresh on each
/// call; only price lookups are cached, never aggregation results.
pub struct PortfolioService;

/// Net effect of a ledger on one asset: units held and the buy cost still
/// attributed to them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub quantity: f64,
    pub total_cost: f64,
}

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Fold the ledger into a position for one asset.
    ///
    /// Order-insensitive: buys add quantity and cost, sells remove
    /// quantity only (cost basis is untouched; realized P/L is not
    /// tracked here), claims add quantity at zero cost.
    pub fn position(&self, asset_id: i64, transactions: &[Transaction]) -> Position {
        let mut position = Position::default();
        for tx in transactions.iter().filter(|t| t.asset_id == asset_id) {
            match tx.kind {
                TransactionKind::Buy => {
                    position.quantity += tx.quantity;
                    position.total_cost += tx.quantity * tx.unit_price;
                }
                TransactionKind::Sell => {
                    position.quantity -= tx.quantity;
                }
                TransactionKind::ClaimLending | TransactionKind::ClaimStaking => {
                    position.quantity += tx.quantity;
                }
            }
        }
        position
    }

    /// Build the portfolio view from the ledger and a price map
    /// (identifier → current price, as produced by the bulk fetcher).
    ///
    /// Assets with quantity <= 0 are dropped entirely: not listed, not
    /// counted in the totals. An identifier missing from `prices` is
    /// valued at 0.0, consistent with the fetcher's degraded output.
    pub fn build_view(
        &self,
        assets: &[Asset],
        transactions: &[Transaction],
        prices: &HashMap<String, f64>,
    ) -> PortfolioView {
        let mut holdings = Vec::new();
        let mut total_value = 0.0;
        let mut total_pl = 0.0;

        for asset in assets {
            let position = self.position(asset.id, transactions);
            if position.quantity <= 0.0 {
                continue;
            }

            let current_price = prices.get(&asset.price_api_id).copied().unwrap_or(0.0);
            let avg_price = if position.total_cost > 0.0 {
                position.total_cost / position.quantity
            } else {
                0.0
            };
            let current_value = position.quantity * current_price;
            let unrealized_pl_pct = if position.total_cost > 0.0 {
                (current_value - position.total_cost) / position.total_cost * 100.0
            } else {
                0.0
            };

            total_value += current_value;
            total_pl += current_value - position.total_cost;

            holdings.push(Holding {
                asset_id: asset.id,
                name: asset.name.clone(),
                symbol: asset.symbol.clone(),
                price_api_id: asset.price_api_id.clone(),
                quantity: position.quantity,
                total_cost: position.total_cost,
                avg_price,
                current_price,
                current_value,
                unrealized_pl_pct,
            });
        }

        PortfolioView {
            assets: holdings,
            total_value,
            total_pl,
        }
    }

    /// Project the realized P/L of selling `quantity` units at
    /// `sale_price` against the current average cost basis.
    ///
    /// Rejects (never clamps) a quantity above the current holding, and
    /// rejects assets with no positive holding at all. The average price
    /// of the remainder is unchanged by a sale.
    pub fn simulate_sale(
        &self,
        transactions: &[Transaction],
        asset_id: i64,
        quantity: f64,
        sale_price: f64,
    ) -> Result<SaleProjection, CoreError> {
        let position = self.position(asset_id, transactions);

        if position.quantity <= 0.0 {
            return Err(CoreError::NotFound(format!(
                "asset {asset_id} has no balance in the portfolio"
            )));
        }
        if quantity > position.quantity {
            return Err(CoreError::Validation(format!(
                "cannot simulate selling {quantity}: only {} held",
                position.quantity
            )));
        }

        let avg_price = if position.total_cost > 0.0 {
            position.total_cost / position.quantity
        } else {
            0.0
        };

        Ok(SaleProjection {
            realized_pl: (sale_price - avg_price) * quantity,
            new_avg_price: avg_price,
            remaining_quantity: position.quantity - quantity,
        })
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
