use chrono::Utc;
use log::{error, info};

use crate::errors::CoreError;
use crate::models::snapshot::{PortfolioSnapshot, SnapshotStatus};
use crate::services::portfolio_service::PortfolioService;
use crate::services::price_service::PriceService;
use crate::storage::ledger::LedgerStore;
use crate::storage::snapshots::SnapshotStore;

/// How much ledger history a snapshot run reads. Generous bounds; a
/// personal portfolio stays far below them.
const SNAPSHOT_TRANSACTION_LIMIT: usize = 5000;
const SNAPSHOT_ASSET_LIMIT: usize = 1000;

/// Runs one portfolio valuation snapshot.
///
/// Invoked by an external scheduler (cron, CI job), not by the cache
/// layer. Each run writes a Running log entry, then a terminal
/// Success/Error entry, so operators can audit unattended runs.
pub struct SnapshotService;

impl SnapshotService {
    pub fn new() -> Self {
        Self
    }

    /// Value the portfolio at current prices and persist the total.
    ///
    /// Returns `Ok(None)` when there are no assets to price (logged as a
    /// Success, nothing persisted). Price-fetch failures cannot fail the
    /// run: the bulk fetcher degrades them to zero prices. Storage
    /// failures are logged as Error and propagated.
    pub async fn run(
        &self,
        ledger: &dyn LedgerStore,
        store: &dyn SnapshotStore,
        prices: &PriceService,
        portfolio: &PortfolioService,
    ) -> Result<Option<PortfolioSnapshot>, CoreError> {
        store
            .record_log(Utc::now(), SnapshotStatus::Running, "Snapshot run started")
            .await?;

        let result = self.value_and_persist(ledger, store, prices, portfolio).await;

        match &result {
            Ok(Some(snapshot)) => {
                let message = format!(
                    "Snapshot saved, total portfolio value: {:.2}",
                    snapshot.total_value
                );
                info!("{message}");
                store
                    .record_log(Utc::now(), SnapshotStatus::Success, &message)
                    .await?;
            }
            Ok(None) => {
                let message = "No assets to price, snapshot skipped";
                info!("{message}");
                store
                    .record_log(Utc::now(), SnapshotStatus::Success, message)
                    .await?;
            }
            Err(e) => {
                let message = format!("Snapshot run failed: {e}");
                error!("{message}");
                // Best effort: the original failure is what the caller
                // needs to see even if this log write also fails.
                let _ = store
                    .record_log(Utc::now(), SnapshotStatus::Error, &message)
                    .await;
            }
        }

        result
    }

    async fn value_and_persist(
        &self,
        ledger: &dyn LedgerStore,
        store: &dyn SnapshotStore,
        prices: &PriceService,
        portfolio: &PortfolioService,
    ) -> Result<Option<PortfolioSnapshot>, CoreError> {
        let assets = ledger.list_assets(SNAPSHOT_ASSET_LIMIT).await?;
        if assets.is_empty() {
            return Ok(None);
        }
        let transactions = ledger.list_transactions(SNAPSHOT_TRANSACTION_LIMIT).await?;

        let api_ids: Vec<String> = assets.iter().map(|a| a.price_api_id.clone()).collect();
        let price_map = prices.get_current_prices(&api_ids).await;

        let mut total_value = 0.0;
        for asset in &assets {
            let position = portfolio.position(asset.id, &transactions);
            if position.quantity > 0.0 {
                let price = price_map.get(&asset.price_api_id).copied().unwrap_or(0.0);
                total_value += position.quantity * price;
            }
        }

        let snapshot = store.record_snapshot(Utc::now(), total_value).await?;
        Ok(Some(snapshot))
    }
}

impl Default for SnapshotService {
    fn default() -> Self {
        Self::new()
    }
}
