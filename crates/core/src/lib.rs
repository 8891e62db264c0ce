pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::collections::HashMap;
use std::sync::Arc;

use models::{
    asset::{Asset, AssetDraft},
    holding::{PortfolioView, SaleProjection},
    price::{ChartQuery, ChartRange, PriceCache},
    settings::Settings,
    snapshot::{PortfolioSnapshot, SnapshotLog},
    transaction::{Transaction, TransactionDraft},
};
use providers::{coingecko::CoinGeckoProvider, traits::MarketDataApi};
use services::{
    chart_service::ChartService, portfolio_service::PortfolioService,
    price_service::PriceService, snapshot_service::SnapshotService,
};
use storage::{
    ledger::{LedgerStore, MemoryLedger},
    snapshots::{MemorySnapshotStore, SnapshotStore},
};

use errors::CoreError;

/// How much ledger history a portfolio read scans.
const TRANSACTION_SCAN_LIMIT: usize = 5000;
const ASSET_SCAN_LIMIT: usize = 1000;

/// Main entry point for the Coinfolio core library.
///
/// Owns the shared price cache and every service operating on it; an HTTP
/// layer (out of scope here) maps its methods onto endpoints. One
/// instance serves all concurrent requests; the cache and the stores are
/// behind their own synchronization.
#[must_use]
pub struct Coinfolio {
    settings: Settings,
    ledger: Arc<dyn LedgerStore>,
    snapshots: Arc<dyn SnapshotStore>,
    cache: Arc<PriceCache>,
    price_service: PriceService,
    chart_service: ChartService,
    portfolio_service: PortfolioService,
    snapshot_service: SnapshotService,
}

impl std::fmt::Debug for Coinfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coinfolio")
            .field("settings", &self.settings)
            .field("cached_entries", &self.cache.entry_count())
            .finish()
    }
}

impl Coinfolio {
    /// Default wiring: CoinGecko upstream, in-memory ledger and snapshot
    /// stores, default settings.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self::with_components(
            settings,
            Arc::new(CoinGeckoProvider::new()),
            Arc::new(MemoryLedger::new()),
            Arc::new(MemorySnapshotStore::new()),
        )
    }

    /// Full dependency injection: bring your own upstream client and
    /// stores. This is the constructor tests and server embedders use.
    pub fn with_components(
        settings: Settings,
        api: Arc<dyn MarketDataApi>,
        ledger: Arc<dyn LedgerStore>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        let cache = Arc::new(PriceCache::new(&settings));
        let price_service = PriceService::new(Arc::clone(&api), Arc::clone(&cache), &settings);
        let chart_service = ChartService::new(api, Arc::clone(&cache), &settings);

        Self {
            settings,
            ledger,
            snapshots,
            cache,
            price_service,
            chart_service,
            portfolio_service: PortfolioService::new(),
            snapshot_service: SnapshotService::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Asset bookkeeping ───────────────────────────────────────────

    pub async fn create_asset(&self, draft: AssetDraft) -> Result<Asset, CoreError> {
        self.ledger.create_asset(draft).await
    }

    pub async fn list_assets(&self) -> Result<Vec<Asset>, CoreError> {
        self.ledger.list_assets(ASSET_SCAN_LIMIT).await
    }

    pub async fn get_asset(&self, asset_id: i64) -> Result<Asset, CoreError> {
        self.ledger
            .get_asset(asset_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("asset {asset_id}")))
    }

    pub async fn update_asset(&self, asset_id: i64, draft: AssetDraft) -> Result<Asset, CoreError> {
        self.ledger.update_asset(asset_id, draft).await
    }

    /// Delete an asset. Refused while transactions still reference it;
    /// delete those first.
    pub async fn delete_asset(&self, asset_id: i64) -> Result<Asset, CoreError> {
        let references = self.ledger.count_transactions_for_asset(asset_id).await?;
        if references > 0 {
            return Err(CoreError::Validation(format!(
                "cannot delete asset {asset_id}: {references} transaction(s) reference it"
            )));
        }
        self.ledger.delete_asset(asset_id).await
    }

    // ── Transaction bookkeeping ─────────────────────────────────────

    pub async fn record_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<Transaction, CoreError> {
        if draft.quantity <= 0.0 {
            return Err(CoreError::Validation(
                "transaction quantity must be positive".into(),
            ));
        }
        if draft.unit_price < 0.0 || draft.fees < 0.0 {
            return Err(CoreError::Validation(
                "unit price and fees must not be negative".into(),
            ));
        }
        self.ledger.create_transaction(draft).await
    }

    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        self.ledger.list_transactions(TRANSACTION_SCAN_LIMIT).await
    }

    pub async fn delete_transaction(&self, transaction_id: i64) -> Result<Transaction, CoreError> {
        self.ledger.delete_transaction(transaction_id).await
    }

    // ── Portfolio ───────────────────────────────────────────────────

    /// Current holdings with live prices and unrealized P/L.
    ///
    /// Prices come through the bulk fetcher: one upstream call at most,
    /// cache-served when fresh, degraded to 0.0 on failure. This method
    /// therefore only fails on ledger errors.
    pub async fn get_portfolio(&self) -> Result<PortfolioView, CoreError> {
        let assets = self.ledger.list_assets(ASSET_SCAN_LIMIT).await?;
        let transactions = self.ledger.list_transactions(TRANSACTION_SCAN_LIMIT).await?;

        let api_ids: Vec<String> = assets.iter().map(|a| a.price_api_id.clone()).collect();
        let prices: HashMap<String, f64> = self.price_service.get_current_prices(&api_ids).await;

        Ok(self
            .portfolio_service
            .build_view(&assets, &transactions, &prices))
    }

    /// Project the realized P/L of a hypothetical sale.
    pub async fn simulate_sale(
        &self,
        asset_id: i64,
        quantity: f64,
        sale_price: f64,
    ) -> Result<SaleProjection, CoreError> {
        let transactions = self.ledger.list_transactions(TRANSACTION_SCAN_LIMIT).await?;
        self.portfolio_service
            .simulate_sale(&transactions, asset_id, quantity, sale_price)
    }

    // ── Charts ──────────────────────────────────────────────────────

    /// Historical chart series for one upstream identifier.
    ///
    /// Unlike portfolio prices, chart failures surface as errors.
    pub async fn get_asset_chart(
        &self,
        api_id: &str,
        range: ChartRange,
        interval: Option<String>,
    ) -> Result<serde_json::Value, CoreError> {
        let mut query = ChartQuery::new(api_id, range);
        if let Some(interval) = interval {
            query = query.with_interval(interval);
        }
        self.chart_service.get_market_chart(&query).await
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Run one valuation snapshot (see `SnapshotService`).
    pub async fn take_snapshot(&self) -> Result<Option<PortfolioSnapshot>, CoreError> {
        self.snapshot_service
            .run(
                self.ledger.as_ref(),
                self.snapshots.as_ref(),
                &self.price_service,
                &self.portfolio_service,
            )
            .await
    }

    /// Snapshot history, optionally restricted to the trailing
    /// `last_days` days.
    pub async fn get_snapshots(
        &self,
        last_days: Option<u32>,
    ) -> Result<Vec<PortfolioSnapshot>, CoreError> {
        self.snapshots.list_snapshots(last_days).await
    }

    /// Snapshot run logs, newest first.
    pub async fn get_snapshot_logs(&self, limit: usize) -> Result<Vec<SnapshotLog>, CoreError> {
        self.snapshots.list_logs(limit).await
    }
}

impl Default for Coinfolio {
    fn default() -> Self {
        Self::new()
    }
}
