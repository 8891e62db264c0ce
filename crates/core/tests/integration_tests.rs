// ═══════════════════════════════════════════════════════════════════
// Integration Tests — Coinfolio facade: bookkeeping, portfolio reads,
// charts, sale simulation, snapshot runs
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use coinfolio_core::errors::CoreError;
use coinfolio_core::models::asset::{Asset, AssetDraft};
use coinfolio_core::models::price::{ChartQuery, ChartRange};
use coinfolio_core::models::settings::Settings;
use coinfolio_core::models::snapshot::SnapshotStatus;
use coinfolio_core::models::transaction::{TransactionDraft, TransactionKind};
use coinfolio_core::providers::traits::MarketDataApi;
use coinfolio_core::storage::ledger::MemoryLedger;
use coinfolio_core::storage::snapshots::MemorySnapshotStore;
use coinfolio_core::Coinfolio;

// ═══════════════════════════════════════════════════════════════════
// Fixed-price mock upstream
// ═══════════════════════════════════════════════════════════════════

/// Upstream that always answers with the same price table and counts
/// how often it is asked.
struct FixedPriceApi {
    prices: HashMap<String, f64>,
    price_calls: Mutex<usize>,
}

impl FixedPriceApi {
    fn new(prices: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self {
            prices: prices
                .iter()
                .map(|(id, p)| (id.to_string(), *p))
                .collect(),
            price_calls: Mutex::new(0),
        })
    }

    fn price_call_count(&self) -> usize {
        *self.price_calls.lock().unwrap()
    }
}

#[async_trait]
impl MarketDataApi for FixedPriceApi {
    fn name(&self) -> &str {
        "Fixed"
    }

    async fn simple_price(
        &self,
        api_ids: &[String],
        _vs_currency: &str,
    ) -> Result<HashMap<String, f64>, CoreError> {
        *self.price_calls.lock().unwrap() += 1;
        Ok(api_ids
            .iter()
            .filter_map(|id| self.prices.get(id).map(|p| (id.clone(), *p)))
            .collect())
    }

    async fn market_chart(
        &self,
        query: &ChartQuery,
        _vs_currency: &str,
    ) -> Result<serde_json::Value, CoreError> {
        Ok(json!({
            "prices": [[1700000000000i64, self.prices.get(&query.api_id).copied().unwrap_or(0.0)]]
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════
// Fixture
// ═══════════════════════════════════════════════════════════════════

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn tracker(api: &Arc<FixedPriceApi>) -> Coinfolio {
    Coinfolio::with_components(
        Settings::default(),
        Arc::clone(api) as Arc<dyn MarketDataApi>,
        Arc::new(MemoryLedger::new()),
        Arc::new(MemorySnapshotStore::new()),
    )
}

/// Tracker pre-loaded with two assets and a few transactions.
async fn seeded_tracker(api: &Arc<FixedPriceApi>) -> (Coinfolio, Asset, Asset) {
    let folio = tracker(api);

    let btc = folio
        .create_asset(AssetDraft::new("Bitcoin", "BTC", "bitcoin"))
        .await
        .unwrap();
    let eth = folio
        .create_asset(AssetDraft::new("Ethereum", "ETH", "ethereum"))
        .await
        .unwrap();

    folio
        .record_transaction(TransactionDraft::new(
            btc.id,
            TransactionKind::Buy,
            10.0,
            100.0,
            t0(),
        ))
        .await
        .unwrap();
    folio
        .record_transaction(TransactionDraft::new(
            btc.id,
            TransactionKind::Sell,
            4.0,
            150.0,
            t0(),
        ))
        .await
        .unwrap();
    folio
        .record_transaction(TransactionDraft::new(
            eth.id,
            TransactionKind::ClaimStaking,
            2.0,
            0.0,
            t0(),
        ))
        .await
        .unwrap();

    (folio, btc, eth)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ═══════════════════════════════════════════════════════════════════
// Portfolio reads
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn portfolio_read_combines_ledger_and_prices() {
    let api = FixedPriceApi::new(&[("bitcoin", 200.0), ("ethereum", 50.0)]);
    let (folio, btc, eth) = seeded_tracker(&api).await;

    let view = folio.get_portfolio().await.unwrap();
    assert_eq!(view.assets.len(), 2);

    let btc_holding = view.assets.iter().find(|h| h.asset_id == btc.id).unwrap();
    assert_close(btc_holding.quantity, 6.0);
    assert_close(btc_holding.total_cost, 1000.0);
    assert_close(btc_holding.avg_price, 1000.0 / 6.0);
    assert_close(btc_holding.current_value, 1200.0);

    let eth_holding = view.assets.iter().find(|h| h.asset_id == eth.id).unwrap();
    assert_close(eth_holding.quantity, 2.0);
    assert_close(eth_holding.avg_price, 0.0);
    assert_close(eth_holding.current_value, 100.0);

    assert_close(view.total_value, 1300.0);
    assert_close(view.total_pl, 200.0 + 100.0);
}

#[tokio::test]
async fn consecutive_reads_reuse_the_price_cache() {
    let api = FixedPriceApi::new(&[("bitcoin", 200.0), ("ethereum", 50.0)]);
    let (folio, _, _) = seeded_tracker(&api).await;

    folio.get_portfolio().await.unwrap();
    folio.get_portfolio().await.unwrap();
    folio.get_portfolio().await.unwrap();

    assert_eq!(api.price_call_count(), 1);
}

#[tokio::test]
async fn empty_portfolio_reads_without_upstream_calls() {
    let api = FixedPriceApi::new(&[]);
    let folio = tracker(&api);

    let view = folio.get_portfolio().await.unwrap();
    assert!(view.assets.is_empty());
    assert_close(view.total_value, 0.0);
    assert_eq!(api.price_call_count(), 0);
}

// ═══════════════════════════════════════════════════════════════════
// Sale simulation
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn sale_simulation_through_the_facade() {
    let api = FixedPriceApi::new(&[("bitcoin", 200.0), ("ethereum", 50.0)]);
    let (folio, btc, _) = seeded_tracker(&api).await;

    let projection = folio.simulate_sale(btc.id, 3.0, 200.0).await.unwrap();
    let avg = 1000.0 / 6.0;
    assert_close(projection.realized_pl, (200.0 - avg) * 3.0);
    assert_close(projection.remaining_quantity, 3.0);

    let err = folio.simulate_sale(btc.id, 100.0, 200.0).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = folio.simulate_sale(999, 1.0, 200.0).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

// ═══════════════════════════════════════════════════════════════════
// Bookkeeping guards
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn asset_with_transactions_cannot_be_deleted() {
    let api = FixedPriceApi::new(&[("bitcoin", 200.0), ("ethereum", 50.0)]);
    let (folio, btc, _) = seeded_tracker(&api).await;

    let err = folio.delete_asset(btc.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // Still listed.
    assert_eq!(folio.list_assets().await.unwrap().len(), 2);
}

#[tokio::test]
async fn asset_without_transactions_deletes_cleanly() {
    let api = FixedPriceApi::new(&[]);
    let folio = tracker(&api);

    let doge = folio
        .create_asset(AssetDraft::new("Dogecoin", "DOGE", "dogecoin"))
        .await
        .unwrap();
    folio.delete_asset(doge.id).await.unwrap();
    assert!(folio.list_assets().await.unwrap().is_empty());
}

#[tokio::test]
async fn transaction_drafts_are_validated() {
    let api = FixedPriceApi::new(&[]);
    let folio = tracker(&api);
    let btc = folio
        .create_asset(AssetDraft::new("Bitcoin", "BTC", "bitcoin"))
        .await
        .unwrap();

    let zero_quantity = TransactionDraft::new(btc.id, TransactionKind::Buy, 0.0, 100.0, t0());
    assert!(matches!(
        folio.record_transaction(zero_quantity).await.unwrap_err(),
        CoreError::Validation(_)
    ));

    let negative_price = TransactionDraft::new(btc.id, TransactionKind::Buy, 1.0, -5.0, t0());
    assert!(matches!(
        folio.record_transaction(negative_price).await.unwrap_err(),
        CoreError::Validation(_)
    ));

    let negative_fees =
        TransactionDraft::new(btc.id, TransactionKind::Buy, 1.0, 100.0, t0()).with_fees(-1.0);
    assert!(matches!(
        folio.record_transaction(negative_fees).await.unwrap_err(),
        CoreError::Validation(_)
    ));
}

// ═══════════════════════════════════════════════════════════════════
// Charts
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn chart_read_returns_the_raw_series() {
    let api = FixedPriceApi::new(&[("bitcoin", 200.0)]);
    let folio = tracker(&api);

    let series = folio
        .get_asset_chart("bitcoin", ChartRange::Days(7), None)
        .await
        .unwrap();
    assert_eq!(series["prices"][0][1], json!(200.0));
}

#[tokio::test]
async fn chart_read_rejects_fiat_pseudo_identifiers() {
    let api = FixedPriceApi::new(&[]);
    let folio = tracker(&api);

    let err = folio
        .get_asset_chart("usd", ChartRange::Days(7), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidChartTarget(_)));
}

// ═══════════════════════════════════════════════════════════════════
// Snapshots
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn snapshot_run_persists_the_total_and_logs_success() {
    let api = FixedPriceApi::new(&[("bitcoin", 200.0), ("ethereum", 50.0)]);
    let (folio, _, _) = seeded_tracker(&api).await;

    let snapshot = folio.take_snapshot().await.unwrap().unwrap();
    assert_close(snapshot.total_value, 1300.0);

    let history = folio.get_snapshots(None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_close(history[0].total_value, 1300.0);

    let logs = folio.get_snapshot_logs(10).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].status, SnapshotStatus::Success);
    assert_eq!(logs[1].status, SnapshotStatus::Running);
}

#[tokio::test]
async fn snapshot_run_on_empty_portfolio_skips_but_logs() {
    let api = FixedPriceApi::new(&[]);
    let folio = tracker(&api);

    let snapshot = folio.take_snapshot().await.unwrap();
    assert!(snapshot.is_none());
    assert!(folio.get_snapshots(None).await.unwrap().is_empty());

    let logs = folio.get_snapshot_logs(10).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].status, SnapshotStatus::Success);
}

#[tokio::test]
async fn snapshot_reuses_the_shared_price_cache() {
    let api = FixedPriceApi::new(&[("bitcoin", 200.0), ("ethereum", 50.0)]);
    let (folio, _, _) = seeded_tracker(&api).await;

    folio.get_portfolio().await.unwrap();
    folio.take_snapshot().await.unwrap();

    // The snapshot run found every price fresh in the cache.
    assert_eq!(api.price_call_count(), 1);
}
