use async_trait::async_trait;
use std::sync::Mutex;

use crate::errors::CoreError;
use crate::models::asset::{Asset, AssetDraft};
use crate::models::transaction::{Transaction, TransactionDraft};

/// The transaction ledger collaborator: owns assets and transactions.
///
/// The core reads the ledger to aggregate holdings and writes to it only
/// through the explicit bookkeeping operations below. Real deployments
/// back this with a database; `MemoryLedger` backs tests and embedders
/// that do not need persistence.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn list_assets(&self, limit: usize) -> Result<Vec<Asset>, CoreError>;

    async fn get_asset(&self, asset_id: i64) -> Result<Option<Asset>, CoreError>;

    /// Create an asset. Name, symbol and price API identifier must each
    /// be unique across the ledger.
    async fn create_asset(&self, draft: AssetDraft) -> Result<Asset, CoreError>;

    /// Replace an asset's fields; same uniqueness rules as create.
    async fn update_asset(&self, asset_id: i64, draft: AssetDraft) -> Result<Asset, CoreError>;

    /// Delete and return an asset. Callers are responsible for checking
    /// that no transactions reference it first.
    async fn delete_asset(&self, asset_id: i64) -> Result<Asset, CoreError>;

    async fn list_transactions(&self, limit: usize) -> Result<Vec<Transaction>, CoreError>;

    /// Record a transaction against an existing asset.
    async fn create_transaction(&self, draft: TransactionDraft) -> Result<Transaction, CoreError>;

    /// Delete and return a transaction.
    async fn delete_transaction(&self, transaction_id: i64) -> Result<Transaction, CoreError>;

    /// How many transactions reference `asset_id`.
    async fn count_transactions_for_asset(&self, asset_id: i64) -> Result<usize, CoreError>;
}

#[derive(Debug, Default)]
struct LedgerInner {
    assets: Vec<Asset>,
    transactions: Vec<Transaction>,
    next_asset_id: i64,
    next_transaction_id: i64,
}

/// In-memory `LedgerStore` with sequential integer keys.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<LedgerInner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(
        inner: &LedgerInner,
        draft: &AssetDraft,
        exclude_id: Option<i64>,
    ) -> Result<(), CoreError> {
        for asset in &inner.assets {
            if Some(asset.id) == exclude_id {
                continue;
            }
            if asset.name == draft.name {
                return Err(CoreError::Validation(format!(
                    "an asset named '{}' already exists",
                    draft.name
                )));
            }
            if asset.symbol == draft.symbol {
                return Err(CoreError::Validation(format!(
                    "an asset with symbol '{}' already exists",
                    draft.symbol
                )));
            }
            if asset.price_api_id == draft.price_api_id {
                return Err(CoreError::Validation(format!(
                    "an asset with price API identifier '{}' already exists",
                    draft.price_api_id
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn list_assets(&self, limit: usize) -> Result<Vec<Asset>, CoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.assets.iter().take(limit).cloned().collect())
    }

    async fn get_asset(&self, asset_id: i64) -> Result<Option<Asset>, CoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.assets.iter().find(|a| a.id == asset_id).cloned())
    }

    async fn create_asset(&self, draft: AssetDraft) -> Result<Asset, CoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::check_unique(&inner, &draft, None)?;

        inner.next_asset_id += 1;
        let asset = Asset {
            id: inner.next_asset_id,
            name: draft.name,
            symbol: draft.symbol,
            price_api_id: draft.price_api_id,
        };
        inner.assets.push(asset.clone());
        Ok(asset)
    }

    async fn update_asset(&self, asset_id: i64, draft: AssetDraft) -> Result<Asset, CoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::check_unique(&inner, &draft, Some(asset_id))?;

        let asset = inner
            .assets
            .iter_mut()
            .find(|a| a.id == asset_id)
            .ok_or_else(|| CoreError::NotFound(format!("asset {asset_id}")))?;
        asset.name = draft.name;
        asset.symbol = draft.symbol;
        asset.price_api_id = draft.price_api_id;
        Ok(asset.clone())
    }

    async fn delete_asset(&self, asset_id: i64) -> Result<Asset, CoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let idx = inner
            .assets
            .iter()
            .position(|a| a.id == asset_id)
            .ok_or_else(|| CoreError::NotFound(format!("asset {asset_id}")))?;
        Ok(inner.assets.remove(idx))
    }

    async fn list_transactions(&self, limit: usize) -> Result<Vec<Transaction>, CoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.transactions.iter().take(limit).cloned().collect())
    }

    async fn create_transaction(&self, draft: TransactionDraft) -> Result<Transaction, CoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.assets.iter().any(|a| a.id == draft.asset_id) {
            return Err(CoreError::NotFound(format!("asset {}", draft.asset_id)));
        }

        inner.next_transaction_id += 1;
        let transaction = Transaction {
            id: inner.next_transaction_id,
            asset_id: draft.asset_id,
            kind: draft.kind,
            quantity: draft.quantity,
            unit_price: draft.unit_price,
            executed_at: draft.executed_at,
            fees: draft.fees,
        };
        inner.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn delete_transaction(&self, transaction_id: i64) -> Result<Transaction, CoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let idx = inner
            .transactions
            .iter()
            .position(|t| t.id == transaction_id)
            .ok_or_else(|| CoreError::NotFound(format!("transaction {transaction_id}")))?;
        Ok(inner.transactions.remove(idx))
    }

    async fn count_transactions_for_asset(&self, asset_id: i64) -> Result<usize, CoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .transactions
            .iter()
            .filter(|t| t.asset_id == asset_id)
            .count())
    }
}
