use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a transaction did to the position.
///
/// Claims (lending/staking rewards) increase the quantity held without
/// affecting the cost basis: they are free-basis inflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Buy,
    Sell,
    ClaimLending,
    ClaimStaking,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "buy"),
            TransactionKind::Sell => write!(f, "sell"),
            TransactionKind::ClaimLending => write!(f, "claim_lending"),
            TransactionKind::ClaimStaking => write!(f, "claim_staking"),
        }
    }
}

/// A single ledger entry against an asset.
///
/// Immutable once recorded; corrections go through the ledger store as an
/// explicit delete + re-create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Internal primary key, assigned by the ledger store.
    pub id: i64,

    /// The asset this transaction applies to (`Asset::id`)
    pub asset_id: i64,

    pub kind: TransactionKind,

    /// Units of the asset moved (always positive; `kind` carries the sign)
    pub quantity: f64,

    /// Price paid/received per unit, in the quote currency
    pub unit_price: f64,

    /// When the transaction was executed
    pub executed_at: DateTime<Utc>,

    /// Exchange/network fees paid, in the quote currency
    pub fees: f64,
}

/// Payload for recording a new transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub asset_id: i64,
    pub kind: TransactionKind,
    pub quantity: f64,
    pub unit_price: f64,
    pub executed_at: DateTime<Utc>,
    pub fees: f64,
}

impl TransactionDraft {
    pub fn new(
        asset_id: i64,
        kind: TransactionKind,
        quantity: f64,
        unit_price: f64,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            asset_id,
            kind,
            quantity,
            unit_price,
            executed_at,
            fees: 0.0,
        }
    }

    pub fn with_fees(mut self, fees: f64) -> Self {
        self.fees = fees;
        self
    }
}
