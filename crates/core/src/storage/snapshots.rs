use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

use crate::errors::CoreError;
use crate::models::snapshot::{PortfolioSnapshot, SnapshotLog, SnapshotStatus};

/// The snapshot persistence collaborator: total-value snapshots plus run
/// logs. Written once per scheduled snapshot run, read by history views.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn record_snapshot(
        &self,
        taken_at: DateTime<Utc>,
        total_value: f64,
    ) -> Result<PortfolioSnapshot, CoreError>;

    /// Snapshots ordered oldest first; `last_days` restricts to the
    /// trailing window when given.
    async fn list_snapshots(
        &self,
        last_days: Option<u32>,
    ) -> Result<Vec<PortfolioSnapshot>, CoreError>;

    async fn record_log(
        &self,
        logged_at: DateTime<Utc>,
        status: SnapshotStatus,
        message: &str,
    ) -> Result<(), CoreError>;

    /// Run logs, newest first.
    async fn list_logs(&self, limit: usize) -> Result<Vec<SnapshotLog>, CoreError>;
}

#[derive(Debug, Default)]
struct SnapshotInner {
    snapshots: Vec<PortfolioSnapshot>,
    logs: Vec<SnapshotLog>,
    next_snapshot_id: i64,
    next_log_id: i64,
}

/// In-memory `SnapshotStore`.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<SnapshotInner>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn record_snapshot(
        &self,
        taken_at: DateTime<Utc>,
        total_value: f64,
    ) -> Result<PortfolioSnapshot, CoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_snapshot_id += 1;
        let snapshot = PortfolioSnapshot {
            id: inner.next_snapshot_id,
            taken_at,
            total_value,
        };
        inner.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn list_snapshots(
        &self,
        last_days: Option<u32>,
    ) -> Result<Vec<PortfolioSnapshot>, CoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut snapshots: Vec<PortfolioSnapshot> = match last_days {
            Some(days) => {
                let cutoff = Utc::now() - Duration::days(days as i64);
                inner
                    .snapshots
                    .iter()
                    .filter(|s| s.taken_at >= cutoff)
                    .cloned()
                    .collect()
            }
            None => inner.snapshots.clone(),
        };
        snapshots.sort_by_key(|s| s.taken_at);
        Ok(snapshots)
    }

    async fn record_log(
        &self,
        logged_at: DateTime<Utc>,
        status: SnapshotStatus,
        message: &str,
    ) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_log_id += 1;
        let log = SnapshotLog {
            id: inner.next_log_id,
            logged_at,
            status,
            message: message.to_string(),
        };
        inner.logs.push(log);
        Ok(())
    }

    async fn list_logs(&self, limit: usize) -> Result<Vec<SnapshotLog>, CoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.logs.iter().rev().take(limit).cloned().collect())
    }
}
