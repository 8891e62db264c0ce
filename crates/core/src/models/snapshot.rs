use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time record of total portfolio value, written once per
/// scheduled snapshot run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub id: i64,
    pub taken_at: DateTime<Utc>,
    pub total_value: f64,
}

/// Outcome of a snapshot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotStatus {
    Running,
    Success,
    Error,
}

impl std::fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotStatus::Running => write!(f, "RUNNING"),
            SnapshotStatus::Success => write!(f, "SUCCESS"),
            SnapshotStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Run log entry for a snapshot attempt. Every run records at least a
/// Running entry and a terminal Success/Error entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLog {
    pub id: i64,
    pub logged_at: DateTime<Utc>,
    pub status: SnapshotStatus,
    pub message: String,
}
