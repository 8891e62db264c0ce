use thiserror::Error;

/// Unified error type for the entire coinfolio-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Upstream price API ──────────────────────────────────────────
    #[error("Upstream price API rate limited (HTTP 429)")]
    RateLimited,

    #[error("Upstream price API error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unreadable upstream payload: {0}")]
    Decode(String),

    // ── Charts ──────────────────────────────────────────────────────
    #[error("Chart data not available for identifier '{0}'")]
    InvalidChartTarget(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ── Persistence collaborators ───────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Whether a failed upstream call may succeed if repeated.
    /// Only rate limiting is retried; every other failure burns the batch.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CoreError::RateLimited)
    }

    /// Whether this error is the caller's fault (bad input) rather than
    /// ours or the upstream's. The transport layer maps these to 4xx.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::NotFound(_) | CoreError::InvalidChartTarget(_)
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters from URLs embedded in reqwest error
        // messages, since they can carry API keys.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
