// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError Display formatting and classification
// ═══════════════════════════════════════════════════════════════════

use coinfolio_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn rate_limited() {
        let err = CoreError::RateLimited;
        assert_eq!(err.to_string(), "Upstream price API rate limited (HTTP 429)");
    }

    #[test]
    fn upstream() {
        let err = CoreError::Upstream {
            status: 503,
            message: "service unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "Upstream price API error (HTTP 503): service unavailable"
        );
    }

    #[test]
    fn network() {
        let err = CoreError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn decode() {
        let err = CoreError::Decode("price response: expected value".into());
        assert_eq!(
            err.to_string(),
            "Unreadable upstream payload: price response: expected value"
        );
    }

    #[test]
    fn invalid_chart_target() {
        let err = CoreError::InvalidChartTarget("usd".into());
        assert_eq!(
            err.to_string(),
            "Chart data not available for identifier 'usd'"
        );
    }

    #[test]
    fn validation() {
        let err = CoreError::Validation("quantity must be positive".into());
        assert_eq!(
            err.to_string(),
            "Validation failed: quantity must be positive"
        );
    }

    #[test]
    fn not_found() {
        let err = CoreError::NotFound("asset 42".into());
        assert_eq!(err.to_string(), "Not found: asset 42");
    }

    #[test]
    fn storage() {
        let err = CoreError::Storage("disk full".into());
        assert_eq!(err.to_string(), "Storage error: disk full");
    }
}

// ── Classification ──────────────────────────────────────────────────

mod classification {
    use super::*;

    #[test]
    fn only_429_is_retryable() {
        assert!(CoreError::RateLimited.is_rate_limited());

        assert!(!CoreError::Upstream {
            status: 500,
            message: String::new()
        }
        .is_rate_limited());
        assert!(!CoreError::Network("timeout".into()).is_rate_limited());
        assert!(!CoreError::InvalidChartTarget("usd".into()).is_rate_limited());
    }

    #[test]
    fn client_errors_are_the_callers_fault() {
        assert!(CoreError::Validation("bad input".into()).is_client_error());
        assert!(CoreError::NotFound("asset 1".into()).is_client_error());
        assert!(CoreError::InvalidChartTarget("usd".into()).is_client_error());
    }

    #[test]
    fn upstream_failures_are_not_client_errors() {
        assert!(!CoreError::RateLimited.is_client_error());
        assert!(!CoreError::Upstream {
            status: 500,
            message: String::new()
        }
        .is_client_error());
        assert!(!CoreError::Network("dns".into()).is_client_error());
        assert!(!CoreError::Decode("bad json".into()).is_client_error());
        assert!(!CoreError::Storage("io".into()).is_client_error());
    }
}
