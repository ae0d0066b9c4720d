//! Retry classification and pacing for the run controller.

use std::time::Duration;

use rand::Rng;

use crate::error::CrawlError;

/// Longest single backoff wait.
const MAX_BACKOFF_SECS: u64 = 60;

/// Whether a page-scoped failure is worth retrying after a wait.
///
/// Transient transport failures and anti-bot challenges often clear on a
/// later attempt. A render that would not settle will not settle on a
/// retry either, and everything else is not page-scoped.
#[must_use]
pub fn is_retriable(error: &CrawlError) -> bool {
    matches!(
        error,
        CrawlError::Navigation { .. } | CrawlError::Blocked { .. }
    )
}

/// Exponential backoff for retry `attempt` (0-based), capped at
/// [`MAX_BACKOFF_SECS`].
#[must_use]
pub fn backoff_delay(base_secs: u64, attempt: u32) -> Duration {
    let secs = base_secs
        .saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX))
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

/// Inter-page delay with ±25% jitter, so request timing does not form a
/// mechanical pattern.
#[must_use]
pub fn jittered_delay(base_ms: u64) -> Duration {
    if base_ms == 0 {
        return Duration::ZERO;
    }
    let factor: f64 = rand::rng().random_range(0.75..=1.25);
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let millis = ((base_ms as f64) * factor).round() as u64;
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;

    #[test]
    fn transport_and_block_failures_are_retriable() {
        assert!(is_retriable(&CrawlError::Navigation {
            page_index: 3,
            source: EngineError::Navigation {
                url: "https://x".to_string(),
                reason: "reset".to_string(),
            },
        }));
        assert!(is_retriable(&CrawlError::Blocked { page_index: 0 }));
    }

    #[test]
    fn render_timeout_is_not_retriable() {
        assert!(!is_retriable(&CrawlError::RenderTimeout {
            page_index: 1,
            timeout_secs: 30,
        }));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(5, 0), Duration::from_secs(5));
        assert_eq!(backoff_delay(5, 1), Duration::from_secs(10));
        assert_eq!(backoff_delay(5, 2), Duration::from_secs(20));
        assert_eq!(backoff_delay(5, 10), Duration::from_secs(60));
        assert_eq!(backoff_delay(5, 63), Duration::from_secs(60));
    }

    #[test]
    fn jitter_stays_within_band() {
        for _ in 0..100 {
            let d = jittered_delay(2000);
            assert!(d >= Duration::from_millis(1500));
            assert!(d <= Duration::from_millis(2500));
        }
        assert_eq!(jittered_delay(0), Duration::ZERO);
    }
}
