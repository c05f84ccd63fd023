//! Retry policy for outbound Coinglass requests.

use std::time::Duration;

use super::transport::TransportFailure;

/// Outcome of a single failed attempt, before it becomes a `CoinglassError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    Transport(TransportFailure),
    Status { status: u16, body: String },
}

/// How many times to retry, how long to wait, and which failures qualify.
///
/// Delays grow as `base_delay * 2^retry_number` (retry numbers start at 1),
/// capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// A policy that never retries.
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before retry number `retry_number` (1-based).
    pub fn backoff(&self, retry_number: u32) -> Duration {
        let factor = 2u32.checked_pow(retry_number).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Network errors, timeouts, 5xx and 429 are retried; other statuses are not.
    pub fn should_retry(&self, failure: &AttemptFailure) -> bool {
        match failure {
            AttemptFailure::Transport(_) => true,
            AttemptFailure::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn status(status: u16) -> AttemptFailure {
        AttemptFailure::Status {
            status,
            body: String::new(),
        }
    }

    #[rstest]
    #[case(500, true)]
    #[case(502, true)]
    #[case(503, true)]
    #[case(429, true)]
    #[case(400, false)]
    #[case(401, false)]
    #[case(403, false)]
    #[case(404, false)]
    fn test_status_retry_predicate(#[case] code: u16, #[case] expected: bool) {
        assert_eq!(RetryPolicy::default().should_retry(&status(code)), expected);
    }

    #[rstest]
    #[case(TransportFailure::Timeout)]
    #[case(TransportFailure::Connect("refused".to_string()))]
    #[case(TransportFailure::Request("reset".to_string()))]
    fn test_transport_failures_are_retried(#[case] failure: TransportFailure) {
        assert!(RetryPolicy::default().should_retry(&AttemptFailure::Transport(failure)));
    }

    #[test]
    fn test_backoff_doubles_per_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(policy.backoff(3), Duration::from_secs(5));
        assert_eq!(policy.backoff(40), Duration::from_secs(5));
    }

    #[test]
    fn test_default_allows_four_attempts() {
        assert_eq!(RetryPolicy::default().max_attempts(), 4);
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
    }
}
