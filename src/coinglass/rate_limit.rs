//! Minimum-spacing limiter shared by every request of one client.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// Enforces a minimum interval between consecutive dispatch instants.
///
/// The lock is held across the wait, so concurrent callers queue up (tokio's
/// mutex is FIFO) and each one observes the timestamp written by the caller
/// ahead of it.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Wait until a request may be dispatched and claim the slot.
    ///
    /// Returns the dispatch instant recorded for this caller.
    pub async fn acquire(&self) -> Instant {
        let mut last = self.last_dispatch.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                trace!(wait_ms = wait.as_millis() as u64, "Rate limit: delaying request");
                sleep(wait).await;
            }
        }

        let now = Instant::now();
        *last = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_not_delayed() {
        let limiter = RateLimiter::new(Duration::from_millis(250));
        let start = Instant::now();
        let dispatched = limiter.acquire().await;
        assert_eq!(dispatched, start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_requests_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(250));
        let first = limiter.acquire().await;
        let second = limiter.acquire().await;
        assert!(second - first >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_once_interval_has_passed() {
        let limiter = RateLimiter::new(Duration::from_millis(250));
        limiter.acquire().await;
        sleep(Duration::from_millis(400)).await;

        let before = Instant::now();
        let dispatched = limiter.acquire().await;
        assert_eq!(dispatched, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_cadence() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let handles: Vec<_> = (0..5)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();

        let mut instants = Vec::new();
        for handle in handles {
            instants.push(handle.await.unwrap());
        }
        instants.sort();

        for pair in instants.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_never_waits() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..10 {
            assert_eq!(limiter.acquire().await, start);
        }
    }
}
