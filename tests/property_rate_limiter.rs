//! Property-based tests for request spacing.
//!
//! Whatever the interval, caller count, and arrival pattern, dispatch instants
//! handed out by one limiter are never closer together than the interval.

use std::sync::Arc;
use std::time::Duration;

use coinglass_mcp::coinglass::RateLimiter;
use proptest::prelude::*;
use rstest::rstest;
use tokio::time::{sleep, Instant};

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

/// Run one caller per arrival offset and return the sorted dispatch instants.
fn dispatch_all(interval_ms: u64, arrivals_ms: Vec<u64>) -> (Instant, Vec<Instant>) {
    paused_runtime().block_on(async move {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(interval_ms)));
        let start = Instant::now();

        let handles: Vec<_> = arrivals_ms
            .into_iter()
            .map(|offset| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    sleep(Duration::from_millis(offset)).await;
                    limiter.acquire().await
                })
            })
            .collect();

        let mut instants = Vec::with_capacity(handles.len());
        for handle in handles {
            instants.push(handle.await.unwrap());
        }
        instants.sort();
        (start, instants)
    })
}

proptest! {
    /// Property: consecutive dispatches are at least the interval apart.
    #[rstest]
    fn dispatch_gaps_respect_interval(
        interval_ms in 0u64..=500,
        arrivals_ms in prop::collection::vec(0u64..=2_000, 1..=25),
    ) {
        let (_, instants) = dispatch_all(interval_ms, arrivals_ms);
        let interval = Duration::from_millis(interval_ms);

        for pair in instants.windows(2) {
            prop_assert!(
                pair[1] - pair[0] >= interval,
                "gap {:?} shorter than {:?}",
                pair[1] - pair[0],
                interval
            );
        }
    }

    /// Property: no caller dispatches before it arrived, and the limiter adds
    /// no more delay than a strictly back-to-back queue would.
    #[rstest]
    fn dispatch_is_not_delayed_beyond_queue(
        interval_ms in 1u64..=300,
        count in 1usize..=20,
    ) {
        let (start, instants) = dispatch_all(interval_ms, vec![0; count]);
        let interval = Duration::from_millis(interval_ms);

        prop_assert_eq!(instants[0], start);
        let last = *instants.last().unwrap();
        prop_assert!(last - start <= interval * (count as u32 - 1) + Duration::from_millis(1));
    }
}

#[rstest]
#[case(250, 4)]
#[case(0, 4)]
fn test_simultaneous_callers_are_serialized(#[case] interval_ms: u64, #[case] count: usize) {
    let (start, instants) = dispatch_all(interval_ms, vec![0; count]);
    for (i, at) in instants.iter().enumerate() {
        assert_eq!(*at - start, Duration::from_millis(interval_ms) * i as u32);
    }
}
