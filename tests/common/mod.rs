//! Shared fetcher fixtures for integration tests.

use std::sync::Arc;
use std::time::Duration;

use message_composer::fetcher::{delayed, Fetcher};

/// Deadlines are checked against real clocks; assertions allow this much slack.
#[allow(dead_code)]
pub const TOLERANCE: Duration = Duration::from_millis(150);

/// Build fetchers that report `fragment` after `delay_ms`.
pub fn delayed_fetchers(plan: &[(&str, u64)]) -> Vec<Arc<dyn Fetcher>> {
    plan.iter()
        .map(|(fragment, delay_ms)| {
            Arc::new(delayed(*fragment, Duration::from_millis(*delay_ms))) as Arc<dyn Fetcher>
        })
        .collect()
}

/// Assert `elapsed` is at least `expected` and no more than `expected + TOLERANCE`.
#[allow(dead_code)]
pub fn assert_elapsed_near(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed >= expected,
        "settled after {:?}, before the {:?} deadline",
        elapsed,
        expected
    );
    assert!(
        elapsed <= expected + TOLERANCE,
        "settled after {:?}, long past the {:?} deadline",
        elapsed,
        expected
    );
}
