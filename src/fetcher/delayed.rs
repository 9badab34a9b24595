//! Timer-driven fetchers.
//!
//! Used as the stock message providers and for fault injection: a fixed
//! delay, a jittered delay, an immediate answer, or no answer at all.

use std::thread;
use std::time::Duration;

use rand::Rng;
use tokio::runtime::Handle;

use crate::fetcher::{Fetcher, Reporter};

/// When a [`DelayedFetcher`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    /// Report synchronously from `fetch`.
    Immediate,
    /// Report after a fixed delay.
    Fixed(Duration),
    /// Report after a uniformly random delay in `min..=max`.
    Jittered { min: Duration, max: Duration },
    /// Never report.
    Never,
}

impl Delay {
    /// Pick the delay for one run; `None` means the fetcher stays silent.
    pub fn sample(&self) -> Option<Duration> {
        match *self {
            Delay::Immediate => Some(Duration::ZERO),
            Delay::Fixed(delay) => Some(delay),
            Delay::Jittered { min, max } => {
                let min_ms = min.as_millis() as u64;
                let max_ms = max.as_millis() as u64;
                if max_ms <= min_ms {
                    return Some(min);
                }
                let ms = rand::thread_rng().gen_range(min_ms..=max_ms);
                Some(Duration::from_millis(ms))
            }
            Delay::Never => None,
        }
    }
}

/// Reports a fixed fragment according to its [`Delay`].
#[derive(Debug, Clone)]
pub struct DelayedFetcher {
    fragment: String,
    delay: Delay,
}

impl DelayedFetcher {
    pub fn new(fragment: impl Into<String>, delay: Delay) -> Self {
        Self {
            fragment: fragment.into(),
            delay,
        }
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn delay(&self) -> Delay {
        self.delay
    }
}

impl Fetcher for DelayedFetcher {
    fn fetch(&self, reporter: Reporter) {
        let Some(wait) = self.delay.sample() else {
            // Lost fetcher: the reporter is released unreported.
            return;
        };

        let fragment = self.fragment.clone();
        if wait.is_zero() {
            reporter.report(fragment);
        } else {
            spawn_after(wait, move || reporter.report(fragment));
        }
    }
}

/// Run `task` after `delay` without blocking the caller.
///
/// Uses the current Tokio runtime when there is one, otherwise a dedicated thread.
pub fn spawn_after<F>(delay: Duration, task: F)
where
    F: FnOnce() + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                task();
            });
        }
        Err(_) => {
            thread::spawn(move || {
                thread::sleep(delay);
                task();
            });
        }
    }
}

/// Fetcher that reports `fragment` immediately.
pub fn ready(fragment: impl Into<String>) -> DelayedFetcher {
    DelayedFetcher::new(fragment, Delay::Immediate)
}

/// Fetcher that reports `fragment` after `delay`.
pub fn delayed(fragment: impl Into<String>, delay: Duration) -> DelayedFetcher {
    DelayedFetcher::new(fragment, Delay::Fixed(delay))
}

/// Fetcher that reports `fragment` after a random delay in `min..=max`.
pub fn jittered(fragment: impl Into<String>, min: Duration, max: Duration) -> DelayedFetcher {
    DelayedFetcher::new(fragment, Delay::Jittered { min, max })
}

/// Fetcher that never reports.
pub fn never() -> DelayedFetcher {
    DelayedFetcher::new(String::new(), Delay::Never)
}
