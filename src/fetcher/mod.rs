//! Fetcher abstraction.
//!
//! A fetcher is handed a [`Reporter`] and, at most once, reports one fragment
//! through it. It must return without blocking; the work itself runs
//! elsewhere. A fetcher that never reports is allowed: the composition it
//! belongs to resolves on its deadline.

pub mod delayed;

pub use crate::compose::group::Reporter;
pub use delayed::{delayed, jittered, never, ready, spawn_after, Delay, DelayedFetcher};

/// Asynchronous producer of one string fragment.
pub trait Fetcher: Send + Sync {
    /// Start the work. The fragment is delivered through `reporter`.
    fn fetch(&self, reporter: Reporter);
}

impl<F> Fetcher for F
where
    F: Fn(Reporter) + Send + Sync,
{
    fn fetch(&self, reporter: Reporter) {
        self(reporter)
    }
}
