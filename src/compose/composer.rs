//! Composer: fan out over fetchers, fan in under one deadline.

use std::panic;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::{self, JoinHandle};
use tracing::Instrument;
use uuid::Uuid;

use crate::compose::error::ComposeError;
use crate::compose::group::{FetcherEntry, JoinGroup};
use crate::compose::outcome::{Outcome, DEFAULT_TIMEOUT};
use crate::fetcher::Fetcher;
use crate::observability::metrics;

/// Ordered set of fetchers plus the deadline applied to each composition.
///
/// A `Composer` holds no per-run state; every call to [`fetch`](Composer::fetch),
/// [`compose`](Composer::compose) or [`load`](Composer::load) starts a fresh
/// composition with its own result slots.
#[derive(Clone)]
pub struct Composer {
    entries: Vec<FetcherEntry>,
    timeout: Duration,
}

impl Composer {
    /// Create a composer that launches all fetchers at once.
    pub fn new<I>(fetchers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Fetcher>>,
    {
        Self {
            entries: fetchers
                .into_iter()
                .map(|fetcher| FetcherEntry { fetcher, after: None })
                .collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn builder() -> ComposerBuilder {
        ComposerBuilder::default()
    }

    /// Replace the deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run one composition, blocking the calling thread until it settles.
    ///
    /// Safe to call from inside a Tokio runtime. On a multi-thread runtime the
    /// worker is handed off with `block_in_place`; on a current-thread runtime
    /// the wait moves to a scoped OS thread so the runtime's timers are not the
    /// ones driving delayed fetchers. Prefer [`compose`](Composer::compose) in
    /// async code.
    pub fn fetch(&self) -> Outcome {
        let span = self.span();
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                task::block_in_place(|| self.fetch_here(&span))
            }
            // A blocked current-thread runtime cannot fire its own timers.
            Ok(_) => thread::scope(|scope| {
                match scope.spawn(|| self.fetch_here(&span)).join() {
                    Ok(outcome) => outcome,
                    Err(payload) => panic::resume_unwind(payload),
                }
            }),
            Err(_) => self.fetch_here(&span),
        }
    }

    fn fetch_here(&self, span: &tracing::Span) -> Outcome {
        let _entered = span.enter();

        let started = Instant::now();
        let group = JoinGroup::new(self.entries.clone(), deadline_after(started, self.timeout));
        group.start();
        let outcome = group.wait_blocking();

        finish(&outcome, started);
        outcome
    }

    /// Run one composition, suspending the current task until it settles.
    pub async fn compose(&self) -> Outcome {
        let span = self.span();
        async {
            let started = Instant::now();
            let group = JoinGroup::new(self.entries.clone(), deadline_after(started, self.timeout));
            group.start();
            let outcome = group.wait().await;

            finish(&outcome, started);
            outcome
        }
        .instrument(span)
        .await
    }

    /// Run one composition on the Tokio runtime and hand the outcome to `completion`.
    ///
    /// Returns as soon as the work is scheduled. Must be called from within a
    /// Tokio runtime.
    pub fn load<F>(&self, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let composer = self.clone();
        tokio::spawn(async move {
            let outcome = composer.compose().await;
            completion(outcome);
        })
    }

    fn span(&self) -> tracing::Span {
        tracing::debug_span!(
            "composition",
            id = %Uuid::new_v4(),
            fetchers = self.entries.len(),
            timeout_ms = self.timeout.as_millis() as u64
        )
    }
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("fetchers", &self.entries.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for composers with dependency-ordered fetchers.
#[derive(Default)]
pub struct ComposerBuilder {
    entries: Vec<FetcherEntry>,
    timeout: Option<Duration>,
}

impl ComposerBuilder {
    /// Append a fetcher launched when the composition starts.
    pub fn fetcher<F>(self, fetcher: F) -> Self
    where
        F: Fetcher + 'static,
    {
        self.shared(Arc::new(fetcher))
    }

    /// Append an already shared fetcher.
    pub fn shared(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.entries.push(FetcherEntry { fetcher, after: None });
        self
    }

    /// Append a fetcher launched only once fetcher `after` has reported.
    ///
    /// The composition deadline still counts from the start of the whole run.
    pub fn fetcher_after<F>(mut self, fetcher: F, after: usize) -> Self
    where
        F: Fetcher + 'static,
    {
        self.entries.push(FetcherEntry {
            fetcher: Arc::new(fetcher),
            after: Some(after),
        });
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Composer, ComposeError> {
        for (index, entry) in self.entries.iter().enumerate() {
            if let Some(after) = entry.after {
                if after >= index {
                    return Err(ComposeError::InvalidDependency { index, after });
                }
            }
        }

        Ok(Composer {
            entries: self.entries,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

/// Compose `fetchers` under `timeout`, awaiting the outcome.
pub async fn compose(fetchers: Vec<Arc<dyn Fetcher>>, timeout: Duration) -> Outcome {
    Composer::new(fetchers).with_timeout(timeout).compose().await
}

/// Compose `fetchers` under `timeout`, blocking the calling thread.
///
/// May be called from synchronous code or from inside a Tokio runtime of
/// either flavor; see [`Composer::fetch`].
pub fn compose_blocking(fetchers: Vec<Arc<dyn Fetcher>>, timeout: Duration) -> Outcome {
    Composer::new(fetchers).with_timeout(timeout).fetch()
}

fn deadline_after(started: Instant, timeout: Duration) -> Instant {
    // Saturate absurd timeouts to roughly a century.
    started
        .checked_add(timeout)
        .unwrap_or_else(|| started + Duration::from_secs(100 * 365 * 24 * 60 * 60))
}

fn finish(outcome: &Outcome, started: Instant) {
    let elapsed = started.elapsed();
    metrics::record_outcome(outcome.label(), elapsed);

    match outcome {
        Outcome::Composed(text) => tracing::debug!(
            elapsed_ms = elapsed.as_millis() as u64,
            length = text.len(),
            "Composition complete"
        ),
        Outcome::TimedOut => tracing::warn!(
            elapsed_ms = elapsed.as_millis() as u64,
            "Composition timed out"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{ready, Reporter};

    #[test]
    fn test_builder_rejects_forward_dependency() {
        let result = Composer::builder()
            .fetcher(ready("a"))
            .fetcher_after(ready("b"), 1)
            .build();
        assert_eq!(
            result.unwrap_err(),
            ComposeError::InvalidDependency { index: 1, after: 1 }
        );

        let result = Composer::builder()
            .fetcher_after(ready("a"), 3)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let composer = Composer::builder()
            .fetcher(ready("a"))
            .fetcher_after(ready("b"), 0)
            .build()
            .unwrap();
        assert_eq!(composer.len(), 2);
        assert_eq!(composer.timeout(), DEFAULT_TIMEOUT);

        let composer = composer.with_timeout(Duration::from_millis(10));
        assert_eq!(composer.timeout(), Duration::from_millis(10));
    }

    #[test]
    fn test_ready_fetchers_compose_blocking() {
        let composer = Composer::builder()
            .fetcher(ready("Hello"))
            .fetcher(|reporter: Reporter| reporter.report("world"))
            .build()
            .unwrap();
        assert_eq!(composer.fetch(), Outcome::Composed("Hello world".to_string()));
    }

    #[test]
    fn test_empty_composer_yields_empty_text() {
        let composer = Composer::new(Vec::new());
        assert!(composer.is_empty());
        assert_eq!(composer.fetch(), Outcome::Composed(String::new()));
    }

    #[test]
    fn test_zero_timeout_times_out() {
        let composer = Composer::new(vec![Arc::new(crate::fetcher::never()) as Arc<dyn Fetcher>])
            .with_timeout(Duration::ZERO);
        assert_eq!(composer.fetch(), Outcome::TimedOut);
    }

    #[tokio::test]
    async fn test_fetch_inside_current_thread_runtime() {
        let composer = Composer::new(vec![
            Arc::new(crate::fetcher::delayed("Hello", Duration::from_millis(1))) as Arc<dyn Fetcher>,
            Arc::new(crate::fetcher::delayed("world", Duration::from_millis(1))),
        ])
        .with_timeout(Duration::from_millis(500));
        assert_eq!(composer.fetch(), Outcome::Composed("Hello world".to_string()));
    }

    #[tokio::test]
    async fn test_load_delivers_outcome_once() {
        let composer = Composer::new(vec![Arc::new(ready("only")) as Arc<dyn Fetcher>]);
        let (tx, rx) = tokio::sync::oneshot::channel();
        composer.load(move |outcome| {
            let _ = tx.send(outcome);
        });
        assert_eq!(rx.await.unwrap(), Outcome::Composed("only".to_string()));
    }
}
