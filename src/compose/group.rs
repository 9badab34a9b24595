//! Join group: index-addressed result slots with a single settle point.
//!
//! # Responsibilities
//! - Launch fetchers (immediately, or once the fetcher they depend on reports)
//! - Store each fragment in the slot matching its fetcher position
//! - Wake the waiter when the last slot is filled
//! - Settle exactly once into an [`Outcome`] and discard later reports
//!
//! # Design Decisions
//! - One mutex guards the slots, the remaining count and the outcome cell
//! - The group owns its deadline; a report arriving past it is late even if
//!   the waiter has not woken up yet
//! - Blocking waiters park on a `Condvar`; async waiters on a Tokio `Notify`

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::Notify;
use tokio::time;

use crate::compose::outcome::Outcome;
use crate::fetcher::Fetcher;
use crate::observability::metrics;

/// A fetcher and the earlier fetcher (if any) it must wait for.
#[derive(Clone)]
pub(crate) struct FetcherEntry {
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) after: Option<usize>,
}

struct GroupState {
    slots: Vec<Option<String>>,
    remaining: usize,
    outcome: Option<Outcome>,
}

/// Fan-in point for one composition.
pub(crate) struct JoinGroup {
    entries: Vec<FetcherEntry>,
    /// `dependents[i]` lists the fetchers started when fetcher `i` reports.
    dependents: Vec<Vec<usize>>,
    deadline: Instant,
    state: Mutex<GroupState>,
    completed: Condvar,
    notify: Notify,
}

impl JoinGroup {
    pub(crate) fn new(entries: Vec<FetcherEntry>, deadline: Instant) -> Arc<Self> {
        let count = entries.len();
        let mut dependents = vec![Vec::new(); count];
        for (index, entry) in entries.iter().enumerate() {
            if let Some(after) = entry.after {
                dependents[after].push(index);
            }
        }

        Arc::new(Self {
            entries,
            dependents,
            deadline,
            state: Mutex::new(GroupState {
                slots: vec![None; count],
                remaining: count,
                outcome: None,
            }),
            completed: Condvar::new(),
            notify: Notify::new(),
        })
    }

    /// Launch every fetcher that has no dependency.
    pub(crate) fn start(self: &Arc<Self>) {
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.after.is_none() {
                self.launch(index);
            }
        }
    }

    fn launch(self: &Arc<Self>, index: usize) {
        if self.is_settled() {
            return;
        }

        let reporter = Reporter::new(Arc::clone(self), index);
        let fetcher = &self.entries[index].fetcher;
        let started = panic::catch_unwind(AssertUnwindSafe(|| fetcher.fetch(reporter)));
        if started.is_err() {
            tracing::error!(index, "Fetcher panicked while starting; slot left pending");
        }
    }

    fn lock(&self) -> MutexGuard<'_, GroupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_settled(&self) -> bool {
        self.lock().outcome.is_some()
    }

    fn is_complete(&self) -> bool {
        self.lock().remaining == 0
    }

    fn record(self: &Arc<Self>, index: usize, fragment: String) {
        let complete = {
            let mut state = self.lock();
            if state.outcome.is_some() || Instant::now() > self.deadline {
                tracing::debug!(index, "Discarding fragment reported after the deadline");
                metrics::record_late_fragment();
                return;
            }
            if state.slots[index].is_some() {
                return;
            }

            state.slots[index] = Some(fragment);
            state.remaining -= 1;
            state.remaining == 0
        };

        if complete {
            self.completed.notify_all();
            self.notify.notify_one();
        }

        for &dependent in &self.dependents[index] {
            self.launch(dependent);
        }
    }

    /// Block the calling thread until every slot is filled or the deadline passes.
    pub(crate) fn wait_blocking(&self) -> Outcome {
        let state = self.lock();
        let timeout = self.deadline.saturating_duration_since(Instant::now());
        let (state, _) = self
            .completed
            .wait_timeout_while(state, timeout, |state| state.remaining > 0)
            .unwrap_or_else(PoisonError::into_inner);
        Self::settle_locked(state)
    }

    /// Await until every slot is filled or the deadline passes.
    pub(crate) async fn wait(&self) -> Outcome {
        let deadline_at = time::Instant::from_std(self.deadline);
        while !self.is_complete() {
            if time::timeout_at(deadline_at, self.notify.notified()).await.is_err() {
                break;
            }
        }
        self.settle()
    }

    pub(crate) fn settle(&self) -> Outcome {
        Self::settle_locked(self.lock())
    }

    fn settle_locked(mut state: MutexGuard<'_, GroupState>) -> Outcome {
        if let Some(outcome) = &state.outcome {
            return outcome.clone();
        }

        // Reports past the deadline never fill a slot, so a full set is on time.
        let outcome = match state.remaining {
            0 => Outcome::composed(state.slots.iter().map(|slot| slot.as_deref().unwrap_or_default())),
            _ => {
                let pending = state.slots.iter().filter(|slot| slot.is_none()).count();
                tracing::debug!(pending, "Deadline reached before all fetchers reported");
                Outcome::TimedOut
            }
        };
        state.outcome = Some(outcome.clone());
        outcome
    }
}

/// Single-use callback handed to a fetcher.
///
/// [`report`](Reporter::report) consumes the handle, so a fetcher can deliver
/// at most one fragment. Dropping it unreported leaves the slot pending until
/// the deadline.
pub struct Reporter {
    group: Arc<JoinGroup>,
    index: usize,
    reported: bool,
}

impl Reporter {
    fn new(group: Arc<JoinGroup>, index: usize) -> Self {
        Self {
            group,
            index,
            reported: false,
        }
    }

    /// Position of the fetcher this reporter belongs to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True once the composition has settled; a late report is discarded.
    pub fn is_abandoned(&self) -> bool {
        self.group.is_settled()
    }

    /// Deliver this fetcher's fragment.
    pub fn report(mut self, fragment: impl Into<String>) {
        self.reported = true;
        self.group.record(self.index, fragment.into());
    }

    /// Convert into a plain one-shot callback.
    pub fn into_callback(self) -> impl FnOnce(String) + Send + 'static {
        move |fragment| self.report(fragment)
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("index", &self.index)
            .field("reported", &self.reported)
            .finish()
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if !self.reported && !self.group.is_settled() {
            tracing::debug!(index = self.index, "Fetcher released its reporter without reporting");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    type Parked = Arc<Mutex<Option<Reporter>>>;

    /// A fetcher that stashes its reporter so the test decides when it fires.
    fn parked() -> (FetcherEntry, Parked) {
        let slot: Parked = Arc::new(Mutex::new(None));
        let stash = slot.clone();
        let fetcher = move |reporter: Reporter| {
            *stash.lock().unwrap() = Some(reporter);
        };
        (
            FetcherEntry {
                fetcher: Arc::new(fetcher),
                after: None,
            },
            slot,
        )
    }

    fn fire(slot: &Parked, fragment: &str) {
        let reporter = slot.lock().unwrap().take().expect("fetcher not started");
        reporter.report(fragment);
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[test]
    fn test_slots_follow_fetcher_order() {
        let (a, slot_a) = parked();
        let (b, slot_b) = parked();
        let (c, slot_c) = parked();
        let group = JoinGroup::new(vec![a, b, c], far_deadline());
        group.start();

        fire(&slot_c, "three");
        fire(&slot_a, "one");
        fire(&slot_b, "two");

        let outcome = group.wait_blocking();
        assert_eq!(outcome, Outcome::Composed("one two three".to_string()));
    }

    #[test]
    fn test_late_report_is_discarded() {
        let (a, slot_a) = parked();
        let (b, slot_b) = parked();
        let group = JoinGroup::new(vec![a, b], Instant::now() + Duration::from_millis(20));
        group.start();

        fire(&slot_a, "Hello");
        let outcome = group.wait_blocking();
        assert_eq!(outcome, Outcome::TimedOut);

        fire(&slot_b, "world");
        assert_eq!(group.settle(), Outcome::TimedOut);
    }

    #[test]
    fn test_report_past_deadline_counts_as_late_before_settlement() {
        let (a, slot_a) = parked();
        let group = JoinGroup::new(vec![a], Instant::now());
        group.start();

        std::thread::sleep(Duration::from_millis(5));
        fire(&slot_a, "late");

        // Not settled yet, but the fragment never reached its slot.
        assert!(!group.is_settled());
        assert_eq!(group.lock().slots[0], None);
        assert_eq!(group.settle(), Outcome::TimedOut);
    }

    #[test]
    fn test_reporter_abandoned_once_settled() {
        let (a, slot_a) = parked();
        let (b, slot_b) = parked();
        let group = JoinGroup::new(vec![a, b], Instant::now() + Duration::from_millis(10));
        group.start();

        {
            let guard = slot_b.lock().unwrap();
            let reporter = guard.as_ref().unwrap();
            assert_eq!(reporter.index(), 1);
            assert!(!reporter.is_abandoned());
        }
        assert_eq!(slot_a.lock().unwrap().as_ref().unwrap().index(), 0);

        assert_eq!(group.wait_blocking(), Outcome::TimedOut);
        assert!(slot_b.lock().unwrap().as_ref().unwrap().is_abandoned());
    }

    #[test]
    fn test_empty_group_composes_immediately() {
        let group = JoinGroup::new(Vec::new(), far_deadline());
        group.start();
        assert_eq!(group.wait_blocking(), Outcome::Composed(String::new()));
    }

    #[test]
    fn test_dependent_starts_after_dependency_reports() {
        let (a, slot_a) = parked();
        let (mut b, slot_b) = parked();
        b.after = Some(0);
        let group = JoinGroup::new(vec![a, b], far_deadline());
        group.start();

        assert!(slot_b.lock().unwrap().is_none());
        fire(&slot_a, "Hello");
        assert!(slot_b.lock().unwrap().is_some());
        fire(&slot_b, "world");

        assert_eq!(group.settle(), Outcome::Composed("Hello world".to_string()));
    }

    #[test]
    fn test_dependent_not_started_once_settled() {
        let (a, slot_a) = parked();
        let (mut b, slot_b) = parked();
        b.after = Some(0);
        let group = JoinGroup::new(vec![a, b], Instant::now());
        group.start();

        assert_eq!(group.wait_blocking(), Outcome::TimedOut);
        fire(&slot_a, "Hello");
        assert!(slot_b.lock().unwrap().is_none());
    }

    #[test]
    fn test_panicking_fetcher_leaves_slot_pending() {
        let (a, slot_a) = parked();
        let boom = FetcherEntry {
            fetcher: Arc::new(|_reporter: Reporter| {
                panic!("fetcher failed");
            }),
            after: None,
        };
        let group = JoinGroup::new(vec![a, boom], Instant::now() + Duration::from_millis(20));
        group.start();

        fire(&slot_a, "Hello");
        assert_eq!(group.wait_blocking(), Outcome::TimedOut);
    }

    #[tokio::test]
    async fn test_async_wait_wakes_on_completion() {
        let (a, slot_a) = parked();
        let group = JoinGroup::new(vec![a], far_deadline());
        group.start();

        let waiter = {
            let group = group.clone();
            tokio::spawn(async move { group.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        fire(&slot_a, "done");

        let outcome = waiter.await.unwrap();
        assert_eq!(outcome, Outcome::Composed("done".to_string()));
    }
}
