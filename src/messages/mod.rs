//! Two-part message loading.
//!
//! A fixed two-fetcher application of the composer: fragment one and
//! fragment two are fetched concurrently and joined as `"<one> <two>"`, or
//! replaced by the timeout message when either misses the deadline.

pub mod source;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::compose::{Composer, DEFAULT_TIMEOUT};
use crate::fetcher::{Fetcher, Reporter};

pub use source::DelayedMessageSource;

/// Supplier of the two message fragments.
pub trait MessageSource: Send + Sync + 'static {
    fn fetch_message_one(&self, reporter: Reporter);
    fn fetch_message_two(&self, reporter: Reporter);
}

/// Composer over `source`'s two fetchers with the default deadline.
pub fn message_composer<S: MessageSource>(source: Arc<S>) -> Composer {
    let one = Arc::clone(&source);
    let two = source;
    let fetchers: Vec<Arc<dyn Fetcher>> = vec![
        Arc::new(move |reporter: Reporter| one.fetch_message_one(reporter)),
        Arc::new(move |reporter: Reporter| two.fetch_message_two(reporter)),
    ];
    Composer::new(fetchers)
}

/// Load the two-part message, delivering the text or the timeout message.
///
/// Must be called from within a Tokio runtime.
pub fn load_message<S, F>(source: Arc<S>, completion: F) -> JoinHandle<()>
where
    S: MessageSource,
    F: FnOnce(String) + Send + 'static,
{
    load_message_within(source, DEFAULT_TIMEOUT, completion)
}

/// [`load_message`] with an explicit deadline.
pub fn load_message_within<S, F>(source: Arc<S>, timeout: Duration, completion: F) -> JoinHandle<()>
where
    S: MessageSource,
    F: FnOnce(String) + Send + 'static,
{
    message_composer(source)
        .with_timeout(timeout)
        .load(move |outcome| completion(outcome.into_message()))
}
