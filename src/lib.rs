//! Deadline-bounded message composition.
//!
//! Runs an ordered set of asynchronous fetchers concurrently and joins their
//! fragments in fetcher order, or yields a fixed timeout message if any of
//! them misses the deadline.

pub mod compose;
pub mod config;
pub mod fetcher;
pub mod messages;
pub mod observability;

pub use compose::{compose, compose_blocking, ComposeError, Composer, Outcome, TIMEOUT_MESSAGE};
pub use config::ComposerConfig;
pub use fetcher::{Fetcher, Reporter};
pub use messages::{load_message, MessageSource};
