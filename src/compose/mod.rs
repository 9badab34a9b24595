//! Composition subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → composer.rs (fresh JoinGroup per run, deadline = start + timeout)
//!     → group.rs (launch fetchers, hand each a Reporter)
//!     → fetchers report fragments into index-addressed slots
//!     → waiter wakes on "all reported" or on the deadline
//!     → group.rs settles once: Composed(joined) | TimedOut
//!     → late reports are dropped
//! ```
//!
//! # Design Decisions
//! - Timing out is an outcome, not an error
//! - Fetchers are abandoned, never cancelled
//! - Join order is fetcher order, not completion order
//! - Dependency-ordered fetchers share the single deadline of the run

pub mod composer;
pub mod error;
pub mod group;
pub mod outcome;

pub use composer::{compose, compose_blocking, Composer, ComposerBuilder};
pub use error::ComposeError;
pub use group::Reporter;
pub use outcome::{Outcome, DEFAULT_TIMEOUT, FRAGMENT_SEPARATOR, TIMEOUT_MESSAGE};
