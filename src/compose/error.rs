//! Composer construction errors.

use thiserror::Error;

/// Errors raised while building a [`Composer`](super::Composer).
///
/// Timing out is not an error; it is reported as [`Outcome::TimedOut`](super::Outcome::TimedOut).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComposeError {
    /// A fetcher was declared to start after itself or after a later fetcher.
    #[error("fetcher {index} cannot start after fetcher {after}: dependencies must refer to an earlier fetcher")]
    InvalidDependency { index: usize, after: usize },
}
