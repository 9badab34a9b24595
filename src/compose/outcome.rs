//! Composition outcome.

use std::fmt;
use std::time::Duration;

/// Message delivered in place of the composed text when the deadline passes.
pub const TIMEOUT_MESSAGE: &str = "Unable to load message - Time out exceeded";

/// Separator placed between fragments.
pub const FRAGMENT_SEPARATOR: &str = " ";

/// Deadline applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Result of one composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every fetcher reported before the deadline; fragments joined in fetcher order.
    Composed(String),
    /// At least one fetcher had not reported by the deadline.
    TimedOut,
}

impl Outcome {
    /// Join fragments in slot order.
    pub(crate) fn composed<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                text.push_str(FRAGMENT_SEPARATOR);
            }
            text.push_str(fragment.as_ref());
        }
        Outcome::Composed(text)
    }

    pub fn is_composed(&self) -> bool {
        matches!(self, Outcome::Composed(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut)
    }

    /// The message a caller shows: the composed text or the timeout sentinel.
    pub fn message(&self) -> &str {
        match self {
            Outcome::Composed(text) => text,
            Outcome::TimedOut => TIMEOUT_MESSAGE,
        }
    }

    /// Consume into the caller-facing message.
    pub fn into_message(self) -> String {
        match self {
            Outcome::Composed(text) => text,
            Outcome::TimedOut => TIMEOUT_MESSAGE.to_string(),
        }
    }

    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Composed(_) => "composed",
            Outcome::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        outcome.into_message()
    }
}
