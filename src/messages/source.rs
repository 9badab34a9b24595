//! Timer-driven message source.

use crate::config::MessageConfig;
use crate::fetcher::{jittered, DelayedFetcher, Fetcher, Reporter};
use crate::messages::MessageSource;

/// Message source backed by two [`DelayedFetcher`]s.
#[derive(Debug, Clone)]
pub struct DelayedMessageSource {
    one: DelayedFetcher,
    two: DelayedFetcher,
}

impl DelayedMessageSource {
    pub fn new(one: DelayedFetcher, two: DelayedFetcher) -> Self {
        Self { one, two }
    }

    /// Both parts answer after a random delay within the configured bounds.
    pub fn from_config(config: &MessageConfig) -> Self {
        Self {
            one: jittered(config.message_one.clone(), config.min_delay(), config.max_delay()),
            two: jittered(config.message_two.clone(), config.min_delay(), config.max_delay()),
        }
    }
}

impl MessageSource for DelayedMessageSource {
    fn fetch_message_one(&self, reporter: Reporter) {
        self.one.fetch(reporter);
    }

    fn fetch_message_two(&self, reporter: Reporter) {
        self.two.fetch(reporter);
    }
}
