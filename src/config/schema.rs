//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ComposerConfig {
    /// Composition deadline.
    pub composition: CompositionConfig,

    /// Stock two-part message source.
    pub messages: MessageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Composition settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Deadline for a whole composition in milliseconds.
    pub timeout_ms: u64,
}

impl CompositionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

/// Two-part message source with jittered latency.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MessageConfig {
    /// First fragment.
    pub message_one: String,

    /// Second fragment.
    pub message_two: String,

    /// Lower bound of each fetcher's simulated latency in milliseconds.
    pub min_delay_ms: u64,

    /// Upper bound of each fetcher's simulated latency in milliseconds.
    pub max_delay_ms: u64,
}

impl MessageConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            message_one: "Hello".to_string(),
            message_two: "world".to_string(),
            min_delay_ms: 0,
            // Past the default deadline so both outcomes show up.
            max_delay_ms: 2500,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
