//! Metrics collection and exposition.
//!
//! # Metrics
//! - `composer_outcomes_total` (counter): compositions by outcome
//! - `composer_duration_seconds` (histogram): time from start to settlement
//! - `composer_late_fragments_total` (counter): fragments discarded after settlement

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a settled composition.
pub fn record_outcome(outcome: &'static str, elapsed: Duration) {
    counter!("composer_outcomes_total", "outcome" => outcome).increment(1);
    histogram!("composer_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record a fragment that arrived after its composition settled.
pub fn record_late_fragment() {
    counter!("composer_late_fragments_total").increment(1);
}
