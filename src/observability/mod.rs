//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Compositions produce:
//!     → logging.rs (structured log events, one span per composition)
//!     → metrics.rs (outcome counters, duration histogram, late fragments)
//!
//! Consumers:
//!     → Log output (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Composition ID flows through every event of a run
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
