//! Message composer demo runner.
//!
//! Loads the two-part message repeatedly against a jittered source and
//! reports how often it composed versus timed out.
//!
//! ```text
//! config (TOML) ─▶ DelayedMessageSource ─▶ Composer::load × attempts ─▶ JSON summary
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tokio::sync::oneshot;

use message_composer::config::{load_config, ComposerConfig};
use message_composer::messages::{message_composer, DelayedMessageSource};
use message_composer::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "message-composer")]
#[command(about = "Compose a two-part message under a deadline", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of loads to run
    #[arg(short, long, default_value_t = 10)]
    attempts: u32,
}

#[derive(Debug, Default, Serialize)]
struct RunSummary {
    attempts: u32,
    composed: u32,
    timed_out: u32,
    last_message: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ComposerConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    tracing::info!(
        timeout_ms = config.composition.timeout_ms,
        min_delay_ms = config.messages.min_delay_ms,
        max_delay_ms = config.messages.max_delay_ms,
        attempts = cli.attempts,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let source = Arc::new(DelayedMessageSource::from_config(&config.messages));
    let timeout = config.composition.timeout();
    let composer = message_composer(source).with_timeout(timeout);
    let mut summary = RunSummary::default();

    for attempt in 1..=cli.attempts {
        let (tx, rx) = oneshot::channel();
        composer.load(move |outcome| {
            let _ = tx.send(outcome);
        });
        let outcome = rx.await?;

        if outcome.is_timed_out() {
            summary.timed_out += 1;
        } else {
            summary.composed += 1;
        }
        tracing::info!(attempt, outcome = outcome.label(), message = %outcome, "Message loaded");

        summary.attempts = attempt;
        summary.last_message = outcome.into_message();
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
