//! refspan: list the commits between two git references on GitHub
//!
//! Writes one JSON result document to stdout, or with `--stream` one JSON
//! event per line. Logs are written to stderr.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use refspan::config::Config;
use refspan::events::NdjsonSink;
use refspan::pipeline::{self, RunOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // Initialize tracing subscriber; stdout is reserved for JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    let options = config.to_options().context("Invalid configuration")?;
    info!(repository = %options.repository_url, stream = config.stream, "Starting refspan");

    if config.stream {
        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping");
                interrupt.cancel();
            }
        });

        let mut sink = NdjsonSink::new(std::io::stdout());
        let summary = pipeline::run(options, &mut sink, &cancel).await;
        if summary.outcome == RunOutcome::Failed {
            bail!(summary.error.unwrap_or_default());
        }
        return Ok(());
    }

    let outcome = pipeline::collect(options).await;
    let mut stdout = std::io::stdout().lock();
    match outcome {
        Ok(result) => {
            writeln!(stdout, "{}", serde_json::to_string_pretty(&result)?)?;
            Ok(())
        }
        Err(failure) => {
            writeln!(stdout, "{}", serde_json::to_string_pretty(&failure)?)?;
            bail!(failure)
        }
    }
}
