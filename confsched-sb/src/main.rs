//! confsched-sb - Schedule Builder binary
//!
//! Reads the roster, runs the resolution → discovery → normalization →
//! aggregation pipeline against the configured directory service, and
//! writes the rendered schedule document. Ctrl-C cancels the whole run;
//! a cancelled run writes nothing.

use anyhow::Result;
use clap::Parser;
use confsched_sb::directory::DirectoryClient;
use confsched_sb::{render, Pipeline};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "confsched-sb", about = "Build a presenter schedule from a roster")]
struct Args {
    /// Roster file (TOML, one [[member]] table per person)
    #[arg(long, env = "CONFSCHED_ROSTER")]
    roster: PathBuf,

    /// Output HTML file
    #[arg(long, env = "CONFSCHED_OUTPUT")]
    output: PathBuf,

    /// Configuration file; falls back to CONFSCHED_CONFIG, then the
    /// per-user config directory, then compiled defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!(
        "Starting confsched Schedule Builder v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = confsched_common::config::load_config(args.config.as_deref())?;
    config.validate()?;

    let client = DirectoryClient::new(&config.directory);

    // Ctrl-C cancels the whole run; the pipeline checks the token between
    // units of work and a cancelled run emits no partial document.
    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received, cancelling run");
            signal_token.cancel();
        }
    });

    let pipeline = Pipeline::new(client, config);
    let (document, report) = pipeline.execute(&args.roster, cancel_token).await?;

    let html = render::to_html(&document);
    std::fs::write(&args.output, html)?;

    info!(
        "Schedule of presenters written to {}",
        args.output.display()
    );
    for name in &report.members_without_presentations {
        info!("No presentations found for {}", name);
    }
    if !report.diagnostics.is_empty() {
        tracing::warn!(
            "{} unit(s) of work failed and were skipped; see warnings above",
            report.diagnostics.len()
        );
    }

    Ok(())
}
