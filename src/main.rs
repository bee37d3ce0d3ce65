//! CLI entry point for the PDF crawler.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use pdf_crawler_core::run_crawl;
use tracing::{debug, info};

mod cli;
mod progress;

use cli::Args;
use progress::{ProgressMode, ProgressReporter};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so stdout carries only progress lines and the summary
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(
        query = ?args.query,
        num = args.num,
        allowed_tlds = ?args.allowed_tlds,
        "CLI arguments parsed"
    );

    let mode = ProgressMode::select(args.quiet, io::stdout().is_terminal());
    let config = args.into_config()?;
    info!(query = %config.query, target = config.target, "PDF crawler starting");

    let reporter = ProgressReporter::new(mode, config.target);
    let stats = run_crawl(&config, |report| reporter.report(report)).await?;
    reporter.finish(&stats);

    info!(
        saved = stats.saved(),
        skipped = stats.skipped(),
        requeries = stats.requeries(),
        "Crawl complete"
    );

    Ok(())
}
