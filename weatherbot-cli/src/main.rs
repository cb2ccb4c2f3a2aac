//! Binary crate for the `weatherbot` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - The console report and a terminal chat session

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod chat;
mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so reports on stdout stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("weatherbot=info,weatherbot_core=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
