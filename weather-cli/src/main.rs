//! Binary crate for the `weather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Printing the aggregated temperature report

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the JSON report.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
