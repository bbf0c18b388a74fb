//! ab - AWS administrative operations CLI
//!
//! Batch download, sync, and maintenance tooling for AWS accounts:
//! S3 prefix mirroring, labelling-job effort reports, DynamoDB table
//! truncation, and Route 53 zone export/import.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod exit_code;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --debug overrides RUST_LOG; otherwise the environment decides.
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::debug!(command = ?cli.command, "parsed command line");

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
