//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations,
//! organized by the AWS service they drive.

use clap::{Parser, Subcommand};

use ab_aws::SessionConfig;

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

pub mod completions;
pub mod dynamo;
pub mod route53;
pub mod s3;
pub mod sagemaker;

/// ab - AWS administrative operations CLI
///
/// Batch download, sync, and maintenance tooling: S3 prefix mirroring,
/// labelling-job effort reports, DynamoDB table truncation, and Route 53
/// zone export/import.
#[derive(Parser, Debug)]
#[command(name = "ab")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Named AWS profile to load credentials from
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// AWS region override
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Role ARN to assume before issuing any request
    #[arg(long, global = true, value_name = "ARN")]
    pub assume_role: Option<String>,

    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// S3 object operations: list, sync, delete buckets
    #[command(subcommand)]
    S3(s3::S3Commands),

    /// SageMaker labelling job reports
    #[command(subcommand)]
    Sagemaker(sagemaker::SageMakerCommands),

    /// DynamoDB table maintenance
    #[command(subcommand)]
    Dynamo(dynamo::DynamoCommands),

    /// Route 53 hosted zone export and import
    #[command(subcommand)]
    Route53(route53::Route53Commands),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    let session = SessionConfig {
        profile: cli.profile,
        region: cli.region,
        assume_role: cli.assume_role,
    };

    match cli.command {
        Commands::S3(cmd) => s3::execute(cmd, &session, output_config).await,
        Commands::Sagemaker(cmd) => sagemaker::execute(cmd, &session, output_config).await,
        Commands::Dynamo(cmd) => dynamo::execute(cmd, &session, output_config).await,
        Commands::Route53(cmd) => route53::execute(cmd, &session, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}
