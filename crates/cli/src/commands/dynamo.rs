//! DynamoDB commands: truncate-table

use clap::{Args, Subcommand};
use serde::Serialize;

use ab_aws::{dynamo, load_sdk_config, SessionConfig};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

#[derive(Subcommand, Debug)]
pub enum DynamoCommands {
    /// Delete every item from a table, leaving the table itself in place
    TruncateTable(TruncateTableArgs),
}

/// Arguments for the truncate-table command
#[derive(Args, Debug)]
pub struct TruncateTableArgs {
    /// Table to truncate
    pub table_name: String,

    /// Confirm deletion of every item in the table
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct TruncateOutput {
    table: String,
    deleted: u64,
}

/// Execute a DynamoDB subcommand
pub async fn execute(
    cmd: DynamoCommands,
    session: &SessionConfig,
    config: OutputConfig,
) -> ExitCode {
    match cmd {
        DynamoCommands::TruncateTable(args) => truncate_table(args, session, config).await,
    }
}

async fn truncate_table(
    args: TruncateTableArgs,
    session: &SessionConfig,
    config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(config.clone());

    if !args.force {
        formatter.error(&format!(
            "Refusing to delete every item in table '{}'; pass --force to confirm",
            args.table_name
        ));
        return ExitCode::UsageError;
    }

    let sdk_config = load_sdk_config(session).await;

    let spinner = ProgressBar::spinner(&config, &format!("truncating table {}", args.table_name));
    let result = dynamo::truncate_table(&sdk_config, &args.table_name).await;
    spinner.finish_and_clear();

    match result {
        Ok(deleted) => {
            if formatter.is_json() {
                formatter.json(&TruncateOutput {
                    table: args.table_name,
                    deleted,
                });
            } else {
                formatter.success(&format!(
                    "Deleted {deleted} items from '{}'",
                    args.table_name
                ));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}
