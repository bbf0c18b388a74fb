//! SageMaker commands: human-effort
//!
//! Runs the labelling-job effort pipeline and renders the per-identity
//! report as a table or as JSON.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

use ab_aws::{load_sdk_config, CognitoDirectory, S3Store, SageMakerJobs, SessionConfig};
use ab_core::{analyse_human_effort, EffortReport};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

#[derive(Subcommand, Debug)]
pub enum SageMakerCommands {
    /// Report annotation counts and time spent per worker for a labelling job
    HumanEffort(HumanEffortArgs),
}

/// Arguments for the human-effort command
#[derive(Args, Debug)]
pub struct HumanEffortArgs {
    /// Labelling job name
    pub job_name: String,

    /// Directory where worker responses are cached between runs
    #[arg(long, default_value = "temp")]
    pub data_dir: PathBuf,
}

/// Execute a SageMaker subcommand
pub async fn execute(
    cmd: SageMakerCommands,
    session: &SessionConfig,
    config: OutputConfig,
) -> ExitCode {
    match cmd {
        SageMakerCommands::HumanEffort(args) => human_effort(args, session, config).await,
    }
}

async fn human_effort(
    args: HumanEffortArgs,
    session: &SessionConfig,
    config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(config.clone());

    let sdk_config = load_sdk_config(session).await;
    let store = S3Store::new(&sdk_config);
    let jobs = SageMakerJobs::new(&sdk_config);
    let identities = CognitoDirectory::new(&sdk_config);

    let spinner = ProgressBar::spinner(&config, &format!("analysing job {}", args.job_name));
    let result = analyse_human_effort(
        &store,
        &jobs,
        &identities,
        &args.job_name,
        &args.data_dir,
    )
    .await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    if formatter.is_json() {
        formatter.json(&report);
        return ExitCode::Success;
    }

    for warning in &report.warnings {
        formatter.warning(warning);
    }

    formatter.println(&render_report(&report).to_string());
    ExitCode::Success
}

fn render_report(report: &EffortReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Worker", "Annotations", "Time spent"]);

    for (worker, aggregate) in &report.workers {
        table.add_row(vec![
            Cell::new(worker),
            Cell::new(aggregate.annotation_count).set_alignment(CellAlignment::Right),
            Cell::new(format_duration(aggregate.time_spent_seconds))
                .set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}
