//! S3 commands: ls, sync, delete-bucket
//!
//! `ls` streams the enumerator directly; `sync` mirrors a prefix into a
//! local directory with bounded concurrency and idempotent skips;
//! `delete-bucket` purges every object version before removing the bucket.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;

use ab_aws::{load_sdk_config, S3Store, SessionConfig};
use ab_core::{
    download_stream, enumerate, plan_mirror, ObjectEntry, S3Uri, TransferOptions, TransferStatus,
    TransferSummary, DEFAULT_CONCURRENCY,
};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

#[derive(Subcommand, Debug)]
pub enum S3Commands {
    /// List objects under a prefix
    Ls(LsArgs),

    /// Mirror a prefix into a local directory
    Sync(SyncArgs),

    /// Empty a bucket (all versions and delete markers) and delete it
    DeleteBucket(DeleteBucketArgs),
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote location (s3://bucket[/prefix])
    pub uri: String,

    /// Summarize output (show totals)
    #[arg(long)]
    pub summarize: bool,
}

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Remote location (s3://bucket[/prefix])
    pub uri: String,

    /// Local directory to mirror into
    pub dir: PathBuf,

    /// Maximum number of concurrent downloads
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
}

/// Arguments for the delete-bucket command
#[derive(Args, Debug)]
pub struct DeleteBucketArgs {
    /// Bucket to delete
    pub bucket: String,

    /// Confirm deletion of the bucket and everything in it
    #[arg(long)]
    pub force: bool,
}

/// Output structure for ls (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    objects: Vec<ObjectEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<LsSummary>,
}

#[derive(Debug, Serialize)]
struct LsSummary {
    total_objects: usize,
    total_size_bytes: i64,
    total_size_human: String,
}

/// Output structure for sync (JSON format)
#[derive(Debug, Serialize)]
struct SyncOutput {
    summary: TransferSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<SyncFailure>,
}

#[derive(Debug, Serialize)]
struct SyncFailure {
    key: String,
    error: String,
}

/// Execute an S3 subcommand
pub async fn execute(cmd: S3Commands, session: &SessionConfig, config: OutputConfig) -> ExitCode {
    match cmd {
        S3Commands::Ls(args) => ls(args, session, config).await,
        S3Commands::Sync(args) => sync(args, session, config).await,
        S3Commands::DeleteBucket(args) => delete_bucket(args, session, config).await,
    }
}

async fn ls(args: LsArgs, session: &SessionConfig, config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(config);

    let uri = match S3Uri::parse(&args.uri) {
        Ok(uri) => uri,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let store = S3Store::new(&load_sdk_config(session).await);
    let mut stream = enumerate(&store, &uri.bucket, &uri.key);

    let mut objects = Vec::new();
    loop {
        match stream.try_next().await {
            Ok(Some(entry)) => {
                if !formatter.is_json() {
                    formatter.println(&render_entry(&entry));
                }
                objects.push(entry);
            }
            Ok(None) => break,
            Err(e) => {
                formatter.error(&e.to_string());
                return ExitCode::from_error(&e);
            }
        }
    }

    let total_size: i64 = objects.iter().map(|o| o.size_bytes).sum();
    let total_objects = objects.len();

    if formatter.is_json() {
        let output = LsOutput {
            objects,
            summary: args.summarize.then(|| LsSummary {
                total_objects,
                total_size_bytes: total_size,
                total_size_human: humansize::format_size(
                    total_size.max(0) as u64,
                    humansize::BINARY,
                ),
            }),
        };
        formatter.json(&output);
    } else if args.summarize {
        formatter.println(&format!(
            "\nTotal: {} objects, {}",
            total_objects,
            humansize::format_size(total_size.max(0) as u64, humansize::BINARY)
        ));
    }

    ExitCode::Success
}

fn render_entry(entry: &ObjectEntry) -> String {
    let date = entry
        .last_modified
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "                   ".to_string());
    let size = humansize::format_size(entry.size_bytes.max(0) as u64, humansize::BINARY);
    format!("[{date}] {size:>10} {}", entry.key)
}

async fn sync(args: SyncArgs, session: &SessionConfig, config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(config.clone());

    let uri = match S3Uri::parse(&args.uri) {
        Ok(uri) => uri,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let store = S3Store::new(&load_sdk_config(session).await);

    let spinner = ProgressBar::spinner(&config, &format!("listing {uri}"));
    let entries: Vec<ObjectEntry> = match enumerate(&store, &uri.bucket, &uri.key)
        .try_collect()
        .await
    {
        Ok(entries) => entries,
        Err(e) => {
            spinner.finish_and_clear();
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };
    spinner.finish_and_clear();

    let tasks = plan_mirror(&uri.bucket, &uri.key, &args.dir, &entries);
    let options = TransferOptions::default()
        .with_skip_existing(true)
        .with_concurrency(args.concurrency);

    let bar = ProgressBar::new(&config, tasks.len() as u64);
    let mut outcomes = Vec::with_capacity(tasks.len());
    {
        let mut stream = match download_stream(&store, tasks, &options).await {
            Ok(stream) => stream,
            Err(e) => {
                bar.finish_and_clear();
                formatter.error(&e.to_string());
                return ExitCode::from_error(&e);
            }
        };

        while let Some(outcome) = stream.next().await {
            bar.inc(1);
            outcomes.push(outcome);
        }
    }
    bar.finish_and_clear();

    let summary = TransferSummary::of(&outcomes);
    let failures: Vec<SyncFailure> = outcomes
        .iter()
        .filter_map(|o| match &o.status {
            TransferStatus::Failed(e) => Some(SyncFailure {
                key: o.task.key.clone(),
                error: e.to_string(),
            }),
            _ => None,
        })
        .collect();

    if formatter.is_json() {
        formatter.json(&SyncOutput { summary, failures });
    } else {
        for failure in &failures {
            formatter.error(&format!("{}: {}", failure.key, failure.error));
        }
        formatter.success(&format!(
            "Synced {uri}: {} downloaded, {} skipped, {} failed",
            summary.downloaded, summary.skipped, summary.failed
        ));
    }

    if summary.failed > 0 {
        ExitCode::GeneralError
    } else {
        ExitCode::Success
    }
}

async fn delete_bucket(
    args: DeleteBucketArgs,
    session: &SessionConfig,
    config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(config.clone());

    if !args.force {
        formatter.error(&format!(
            "Refusing to delete bucket '{}' and all its contents; pass --force to confirm",
            args.bucket
        ));
        return ExitCode::UsageError;
    }

    let store = S3Store::new(&load_sdk_config(session).await);

    let spinner = ProgressBar::spinner(&config, &format!("emptying bucket {}", args.bucket));
    let result = store.delete_bucket_completely(&args.bucket).await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            formatter.success(&format!("Bucket '{}' deleted", args.bucket));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_entry_with_timestamp() {
        let entry = ObjectEntry {
            key: "data/a.json".to_string(),
            size_bytes: 2048,
            last_modified: Some(jiff::Timestamp::UNIX_EPOCH),
            version_id: None,
        };

        let line = render_entry(&entry);
        assert!(line.contains("1970-01-01"));
        assert!(line.contains("2 KiB"));
        assert!(line.ends_with("data/a.json"));
    }

    #[test]
    fn test_render_entry_without_timestamp() {
        let entry = ObjectEntry {
            key: "k".to_string(),
            size_bytes: 0,
            last_modified: None,
            version_id: None,
        };

        let line = render_entry(&entry);
        assert!(line.ends_with(" k"));
    }
}
