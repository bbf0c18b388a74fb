//! Bounded-concurrency batch downloads
//!
//! Executes a batch of transfer tasks across a capped number of in-flight
//! downloads and reports exactly one outcome per task, unordered. A task
//! failure is isolated: it never aborts the rest of the batch, and no task
//! is retried. The caller is blocked until every submitted task has an
//! outcome.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::traits::ObjectStore;

/// Default number of concurrent downloads
pub const DEFAULT_CONCURRENCY: usize = 100;

/// One object to fetch: remote address plus local destination.
///
/// Immutable once submitted; each task owns a unique destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    /// Source bucket
    pub bucket: String,
    /// Source key
    pub key: String,
    /// Local destination path
    pub destination: PathBuf,
}

impl TransferTask {
    /// Create a new transfer task
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            destination: destination.into(),
        }
    }
}

/// Terminal state of one transfer task
#[derive(Debug)]
pub enum TransferStatus {
    /// Object was fetched and written to the destination
    Downloaded,
    /// Destination already existed and skip-existing was enabled
    SkippedExisting,
    /// Transfer failed; the rest of the batch is unaffected
    Failed(Error),
}

impl TransferStatus {
    /// Whether this outcome is a failure
    pub fn is_failed(&self) -> bool {
        matches!(self, TransferStatus::Failed(_))
    }
}

/// Result of one submitted task, keyed by the task itself
#[derive(Debug)]
pub struct TransferOutcome {
    /// The task this outcome belongs to
    pub task: TransferTask,
    /// How the task ended
    pub status: TransferStatus,
}

/// Options for batch downloads
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Skip tasks whose destination already exists (idempotent resume)
    pub skip_existing: bool,
    /// Create destination parent directories before downloading
    pub create_folders: bool,
    /// Maximum number of concurrent downloads
    pub concurrency: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            skip_existing: false,
            create_folders: true,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl TransferOptions {
    /// Enable or disable the skip-existing check
    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    /// Set the maximum number of concurrent downloads
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Per-status tallies over a batch of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    /// Tasks that fetched and wrote their object
    pub downloaded: usize,
    /// Tasks skipped because the destination already existed
    pub skipped: usize,
    /// Tasks that failed
    pub failed: usize,
}

impl TransferSummary {
    /// Tally a set of outcomes
    pub fn of(outcomes: &[TransferOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome.status {
                TransferStatus::Downloaded => summary.downloaded += 1,
                TransferStatus::SkippedExisting => summary.skipped += 1,
                TransferStatus::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    /// Total number of outcomes tallied
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}

/// Download a batch of tasks with bounded concurrency.
///
/// Returns one outcome per submitted task, in completion order. Parent
/// directories are materialized up front from the deduplicated set of
/// destination parents; `create_dir_all` is idempotent, so concurrent
/// re-creation elsewhere is harmless.
pub async fn download_batch<S>(
    store: &S,
    tasks: Vec<TransferTask>,
    options: &TransferOptions,
) -> Result<Vec<TransferOutcome>>
where
    S: ObjectStore + ?Sized,
{
    let outcomes = download_stream(store, tasks, options)
        .await?
        .collect::<Vec<_>>()
        .await;
    Ok(outcomes)
}

/// Stream variant of [`download_batch`]: yields each outcome as its task
/// completes, letting callers report progress while the batch runs.
pub async fn download_stream<'a, S>(
    store: &'a S,
    tasks: Vec<TransferTask>,
    options: &TransferOptions,
) -> Result<BoxStream<'a, TransferOutcome>>
where
    S: ObjectStore + ?Sized,
{
    tracing::info!(count = tasks.len(), "downloading batch");

    if options.create_folders {
        let folders: BTreeSet<PathBuf> = tasks
            .iter()
            .filter_map(|t| t.destination.parent().map(Path::to_path_buf))
            .collect();

        for folder in folders {
            tracing::debug!(folder = %folder.display(), "creating folder");
            tokio::fs::create_dir_all(&folder).await?;
        }
    }

    let concurrency = options.concurrency.max(1);
    let skip_existing = options.skip_existing;

    Ok(stream::iter(
        tasks
            .into_iter()
            .map(move |task| run_task(store, task, skip_existing)),
    )
    .buffer_unordered(concurrency)
    .boxed())
}

async fn run_task<S>(store: &S, task: TransferTask, skip_existing: bool) -> TransferOutcome
where
    S: ObjectStore + ?Sized,
{
    if skip_existing && tokio::fs::try_exists(&task.destination).await.unwrap_or(false) {
        tracing::debug!(key = %task.key, "destination exists, skipping");
        return TransferOutcome {
            task,
            status: TransferStatus::SkippedExisting,
        };
    }

    let status = match store.get_object(&task.bucket, &task.key).await {
        Ok(data) => match tokio::fs::write(&task.destination, &data).await {
            Ok(()) => TransferStatus::Downloaded,
            Err(e) => TransferStatus::Failed(Error::Io(e)),
        },
        Err(e) => TransferStatus::Failed(e),
    };

    if let TransferStatus::Failed(e) = &status {
        tracing::warn!(key = %task.key, error = %e, "download failed");
    }

    TransferOutcome { task, status }
}
