//! ab-core: Core library for the awsbuddy CLI
//!
//! This crate provides the SDK-independent core of awsbuddy:
//! - S3 URI parsing and resolution
//! - Capability traits for the AWS services the tool drives
//! - Paginated object enumeration
//! - Bounded-concurrency batch downloads with idempotent resume
//! - Prefix mirroring
//! - Human-effort analytics for labelling jobs
//!
//! The SDK adapters live in ab-aws; this crate can be tested entirely
//! against in-memory fakes and mocks.

pub mod effort;
pub mod enumerate;
pub mod error;
pub mod sync;
pub mod traits;
pub mod transfer;
pub mod uri;

#[cfg(test)]
pub(crate) mod testutil;

pub use effort::{analyse_human_effort, EffortReport, WorkerAggregate};
pub use enumerate::enumerate;
pub use error::{Error, Result};
pub use sync::{mirror_prefix, plan_mirror};
pub use traits::{
    IdentityDirectory, IdentityPage, IdentityUser, LabelingJob, LabelingJobs, ObjectEntry,
    ObjectPage, ObjectStore, Workforce,
};
pub use transfer::{
    download_batch, download_stream, TransferOptions, TransferOutcome, TransferStatus,
    TransferSummary, TransferTask, DEFAULT_CONCURRENCY,
};
pub use uri::S3Uri;
