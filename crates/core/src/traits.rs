//! Capability traits at the AWS service boundary
//!
//! These traits define the remote capabilities the core consumes. They are
//! implemented by the SDK adapters in ab-aws and can be mocked for testing,
//! keeping the core decoupled from any specific SDK. Adapters construct the
//! typed descriptors here; the core never touches raw SDK response shapes.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// One entry from a remote object listing
///
/// Produced only by the paginated enumerator; callers never construct these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectEntry {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size_bytes: i64,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// Version id, when the bucket is versioned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// One page of a remote object listing
#[derive(Debug, Clone)]
pub struct ObjectPage {
    /// Entries in this page
    pub entries: Vec<ObjectEntry>,

    /// Continuation cursor for the next page, if any
    pub next_token: Option<String>,
}

/// Description of a labelling job, reduced to what the pipeline needs
#[derive(Debug, Clone)]
pub struct LabelingJob {
    /// Job name
    pub name: String,

    /// S3 URI of the job's output dataset
    pub output_dataset_uri: String,
}

/// Description of a labelling workforce
#[derive(Debug, Clone)]
pub struct Workforce {
    /// Workforce name
    pub name: String,

    /// Identity pool backing the workforce
    pub user_pool_id: String,
}

/// One user from an identity directory listing
#[derive(Debug, Clone)]
pub struct IdentityUser {
    /// Resolvable display identity (an email for Cognito workforces)
    pub username: String,

    /// Stable subject attribute, the join key against worker records
    pub sub: Option<String>,
}

/// One page of an identity directory listing
#[derive(Debug, Clone)]
pub struct IdentityPage {
    /// Users in this page
    pub users: Vec<IdentityUser>,

    /// Pagination token for the next page, if any
    pub next_token: Option<String>,
}

/// Cursor-paginated object storage operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of the object listing under a prefix
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage>;

    /// Get object content as bytes
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}

/// Labelling-job directory operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LabelingJobs: Send + Sync {
    /// Look up a labelling job by name
    async fn describe_labeling_job(&self, name: &str) -> Result<LabelingJob>;

    /// Look up a workforce by name
    async fn describe_workforce(&self, name: &str) -> Result<Workforce>;
}

/// Token-paginated identity directory operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Fetch one page of users in an identity pool
    async fn list_users_page(
        &self,
        pool_id: &str,
        pagination_token: Option<String>,
    ) -> Result<IdentityPage>;
}
