//! S3 adapter
//!
//! Wraps aws-sdk-s3 behind the ObjectStore trait from ab-core and hosts the
//! bucket purge/delete wrapper used by `ab s3 delete-bucket`.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

use ab_core::{Error, ObjectEntry, ObjectPage, ObjectStore, Result};

/// Batch-delete limit imposed by the DeleteObjects API.
const DELETE_BATCH_SIZE: usize = 1000;

/// S3 client wrapper
pub struct S3Store {
    inner: aws_sdk_s3::Client,
}

impl S3Store {
    /// Create a new S3 adapter from a loaded SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            inner: aws_sdk_s3::Client::new(config),
        }
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    /// Empty a bucket completely, then delete it.
    ///
    /// Removes every object version and delete marker first so versioned
    /// buckets can be deleted, then batch-deletes remaining objects.
    pub async fn delete_bucket_completely(&self, bucket: &str) -> Result<()> {
        self.delete_bucket_contents(bucket).await?;

        tracing::info!(bucket, "deleting bucket");
        self.inner
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("NoSuchBucket") {
                    Error::NotFound(format!("Bucket not found: {bucket}"))
                } else {
                    Error::Network(err_str)
                }
            })?;

        tracing::info!(bucket, "bucket deleted");
        Ok(())
    }

    /// Delete all objects, object versions, and delete markers in a bucket
    pub async fn delete_bucket_contents(&self, bucket: &str) -> Result<()> {
        tracing::info!(bucket, "deleting all objects in bucket");

        // Versioned buckets: remove every version and delete marker first.
        // ListObjectVersions paginates with key/version-id markers, which
        // the SDK does not generate a paginator for.
        let mut key_marker: Option<String> = None;
        let mut version_id_marker: Option<String> = None;

        loop {
            let mut request = self.inner.list_object_versions().bucket(bucket);
            if let Some(marker) = key_marker.take() {
                request = request.key_marker(marker);
            }
            if let Some(marker) = version_id_marker.take() {
                request = request.version_id_marker(marker);
            }

            let page = request
                .send()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;

            for version in page.versions() {
                if let (Some(key), Some(version_id)) = (version.key(), version.version_id()) {
                    self.delete_version(bucket, key, version_id).await?;
                    tracing::debug!(key, version_id, "deleted object version");
                }
            }

            for marker in page.delete_markers() {
                if let (Some(key), Some(version_id)) = (marker.key(), marker.version_id()) {
                    self.delete_version(bucket, key, version_id).await?;
                    tracing::debug!(key, version_id, "deleted delete marker");
                }
            }

            if !page.is_truncated().unwrap_or(false) {
                break;
            }
            key_marker = page.next_key_marker().map(str::to_string);
            version_id_marker = page.next_version_id_marker().map(str::to_string);
            if key_marker.is_none() && version_id_marker.is_none() {
                break;
            }
        }

        // Remaining (unversioned) objects, deleted in API-sized batches.
        let mut keys: Vec<String> = Vec::new();
        let mut pages = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| Error::Network(e.to_string()))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|o| o.key().map(str::to_string)),
            );
        }

        for chunk in keys.chunks(DELETE_BATCH_SIZE) {
            let objects: Vec<ObjectIdentifier> = chunk
                .iter()
                .map(|key| {
                    ObjectIdentifier::builder()
                        .key(key)
                        .build()
                        .map_err(|e| Error::General(e.to_string()))
                })
                .collect::<Result<_>>()?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|e| Error::General(e.to_string()))?;

            self.inner
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;

            tracing::info!(count = chunk.len(), "deleted objects");
        }

        Ok(())
    }

    async fn delete_version(&self, bucket: &str, key: &str, version_id: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .version_id(version_id)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage> {
        let mut request = self.inner.list_objects_v2().bucket(bucket);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let response = request.send().await.map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("NoSuchBucket") {
                Error::NotFound(format!("Bucket not found: {bucket}"))
            } else {
                Error::Network(err_str)
            }
        })?;

        let entries = response
            .contents()
            .iter()
            .map(|object| ObjectEntry {
                key: object.key().unwrap_or_default().to_string(),
                size_bytes: object.size().unwrap_or(0),
                last_modified: object
                    .last_modified()
                    .and_then(|m| jiff::Timestamp::from_second(m.secs()).ok()),
                version_id: None,
            })
            .collect();

        let next_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectPage {
            entries,
            next_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("NotFound") || err_str.contains("NoSuchKey") {
                    Error::NotFound(format!("s3://{bucket}/{key}"))
                } else {
                    Error::Network(err_str)
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }
}
