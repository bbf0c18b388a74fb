//! S3 URI parsing
//!
//! Handles parsing of remote object locators in the format: s3://bucket[/key].
//! Keys are taken verbatim: no percent-decoding, no normalization, so any
//! byte sequence S3 accepts in a key round-trips through parse and Display.

use crate::error::{Error, Result};

const SCHEME_PREFIX: &str = "s3://";

/// A parsed S3 locator pointing at a bucket, prefix, or single object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    /// Bucket name
    pub bucket: String,
    /// Object key (empty for the bucket root)
    pub key: String,
}

impl S3Uri {
    /// Create an S3Uri from already-split components
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse an `s3://bucket[/key]` string
    pub fn parse(input: &str) -> Result<Self> {
        let Some(rest) = input.strip_prefix(SCHEME_PREFIX) else {
            return Err(match input.split_once("://") {
                Some((scheme, _)) => Error::InvalidUri(format!(
                    "unsupported scheme '{scheme}' in '{input}'"
                )),
                None => {
                    Error::InvalidUri(format!("expected s3://bucket[/key], got '{input}'"))
                }
            });
        };

        let (bucket, key) = match rest.split_once('/') {
            Some((bucket, key)) => (bucket, key),
            None => (rest, ""),
        };

        if bucket.is_empty() {
            return Err(Error::InvalidUri(format!(
                "missing bucket name in '{input}'"
            )));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Last path segment of the key (empty for the bucket root)
    pub fn filename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or("")
    }

    /// Locator one level up, with the final key segment removed
    ///
    /// A root-level key (no `/`) yields the bucket root (empty key),
    /// as does the bucket root itself.
    pub fn parent(&self) -> Self {
        let trimmed = self.key.trim_end_matches('/');
        let key = match trimmed.rfind('/') {
            Some(pos) => trimmed[..pos].to_string(),
            None => String::new(),
        };

        Self {
            bucket: self.bucket.clone(),
            key,
        }
    }
}

impl std::fmt::Display for S3Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.key.is_empty() {
            write!(f, "s3://{}", self.bucket)
        } else {
            write!(f, "s3://{}/{}", self.bucket, self.key)
        }
    }
}
