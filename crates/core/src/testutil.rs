//! In-memory object store fake for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::traits::{ObjectEntry, ObjectPage, ObjectStore};

/// An object store backed by pre-built listing pages and object bodies.
///
/// Listing cursors are page indices rendered as strings, so tests can
/// exercise 0, 1, and many page boundaries deterministically.
#[derive(Default)]
pub(crate) struct FakeStore {
    pages: Vec<Vec<ObjectEntry>>,
    objects: HashMap<String, Vec<u8>>,
    fail_gets: Vec<String>,
    fail_page: Option<usize>,
    page_fetches: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing pages as (key, size) tuples.
    pub fn with_pages(mut self, pages: Vec<Vec<(&str, i64)>>) -> Self {
        self.pages = pages
            .into_iter()
            .map(|page| {
                page.into_iter()
                    .map(|(key, size_bytes)| ObjectEntry {
                        key: key.to_string(),
                        size_bytes,
                        last_modified: None,
                        version_id: None,
                    })
                    .collect()
            })
            .collect();
        self
    }

    pub fn with_object(mut self, key: &str, body: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(key.to_string(), body.into());
        self
    }

    /// Make get_object fail for the given key.
    pub fn failing_get(mut self, key: &str) -> Self {
        self.fail_gets.push(key.to_string());
        self
    }

    /// Make the listing fail when the given page index is requested.
    pub fn failing_page(mut self, index: usize) -> Self {
        self.fail_page = Some(index);
        self
    }

    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn list_objects_page(
        &self,
        _bucket: &str,
        _prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);

        let index: usize = match continuation_token {
            None => 0,
            Some(token) => token.parse().expect("fake cursor"),
        };

        if self.fail_page == Some(index) {
            return Err(Error::Network("injected listing failure".into()));
        }

        let entries = self.pages.get(index).cloned().unwrap_or_default();
        let next_token = if index + 1 < self.pages.len() {
            Some((index + 1).to_string())
        } else {
            None
        };

        Ok(ObjectPage {
            entries,
            next_token,
        })
    }

    async fn get_object(&self, _bucket: &str, key: &str) -> Result<Vec<u8>> {
        if self.fail_gets.iter().any(|k| k == key) {
            return Err(Error::Network(format!("injected failure for {key}")));
        }

        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }
}
