//! Paginated object enumeration
//!
//! Drives a cursor-based listing API to completion and exposes the result as
//! a flat stream of entries. Page boundaries are an implementation detail:
//! the next page is only requested once the consumer has polled past the
//! current one, so early termination never fetches pages beyond the one
//! already in flight.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::error::{Error, Result};
use crate::traits::{ObjectEntry, ObjectStore};

/// Enumerate all objects under `bucket`/`prefix` as a lazy stream.
///
/// The stream is finite and forward-only; each call re-drives the upstream
/// listing from the first page. A page fetch error ends the stream with
/// [`Error::Enumeration`]; entries already yielded stand.
pub fn enumerate<'a, S>(
    store: &'a S,
    bucket: &'a str,
    prefix: &'a str,
) -> BoxStream<'a, Result<ObjectEntry>>
where
    S: ObjectStore + ?Sized,
{
    // Outer Option is the drive state: Some(cursor) fetches another page,
    // None terminates after the final page has been drained.
    stream::try_unfold(Some(None::<String>), move |state| async move {
        let Some(cursor) = state else {
            return Ok::<_, Error>(None);
        };

        let page = store
            .list_objects_page(bucket, prefix, cursor)
            .await
            .map_err(|e| Error::Enumeration(e.to_string()))?;

        tracing::debug!(
            bucket,
            prefix,
            entries = page.entries.len(),
            has_more = page.next_token.is_some(),
            "fetched listing page"
        );

        let next_state = page.next_token.map(Some);
        let entries = stream::iter(page.entries.into_iter().map(Ok::<_, Error>));

        Ok(Some((entries, next_state)))
    })
    .try_flatten()
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeStore;

    #[tokio::test]
    async fn test_enumerate_empty_listing() {
        let store = FakeStore::new();
        let entries: Vec<_> = enumerate(&store, "bucket", "prefix")
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert!(entries.is_empty());
        assert_eq!(store.page_fetches(), 1);
    }

    #[tokio::test]
    async fn test_enumerate_single_page() {
        let store = FakeStore::new().with_pages(vec![vec![("a.json", 1), ("b.json", 2)]]);
        let entries: Vec<_> = enumerate(&store, "bucket", "")
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "a.json");
        assert_eq!(entries[1].key, "b.json");
        assert_eq!(store.page_fetches(), 1);
    }

    #[tokio::test]
    async fn test_enumerate_crosses_page_boundaries() {
        let store = FakeStore::new().with_pages(vec![
            vec![("p/1", 1), ("p/2", 2)],
            vec![("p/3", 3)],
            vec![("p/4", 4), ("p/5", 5), ("p/6", 6)],
        ]);

        let keys: Vec<String> = enumerate(&store, "bucket", "p/")
            .map_ok(|e| e.key)
            .try_collect::<Vec<_>>()
            .await
            .unwrap();

        assert_eq!(keys, vec!["p/1", "p/2", "p/3", "p/4", "p/5", "p/6"]);
        assert_eq!(store.page_fetches(), 3);
    }

    #[tokio::test]
    async fn test_enumerate_early_stop_fetches_no_extra_pages() {
        let store = FakeStore::new().with_pages(vec![
            vec![("p/1", 1), ("p/2", 2)],
            vec![("p/3", 3)],
            vec![("p/4", 4)],
        ]);

        let mut stream = enumerate(&store, "bucket", "p/");
        let first = stream.try_next().await.unwrap().unwrap();
        assert_eq!(first.key, "p/1");
        drop(stream);

        // Only the page in flight was requested.
        assert_eq!(store.page_fetches(), 1);
    }

    #[tokio::test]
    async fn test_enumerate_surfaces_page_failure() {
        let store = FakeStore::new()
            .with_pages(vec![vec![("p/1", 1)], vec![("p/2", 2)]])
            .failing_page(1);

        let mut stream = enumerate(&store, "bucket", "p/");
        let first = stream.try_next().await.unwrap().unwrap();
        assert_eq!(first.key, "p/1");

        let err = stream.try_next().await.unwrap_err();
        assert!(matches!(err, Error::Enumeration(_)));
    }
}
