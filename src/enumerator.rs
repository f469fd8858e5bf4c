// src/enumerator.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! Paginated enumeration of every key under a prefix.

use async_stream::try_stream;
use futures::Stream;
use tracing::debug;

use crate::error::{AclError, Result};
use crate::store::AclStore;

/// Lazily list every key under `prefix`, one page at a time.
///
/// Each item is a complete page of keys, so a page is fully fetched before
/// any of its keys are handed off. The stream ends once the backend stops
/// returning a continuation token. The first listing error is yielded as
/// `AclError::Listing` and terminates the stream; pages already yielded are
/// not affected. Restarting means building a new stream from the first page.
///
/// ```ignore
/// use futures::{pin_mut, StreamExt};
///
/// let pages = list_pages(&store, "my-bucket", "data/");
/// pin_mut!(pages);
/// while let Some(page) = pages.next().await {
///     for key in page? {
///         println!("{key}");
///     }
/// }
/// ```
pub fn list_pages<'a, S>(
    store: &'a S,
    bucket: &'a str,
    prefix: &'a str,
) -> impl Stream<Item = Result<Vec<String>>> + Send + 'a
where
    S: AclStore + ?Sized,
{
    try_stream! {
        let mut continuation: Option<String> = None;
        let mut page_no = 0usize;

        loop {
            let page = store
                .list_page(bucket, prefix, continuation.take())
                .await
                .map_err(|source| AclError::Listing {
                    bucket: bucket.to_string(),
                    source,
                })?;
            page_no += 1;
            debug!("Page {} under s3://{}/{}: {} keys", page_no, bucket, prefix, page.keys.len());

            let last = page.next_token.is_none();
            continuation = page.next_token;
            yield page.keys;

            if last {
                break;
            }
        }
    }
}
