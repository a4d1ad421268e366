//! Common object traversal structures for bucket listings.
//!
//! This module doesn't contain anything special beyond a pseudo-iterator
//! to walk over objects in a bucket in a more idiomatic manner, following
//! continuation tokens until the listing is exhausted.
use crate::storage::{ObjectEntry, ObjectStore};
use crate::types::TrackerResult;

/// Pseudo `Iterator` structure to walk over `ObjectEntry` values.
///
/// As this is a fallible iteration, a `for` style loop cannot be used
/// easily. Instead, this pattern must be used:
///
/// ```rust,ignore
/// let mut walker = ObjectWalker::new(&store, bucket);
///
/// while let Some(object) = walker.next().await? {
///     // do something...
/// }
/// ```
pub struct ObjectWalker<'a> {
    store: &'a dyn ObjectStore,
    token: Option<String>,
    bucket: String,
    buffer: Vec<ObjectEntry>,
    finished: bool,
}

impl<'a> ObjectWalker<'a> {
    /// Construct a new `ObjectWalker` for a bucket.
    pub fn new(store: &'a dyn ObjectStore, bucket: String) -> Self {
        Self {
            store,
            bucket,
            token: None,
            buffer: Vec::new(),
            finished: false,
        }
    }

    /// Attempts to fetch the next `ObjectEntry` in the bucket.
    ///
    /// Calls can fail, which is why a `Result` is returned. Even if a call
    /// succeeds there is no guarantee an object exists, which is why an
    /// `Option` is returned.
    ///
    /// Calling this method does not guarantee a call will be made to the
    /// backend; there may already be buffered data to be returned immediately.
    pub async fn next(&mut self) -> TrackerResult<Option<ObjectEntry>> {
        loop {
            // always check the buffer first
            if !self.buffer.is_empty() {
                return Ok(Some(self.buffer.remove(0)));
            }

            // if done, no fetch
            if self.finished {
                return Ok(None);
            }

            let page = self
                .store
                .list_page(&self.bucket, self.token.take())
                .await?;

            // store the page and next identifier
            self.buffer = page.objects;
            self.token = page.next_token;
            self.finished = self.token.is_none();
        }
    }
}
