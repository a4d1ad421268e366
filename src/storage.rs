//! Object storage boundary used for enumeration and artifact writes.
//!
//! Everything which touches bucket contents goes through `ObjectStore`, so
//! the pipeline can run against an in-memory store in tests.
use async_trait::async_trait;
use rusoto_s3::*;

use crate::types::TrackerResult;

/// A single `(key, size)` pair listed from a bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
}

/// One page of a bucket listing, with the token for the next page.
#[derive(Debug, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectEntry>,
    pub next_token: Option<String>,
}

/// Storage operations required from an object backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists a single page of objects, starting at `token` when provided.
    async fn list_page(&self, bucket: &str, token: Option<String>) -> TrackerResult<ObjectPage>;

    /// Writes (or overwrites) a single object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> TrackerResult<()>;

    /// Removes a single object.
    async fn delete_object(&self, bucket: &str, key: &str) -> TrackerResult<()>;
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_page(&self, bucket: &str, token: Option<String>) -> TrackerResult<ObjectPage> {
        let request = ListObjectsV2Request {
            bucket: bucket.to_string(),
            continuation_token: token,
            ..ListObjectsV2Request::default()
        };

        let response = self.list_objects_v2(request).await?;

        // keyless objects can't be addressed, so they're dropped here
        let objects = response
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| {
                let size = object.size.unwrap_or(0).max(0) as u64;
                object.key.map(|key| ObjectEntry { key, size })
            })
            .collect();

        Ok(ObjectPage {
            objects,
            next_token: response.next_continuation_token,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> TrackerResult<()> {
        let request = PutObjectRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: Some(body.into()),
            content_type: Some(content_type.to_string()),
            ..PutObjectRequest::default()
        };
        S3::put_object(self, request).await?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> TrackerResult<()> {
        let request = DeleteObjectRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            ..DeleteObjectRequest::default()
        };
        S3::delete_object(self, request).await?;
        Ok(())
    }
}
