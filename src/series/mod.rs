//! Append-only time series of bucket size snapshots.
//!
//! Snapshots are keyed by `(bucket, timestamp)`; writing the same key twice
//! replaces the earlier snapshot. Both query shapes return snapshots in
//! ascending timestamp order, and an empty result is not an error.
use async_trait::async_trait;

use crate::types::TrackerResult;

pub mod dynamo;

pub use self::dynamo::DynamoSeries;

/// One timestamped size/count record for a bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketSnapshot {
    pub bucket: String,
    pub timestamp: u64,
    pub size_bytes: u64,
    pub object_count: u64,
}

/// Persistence operations for bucket snapshots.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Writes a snapshot; last write for a given key wins.
    async fn append(&self, snapshot: &BucketSnapshot) -> TrackerResult<()>;

    /// Fetches snapshots with `timestamp` in `[from, to]`, ascending.
    async fn query_range(&self, bucket: &str, from: u64, to: u64)
        -> TrackerResult<Vec<BucketSnapshot>>;

    /// Fetches every snapshot for a bucket, ascending.
    async fn query_all(&self, bucket: &str) -> TrackerResult<Vec<BucketSnapshot>>;

    /// Fetches the trailing window of `window_seconds` ending at `now`.
    async fn query_window(
        &self,
        bucket: &str,
        now: u64,
        window_seconds: u64,
    ) -> TrackerResult<Vec<BucketSnapshot>> {
        let (from, to) = window_bounds(now, window_seconds);
        self.query_range(bucket, from, to).await
    }
}

/// Computes the inclusive millisecond bounds of a trailing window.
pub fn window_bounds(now: u64, window_seconds: u64) -> (u64, u64) {
    (now.saturating_sub(window_seconds.saturating_mul(1000)), now)
}
