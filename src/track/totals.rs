//! Authoritative bucket totals computed from a full listing.
use async_trait::async_trait;

use crate::plot::PLOT_KEY;
use crate::storage::ObjectStore;
use crate::types::TrackerResult;
use crate::walker::ObjectWalker;

/// Keys of derived artifacts which never count towards totals.
pub const EXCLUDED_KEYS: &[&str] = &[PLOT_KEY];

/// Total size and object count of a bucket at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub size_bytes: u64,
    pub object_count: u64,
}

/// Computes the current totals of a bucket.
#[async_trait]
pub trait BucketTotals: Send + Sync {
    async fn compute_totals(&self, bucket: &str) -> TrackerResult<Totals>;
}

/// `BucketTotals` implementation which rescans the whole bucket.
///
/// This costs a listing of every object per call, but it self corrects on
/// every run rather than accumulating drift from missed notifications.
pub struct FullScan<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> FullScan<'a> {
    /// Constructs a new `FullScan` over an object store.
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<'a> BucketTotals for FullScan<'a> {
    async fn compute_totals(&self, bucket: &str) -> TrackerResult<Totals> {
        let mut totals = Totals::default();
        let mut walker = ObjectWalker::new(self.store, bucket.to_string());

        while let Some(object) = walker.next().await? {
            if EXCLUDED_KEYS.contains(&object.key.as_str()) {
                continue;
            }
            totals.size_bytes += object.size;
            totals.object_count += 1;
        }

        Ok(totals)
    }
}
