//! High-water mark tracking over a run of snapshots.
use crate::series::BucketSnapshot;

/// Tracks the largest size observed, the timestamp it was first seen at,
/// and how many snapshots share that size.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighWater {
    value: u64,
    at: Option<u64>,
    count: usize,
}

impl HighWater {
    /// Constructs a `HighWater` from a run of snapshots.
    pub fn over(snapshots: &[BucketSnapshot]) -> HighWater {
        let mut peak = HighWater::default();
        for snapshot in snapshots {
            peak.observe(snapshot.timestamp, snapshot.size_bytes);
        }
        peak
    }

    /// Registers a single observation.
    pub fn observe(&mut self, timestamp: u64, value: u64) {
        if self.is_unset() || value > self.value {
            self.value = value;
            self.at = Some(timestamp);
            self.count = 1;
        } else if value == self.value {
            self.count += 1;
        }
    }

    /// Retrieves the peak value, zero when nothing was observed.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Retrieves the timestamp the peak was first observed at.
    pub fn at(&self) -> Option<u64> {
        self.at
    }

    /// Retrieves the number of observations matching the peak.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Determines if no observation has been made.
    pub fn is_unset(&self) -> bool {
        self.at.is_none()
    }
}
