//! Recovery of object sizes for removal events.
//!
//! Removal notifications carry no size, so the last size logged for the
//! same object name stands in for it. The answer is best effort: a stale
//! or missing log yields a stale or zero size.
use async_trait::async_trait;

use std::fmt::{self, Display, Formatter};

use super::record::SizeLogRecord;

/// Number of candidate records fetched per lookup.
pub const CANDIDATE_LIMIT: usize = 5;

/// Reasons a size lookup can come back empty handed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupFailure {
    /// No log group is configured to search.
    Unconfigured,
    /// The log backend could not be queried.
    Backend(String),
    /// No candidate record could be parsed.
    NotFound,
}

impl Display for LookupFailure {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LookupFailure::Unconfigured => write!(f, "no log group configured"),
            LookupFailure::Backend(msg) => write!(f, "log query failed: {}", msg),
            LookupFailure::NotFound => write!(f, "no prior size record"),
        }
    }
}

/// Read access to the size log stream.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Returns up to `limit` of the most recent raw messages for an
    /// object name, ordered oldest first.
    async fn recent(&self, object_name: &str, limit: usize) -> Result<Vec<String>, LookupFailure>;
}

/// Resolves removal sizes against an optional log source.
pub struct SizeResolver {
    source: Option<Box<dyn LogSource>>,
}

impl SizeResolver {
    /// Constructs a new `SizeResolver`; `None` means every lookup is
    /// `Unconfigured`.
    pub fn new(source: Option<Box<dyn LogSource>>) -> Self {
        Self { source }
    }

    /// Looks up the magnitude of the last logged delta for an object.
    pub async fn lookup(&self, key: &str) -> Result<u64, LookupFailure> {
        let source = self.source.as_ref().ok_or(LookupFailure::Unconfigured)?;
        let candidates = source.recent(key, CANDIDATE_LIMIT).await?;

        // newest first, first parseable record wins
        candidates
            .iter()
            .rev()
            .filter_map(|message| SizeLogRecord::parse(message))
            .map(|record| record.size_delta.unsigned_abs())
            .next()
            .ok_or(LookupFailure::NotFound)
    }

    /// Resolves the size of a removed object, collapsing failures to zero.
    pub async fn resolve_removed_size(&self, bucket: &str, key: &str) -> u64 {
        match self.lookup(key).await {
            Ok(size) => size,
            Err(LookupFailure::NotFound) => {
                info!("No prior size found for {}/{}", bucket, key);
                0
            }
            Err(failure) => {
                warn!("Unable to resolve size of {}/{}: {}", bucket, key, failure);
                0
            }
        }
    }
}
