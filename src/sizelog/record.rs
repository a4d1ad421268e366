//! The structured record written once per observed mutation.
use serde::{Deserialize, Serialize};

/// Signed size change attributed to a single object mutation.
///
/// Records are serialized as one JSON line each; the field names are part
/// of the log filter contract used by the size resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLogRecord {
    pub bucket: String,
    pub object_name: String,
    pub size_delta: i64,
}

impl SizeLogRecord {
    /// Parses a record from a raw log message.
    pub fn parse(message: &str) -> Option<SizeLogRecord> {
        serde_json::from_str(message.trim()).ok()
    }
}
