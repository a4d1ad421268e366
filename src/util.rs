//! General utility module housing clock and formatting functions.
use pretty_bytes::converter::convert;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::TrackerResult;

/// Converts a byte count to a `String` representation.
pub fn convert_bytes(bytes: u64) -> String {
    convert(bytes as f64).replacen(' ', "", 1)
}

/// Returns the current wall clock time in milliseconds since the epoch.
pub fn now_millis() -> TrackerResult<u64> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH)?;
    Ok(elapsed.as_millis() as u64)
}
