//! Normalization of queued storage notifications into mutation events.
//!
//! Notifications arrive triple-wrapped: a queue batch whose message bodies
//! are broadcast envelopes, whose `Message` is the storage event payload.
//! Each layer is a fallible step; any failure skips only the unit being
//! unwrapped, never the batch.
use serde::Deserialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::types::TrackerResult;

/// Event name prefix for object creations.
pub const CREATED_PREFIX: &str = "ObjectCreated";

/// Event name prefix for object removals.
pub const REMOVED_PREFIX: &str = "ObjectRemoved";

/// Classification of a single object mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Created,
    Removed,
}

/// A single object mutation extracted from a notification.
///
/// Creations always carry a size; removals never do, since the storage
/// notification doesn't include one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationEvent {
    pub bucket: String,
    pub key: String,
    pub kind: MutationKind,
    pub size: Option<u64>,
}

/// Outer queue batch, as delivered to an invocation.
#[derive(Debug, Default, Deserialize)]
pub struct TransportBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<Value>,
}

impl TransportBatch {
    /// Parses a raw batch document.
    ///
    /// This is the only step which may fail outright; if the batch itself
    /// isn't readable there is nothing to skip over.
    pub fn parse(raw: &str) -> TrackerResult<TransportBatch> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Deserialize)]
struct StorageRecord {
    #[serde(rename = "eventName")]
    event_name: String,
    s3: StorageEntity,
}

#[derive(Deserialize)]
struct StorageEntity {
    bucket: BucketRef,
    object: ObjectRef,
}

#[derive(Deserialize)]
struct BucketRef {
    name: String,
}

#[derive(Deserialize)]
struct ObjectRef {
    key: String,
    size: Option<u64>,
}

/// Flattens a batch into the list of classified mutation events.
pub fn normalize(batch: &TransportBatch) -> Vec<MutationEvent> {
    let mut events = Vec::new();

    for (idx, message) in batch.records.iter().enumerate() {
        let records = match unwrap_message(message) {
            Some(records) => records,
            None => {
                warn!("Skipping unreadable notification at index {}", idx);
                continue;
            }
        };

        events.extend(records.into_iter().filter_map(classify));
    }

    events
}

/// Unwraps queue message -> broadcast envelope -> storage records.
fn unwrap_message(message: &Value) -> Option<Vec<Value>> {
    let body: Value = serde_json::from_str(message.get("body")?.as_str()?).ok()?;
    let payload: Value = serde_json::from_str(body.get("Message")?.as_str()?).ok()?;

    match payload.get("Records") {
        Some(Value::Array(records)) => Some(records.clone()),
        // test events and the like carry no records at all
        None => Some(Vec::new()),
        Some(_) => None,
    }
}

/// Classifies a single storage record, discarding anything unrecognised.
fn classify(record: Value) -> Option<MutationEvent> {
    let record: StorageRecord = serde_json::from_value(record).ok()?;

    let (kind, size) = if record.event_name.starts_with(CREATED_PREFIX) {
        (MutationKind::Created, Some(record.s3.object.size.unwrap_or(0)))
    } else if record.event_name.starts_with(REMOVED_PREFIX) {
        (MutationKind::Removed, None)
    } else {
        return None;
    };

    Some(MutationEvent {
        bucket: record.s3.bucket.name,
        key: decode_key(&record.s3.object.key),
        kind,
        size,
    })
}

/// Reverses the form style encoding applied to keys in notifications.
///
/// `+` becomes a space and percent sequences are decoded; literal `&` and
/// `=` are escaped first so the form parser treats the whole key as one.
pub fn decode_key(raw: &str) -> String {
    let escaped = raw.replace('&', "%26").replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}
