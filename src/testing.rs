//! In-memory backends and fixtures shared by unit tests.
use async_trait::async_trait;
use rusoto_core::signature::{SignedRequest, SignedRequestPayload};
use rusoto_mock::MockRequestDispatcher;
use serde_json::{json, Value};

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::series::{BucketSnapshot, TimeSeriesStore};
use crate::sizelog::record::SizeLogRecord;
use crate::sizelog::resolver::{LogSource, LookupFailure};
use crate::sizelog::LogSink;
use crate::storage::{ObjectEntry, ObjectPage, ObjectStore};
use crate::types::TrackerResult;

/// A single write made through `MemoryObjects::put_object`.
#[derive(Clone, Debug)]
pub struct PutRecord {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Object store which pages over sorted keys.
pub struct MemoryObjects {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, u64>>>,
    puts: Mutex<Vec<PutRecord>>,
    page_size: usize,
    list_calls: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryObjects {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            puts: Mutex::new(Vec::new()),
            page_size,
            list_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn insert(&self, bucket: &str, key: &str, size: u64) {
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), size);
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> TrackerResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("object store unavailable".into());
        }
        Ok(())
    }
}

impl Default for MemoryObjects {
    fn default() -> Self {
        Self::with_page_size(1000)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjects {
    async fn list_page(&self, bucket: &str, token: Option<String>) -> TrackerResult<ObjectPage> {
        self.check()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let offset = token.map(|t| t.parse::<usize>()).transpose()?.unwrap_or(0);
        let buckets = self.buckets.lock().unwrap();
        let all: Vec<ObjectEntry> = buckets
            .get(bucket)
            .map(|objects| {
                objects
                    .iter()
                    .map(|(key, size)| ObjectEntry {
                        key: key.clone(),
                        size: *size,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let end = (offset + self.page_size).min(all.len());
        let objects = all[offset.min(end)..end].to_vec();
        let next_token = if end < all.len() {
            Some(end.to_string())
        } else {
            None
        };

        Ok(ObjectPage {
            objects,
            next_token,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> TrackerResult<()> {
        self.check()?;
        self.insert(bucket, key, body.len() as u64);
        self.puts.lock().unwrap().push(PutRecord {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> TrackerResult<()> {
        self.check()?;
        if let Some(objects) = self.buckets.lock().unwrap().get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }
}

/// Snapshot store keyed exactly like the real table.
#[derive(Default)]
pub struct MemorySeries {
    snapshots: Mutex<BTreeMap<(String, u64), BucketSnapshot>>,
    failing: AtomicBool,
}

impl MemorySeries {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    fn check(&self) -> TrackerResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("table unavailable".into());
        }
        Ok(())
    }
}

#[async_trait]
impl TimeSeriesStore for MemorySeries {
    async fn append(&self, snapshot: &BucketSnapshot) -> TrackerResult<()> {
        self.check()?;
        self.snapshots.lock().unwrap().insert(
            (snapshot.bucket.clone(), snapshot.timestamp),
            snapshot.clone(),
        );
        Ok(())
    }

    async fn query_range(
        &self,
        bucket: &str,
        from: u64,
        to: u64,
    ) -> TrackerResult<Vec<BucketSnapshot>> {
        self.check()?;
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .range((bucket.to_string(), from)..=(bucket.to_string(), to))
            .map(|(_, snapshot)| snapshot.clone())
            .collect())
    }

    async fn query_all(&self, bucket: &str) -> TrackerResult<Vec<BucketSnapshot>> {
        self.query_range(bucket, 0, u64::MAX).await
    }
}

/// Log source serving canned messages per object name, oldest first.
#[derive(Default)]
pub struct MemoryLogSource {
    messages: Mutex<HashMap<String, Vec<String>>>,
    failing: AtomicBool,
}

impl MemoryLogSource {
    pub fn push(&self, object_name: &str, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .entry(object_name.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LogSource for MemoryLogSource {
    async fn recent(&self, object_name: &str, limit: usize) -> Result<Vec<String>, LookupFailure> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LookupFailure::Backend("log service unavailable".into()));
        }
        let messages = self.messages.lock().unwrap();
        let all = messages.get(object_name).cloned().unwrap_or_default();
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).collect())
    }
}

/// Sink which keeps every emitted record in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<SizeLogRecord>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn records(&self) -> Vec<SizeLogRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &SizeLogRecord) -> TrackerResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("log stream unavailable".into());
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Builds a storage event record as found inside a notification.
pub fn storage_record(event_name: &str, bucket: &str, key: &str, size: Option<u64>) -> Value {
    let mut object = json!({ "key": key });
    if let Some(size) = size {
        object["size"] = json!(size);
    }
    json!({
        "eventName": event_name,
        "s3": {
            "bucket": { "name": bucket },
            "object": object,
        }
    })
}

/// Wraps storage records in a broadcast envelope and queue message.
pub fn message(records: &[Value]) -> Value {
    let payload = json!({ "Records": records }).to_string();
    let envelope = json!({ "Type": "Notification", "Message": payload }).to_string();
    json!({ "messageId": "1", "body": envelope })
}

/// Canned AWS JSON response which records the body of the request it answers.
pub fn recorded_response(body: Value, requests: &Arc<Mutex<Vec<Value>>>) -> MockRequestDispatcher {
    let requests = Arc::clone(requests);
    MockRequestDispatcher::default()
        .with_body(&body.to_string())
        .with_request_checker(move |request: &SignedRequest| {
            requests.lock().unwrap().push(request_json(request));
        })
}

fn request_json(request: &SignedRequest) -> Value {
    match &request.payload {
        Some(SignedRequestPayload::Buffer(bytes)) => {
            serde_json::from_slice(&bytes[..]).unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}
