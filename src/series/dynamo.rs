//! DynamoDB backed snapshot storage.
//!
//! The table is partitioned on the string attribute `bucket` and sorted
//! on the numeric attribute `timestamp`.
use async_trait::async_trait;
use rusoto_dynamodb::{AttributeValue, DynamoDb, DynamoDbClient, PutItemInput, QueryInput};

use std::collections::HashMap;

use super::{BucketSnapshot, TimeSeriesStore};
use crate::types::TrackerResult;

/// Raw item shape as stored in DynamoDB.
type Item = HashMap<String, AttributeValue>;

/// `TimeSeriesStore` implementation over a single DynamoDB table.
pub struct DynamoSeries {
    client: DynamoDbClient,
    table: String,
}

impl DynamoSeries {
    /// Constructs a new `DynamoSeries` against the named table.
    pub fn new(client: DynamoDbClient, table: String) -> Self {
        Self { client, table }
    }

    /// Runs a key condition query, following `LastEvaluatedKey` to the end.
    async fn query_pages(
        &self,
        condition: &str,
        mut values: Item,
        bucket: &str,
    ) -> TrackerResult<Vec<BucketSnapshot>> {
        values.insert(":b".to_string(), string_attr(bucket));

        let mut names = HashMap::new();
        names.insert("#b".to_string(), "bucket".to_string());
        names.insert("#ts".to_string(), "timestamp".to_string());

        let mut snapshots = Vec::new();
        let mut start_key = None;

        loop {
            let input = QueryInput {
                table_name: self.table.clone(),
                key_condition_expression: Some(condition.to_string()),
                expression_attribute_names: Some(names.clone()),
                expression_attribute_values: Some(values.clone()),
                projection_expression: Some("#b, #ts, size_bytes, object_count".to_string()),
                scan_index_forward: Some(true),
                exclusive_start_key: start_key.take(),
                ..QueryInput::default()
            };

            let output = self.client.query(input).await?;

            for item in output.items.unwrap_or_default() {
                match decode(&item) {
                    Some(snapshot) => snapshots.push(snapshot),
                    None => warn!("Skipping unreadable snapshot item in {}", self.table),
                }
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(snapshots)
    }
}

#[async_trait]
impl TimeSeriesStore for DynamoSeries {
    async fn append(&self, snapshot: &BucketSnapshot) -> TrackerResult<()> {
        let input = PutItemInput {
            table_name: self.table.clone(),
            item: encode(snapshot),
            ..PutItemInput::default()
        };
        self.client.put_item(input).await?;
        Ok(())
    }

    async fn query_range(
        &self,
        bucket: &str,
        from: u64,
        to: u64,
    ) -> TrackerResult<Vec<BucketSnapshot>> {
        let mut values = HashMap::new();
        values.insert(":from".to_string(), number_attr(from));
        values.insert(":to".to_string(), number_attr(to));

        self.query_pages("#b = :b AND #ts BETWEEN :from AND :to", values, bucket)
            .await
    }

    async fn query_all(&self, bucket: &str) -> TrackerResult<Vec<BucketSnapshot>> {
        self.query_pages("#b = :b", HashMap::new(), bucket).await
    }
}

fn string_attr(value: &str) -> AttributeValue {
    AttributeValue {
        s: Some(value.to_string()),
        ..AttributeValue::default()
    }
}

fn number_attr(value: u64) -> AttributeValue {
    AttributeValue {
        n: Some(value.to_string()),
        ..AttributeValue::default()
    }
}

/// Converts a snapshot into its stored item shape.
fn encode(snapshot: &BucketSnapshot) -> Item {
    let mut item = HashMap::new();
    item.insert("bucket".to_string(), string_attr(&snapshot.bucket));
    item.insert("timestamp".to_string(), number_attr(snapshot.timestamp));
    item.insert("size_bytes".to_string(), number_attr(snapshot.size_bytes));
    item.insert("object_count".to_string(), number_attr(snapshot.object_count));
    item
}

/// Converts a stored item back into a snapshot.
///
/// Items written before counts were tracked have no `object_count`; those
/// decode with a count of zero rather than being dropped.
fn decode(item: &Item) -> Option<BucketSnapshot> {
    let number = |name: &str| -> Option<u64> { item.get(name)?.n.as_ref()?.parse().ok() };

    Some(BucketSnapshot {
        bucket: item.get("bucket")?.s.clone()?,
        timestamp: number("timestamp")?,
        size_bytes: number("size_bytes")?,
        object_count: number("object_count").unwrap_or(0),
    })
}
