//! Explicitly constructed backend handles for a single invocation.
//!
//! All clients are built once in `main` and handed down, so the same code
//! paths run against in-memory backends in tests.
use rusoto_core::credential::ChainProvider;
use rusoto_core::HttpClient;
use rusoto_dynamodb::DynamoDbClient;
use rusoto_logs::CloudWatchLogsClient;
use rusoto_s3::S3Client;

use std::time::Duration;

use crate::config::Config;
use crate::series::{DynamoSeries, TimeSeriesStore};
use crate::sizelog::cloudwatch::CloudWatchSource;
use crate::sizelog::resolver::{LogSource, SizeResolver};
use crate::sizelog::{LogSink, StdoutSink};
use crate::storage::ObjectStore;
use crate::types::TrackerResult;

/// Backends and configuration shared by every entry point.
pub struct Context {
    pub config: Config,
    pub objects: Box<dyn ObjectStore>,
    pub series: Option<Box<dyn TimeSeriesStore>>,
    pub resolver: SizeResolver,
    pub sink: Box<dyn LogSink>,
}

impl Context {
    /// Connects all AWS backends named by the configuration.
    pub fn connect(config: Config) -> TrackerResult<Context> {
        let region = config.region.clone();

        let s3 = S3Client::new_with(HttpClient::new()?, provider(), region.clone());

        // commands without a table can still run, so this stays optional
        let series = match config.table() {
            Ok(table) => {
                let client =
                    DynamoDbClient::new_with(HttpClient::new()?, provider(), region.clone());
                let series = DynamoSeries::new(client, table.to_string());
                Some(Box::new(series) as Box<dyn TimeSeriesStore>)
            }
            Err(_) => None,
        };

        let source = match &config.log_group {
            Some(group) => {
                let client =
                    CloudWatchLogsClient::new_with(HttpClient::new()?, provider(), region);
                let source = CloudWatchSource::new(client, group.clone());
                Some(Box::new(source) as Box<dyn LogSource>)
            }
            None => None,
        };

        Ok(Context {
            config,
            series,
            objects: Box::new(s3),
            resolver: SizeResolver::new(source),
            sink: Box::new(StdoutSink),
        })
    }

    /// Retrieves the snapshot store, failing when no table is configured.
    pub fn series(&self) -> TrackerResult<&dyn TimeSeriesStore> {
        self.series
            .as_deref()
            .ok_or_else(|| "Missing required environment variable: TABLE_NAME".into())
    }
}

/// Credential chain with a short timeout on the instance metadata lookup.
fn provider() -> ChainProvider {
    let mut chain = ChainProvider::new();
    chain.set_timeout(Duration::from_millis(500));
    chain
}
