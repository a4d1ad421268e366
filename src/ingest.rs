//! Run both the size logger and the bucket tracker over one batch.
//!
//! The two passes are independent: logging problems are reported but
//! never stop the totals pass, and a totals failure only fails the
//! invocation after every record has been logged.
use clap::{App, ArgMatches, SubCommand};
use serde::Serialize;

use crate::cli;
use crate::context::Context;
use crate::notify::{self, TransportBatch};
use crate::series::TimeSeriesStore;
use crate::sizelog::{self, resolver::SizeResolver, LogSink};
use crate::track::totals::{BucketTotals, FullScan};
use crate::track::{self, TrackedBucket};
use crate::types::TrackerResult;
use crate::util;

/// Status object returned by the `ingest` command.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct IngestStatus {
    pub status: &'static str,
    pub logged: usize,
    pub results: Vec<TrackedBucket>,
}

/// Generates an appropriate `SubCommand` for this module.
pub fn cmd<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("ingest")
        .about("Log size deltas and snapshot totals for a notification batch")
        .args(&cli::global_args())
        .arg(cli::batch_arg())
}

/// Executes this subcommand and returns a `TrackerResult` to indicate success.
pub async fn exec(ctx: &Context, args: &ArgMatches<'_>) -> TrackerResult<()> {
    let batch = cli::read_batch(args)?;
    let engine = FullScan::new(ctx.objects.as_ref());

    let status = ingest(
        &batch,
        &ctx.resolver,
        ctx.sink.as_ref(),
        &engine,
        ctx.series()?,
        util::now_millis,
    )
    .await?;

    cli::print_status(&status)
}

/// Processes a batch through the logger, then the tracker.
pub async fn ingest<C>(
    batch: &TransportBatch,
    resolver: &SizeResolver,
    sink: &dyn LogSink,
    totals: &dyn BucketTotals,
    series: &dyn TimeSeriesStore,
    clock: C,
) -> TrackerResult<IngestStatus>
where
    C: Fn() -> TrackerResult<u64>,
{
    let events = notify::normalize(batch);

    let logged = sizelog::log_events(&events, resolver, sink).await;
    let results = track::track_buckets(&events, totals, series, clock).await?;

    Ok(IngestStatus {
        status: "ok",
        logged,
        results,
    })
}

#[cfg(test)]
mod tests {
    use crate::notify::TransportBatch;
    use crate::plot::{self, RenderOutcome};
    use crate::series::TimeSeriesStore;
    use crate::sizelog::record::SizeLogRecord;
    use crate::sizelog::resolver::SizeResolver;
    use crate::testing::{
        message, storage_record, MemoryLogSource, MemoryObjects, MemorySeries, MemorySink,
    };
    use crate::track::totals::FullScan;
    use serde_json::json;

    fn record(bucket: &str, key: &str, delta: i64) -> SizeLogRecord {
        SizeLogRecord {
            bucket: bucket.into(),
            object_name: key.into(),
            size_delta: delta,
        }
    }

    #[tokio::test]
    async fn ingesting_a_creation() {
        let store = MemoryObjects::default();
        store.insert("b1", "key.txt", 100);
        store.insert("b1", "older.txt", 20);

        let series = MemorySeries::default();
        let sink = MemorySink::default();

        let batch = TransportBatch {
            records: vec![message(&[storage_record(
                "ObjectCreated:Put",
                "b1",
                "key.txt",
                Some(100),
            )])],
        };

        let status = super::ingest(
            &batch,
            &SizeResolver::new(None),
            &sink,
            &FullScan::new(&store),
            &series,
            || Ok(5_000),
        )
        .await
        .unwrap();

        assert_eq!(status.logged, 1);
        assert_eq!(sink.records(), vec![record("b1", "key.txt", 100)]);

        let snapshots = series.query_all("b1").await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].timestamp, 5_000);
        assert_eq!(snapshots[0].size_bytes, 120);
        assert_eq!(snapshots[0].object_count, 2);
    }

    #[tokio::test]
    async fn ingesting_a_removal_with_a_logged_size() {
        let store = MemoryObjects::default();
        let series = MemorySeries::default();
        let sink = MemorySink::default();

        let source = MemoryLogSource::default();
        source.push(
            "key.txt",
            &serde_json::to_string(&record("b1", "key.txt", 50)).unwrap(),
        );

        let batch = TransportBatch {
            records: vec![message(&[storage_record(
                "ObjectRemoved:Delete",
                "b1",
                "key.txt",
                None,
            )])],
        };

        let status = super::ingest(
            &batch,
            &SizeResolver::new(Some(Box::new(source))),
            &sink,
            &FullScan::new(&store),
            &series,
            || Ok(6_000),
        )
        .await
        .unwrap();

        assert_eq!(sink.records(), vec![record("b1", "key.txt", -50)]);
        assert_eq!(status.results[0].size_bytes, 0);
        assert_eq!(status.results[0].object_count, 0);
    }

    #[tokio::test]
    async fn ingesting_a_partly_malformed_batch() {
        let store = MemoryObjects::default();
        store.insert("b1", "good.txt", 3);
        let series = MemorySeries::default();
        let sink = MemorySink::default();

        let batch = TransportBatch {
            records: vec![
                json!({ "body": "definitely not json" }),
                message(&[storage_record("ObjectCreated:Put", "b1", "good.txt", Some(3))]),
            ],
        };

        let status = super::ingest(
            &batch,
            &SizeResolver::new(None),
            &sink,
            &FullScan::new(&store),
            &series,
            || Ok(7_000),
        )
        .await
        .unwrap();

        assert_eq!(status.logged, 1);
        assert_eq!(sink.records().len(), 1);
        assert_eq!(series.len(), 1);
    }

    #[tokio::test]
    async fn tracking_despite_logging_failures() {
        let store = MemoryObjects::default();
        store.insert("b1", "a.txt", 9);
        let series = MemorySeries::default();
        let sink = MemorySink::default();
        sink.fail();

        let batch = TransportBatch {
            records: vec![message(&[storage_record(
                "ObjectCreated:Put",
                "b1",
                "a.txt",
                Some(9),
            )])],
        };

        let status = super::ingest(
            &batch,
            &SizeResolver::new(None),
            &sink,
            &FullScan::new(&store),
            &series,
            || Ok(8_000),
        )
        .await
        .unwrap();

        assert_eq!(status.logged, 0);
        assert_eq!(status.results.len(), 1);
        assert_eq!(series.len(), 1);
    }

    #[tokio::test]
    async fn logging_despite_tracking_failures() {
        let store = MemoryObjects::default();
        store.fail();
        let series = MemorySeries::default();
        let sink = MemorySink::default();

        let batch = TransportBatch {
            records: vec![message(&[storage_record(
                "ObjectCreated:Put",
                "b1",
                "a.txt",
                Some(9),
            )])],
        };

        let result = super::ingest(
            &batch,
            &SizeResolver::new(None),
            &sink,
            &FullScan::new(&store),
            &series,
            || Ok(8_000),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(sink.records().len(), 1);
        assert_eq!(series.len(), 0);
    }

    #[tokio::test]
    async fn tracking_then_rendering_a_bucket() {
        let store = MemoryObjects::default();
        let series = MemorySeries::default();
        let sink = MemorySink::default();
        let resolver = SizeResolver::new(None);

        // three uploads, each tracked two seconds apart
        let uploads = [("assignment1.txt", 18), ("assignment2.txt", 28), ("assignment3.txt", 2)];
        for (idx, (key, size)) in uploads.iter().enumerate() {
            store.insert("b1", key, *size);

            let batch = TransportBatch {
                records: vec![message(&[storage_record(
                    "ObjectCreated:Put",
                    "b1",
                    key,
                    Some(*size),
                )])],
            };
            let now = 10_000 + idx as u64 * 2_000;

            super::ingest(&batch, &resolver, &sink, &FullScan::new(&store), &series, || {
                Ok(now)
            })
            .await
            .unwrap();
        }

        let outcome = plot::render(&series, &store, "b1", 20, 15_000).await.unwrap();

        match outcome {
            RenderOutcome::Rendered(summary) => {
                assert_eq!(summary.max_ever, 48);
                assert_eq!(summary.points_in_window, 3);
            }
            RenderOutcome::NoData => panic!("expected a render"),
        }

        // the chart itself never counts towards the totals
        let batch = TransportBatch {
            records: vec![message(&[storage_record(
                "ObjectCreated:Put",
                "b1",
                "plot",
                Some(1),
            )])],
        };
        let status = super::ingest(&batch, &resolver, &sink, &FullScan::new(&store), &series, || {
            Ok(16_000)
        })
        .await
        .unwrap();

        assert_eq!(status.results[0].size_bytes, 48);
        assert_eq!(status.results[0].object_count, 3);
    }
}
