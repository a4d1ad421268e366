//! Record bucket size snapshots from a notification batch.
//!
//! Each distinct bucket named in a batch is rescanned exactly once and a
//! snapshot of its totals appended to the time series, keyed by the time
//! the scan finished.
use clap::{App, ArgMatches, SubCommand};
use serde::Serialize;

use std::collections::BTreeSet;

use crate::cli;
use crate::context::Context;
use crate::notify::{self, MutationEvent};
use crate::series::{BucketSnapshot, TimeSeriesStore};
use crate::types::TrackerResult;
use crate::util;

pub mod totals;

use self::totals::{BucketTotals, FullScan};

/// Per-bucket outcome of a tracking pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrackedBucket {
    pub bucket: String,
    pub size_bytes: u64,
    pub object_count: u64,
}

/// Status object returned by the `track` command.
#[derive(Debug, Serialize)]
pub struct TrackStatus {
    pub status: &'static str,
    pub results: Vec<TrackedBucket>,
}

/// Generates an appropriate `SubCommand` for this module.
pub fn cmd<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("track")
        .about("Snapshot bucket totals for a notification batch")
        .args(&cli::global_args())
        .arg(cli::batch_arg())
}

/// Executes this subcommand and returns a `TrackerResult` to indicate success.
pub async fn exec(ctx: &Context, args: &ArgMatches<'_>) -> TrackerResult<()> {
    let batch = cli::read_batch(args)?;
    let events = notify::normalize(&batch);

    let engine = FullScan::new(ctx.objects.as_ref());
    let results = track_buckets(&events, &engine, ctx.series()?, util::now_millis).await?;

    cli::print_status(&TrackStatus {
        status: "ok",
        results,
    })
}

/// Recomputes and snapshots every distinct bucket referenced by `events`.
///
/// Any backend failure aborts the pass; snapshots already written for
/// earlier buckets stay written.
pub async fn track_buckets<C>(
    events: &[MutationEvent],
    totals: &dyn BucketTotals,
    series: &dyn TimeSeriesStore,
    clock: C,
) -> TrackerResult<Vec<TrackedBucket>>
where
    C: Fn() -> TrackerResult<u64>,
{
    let buckets: BTreeSet<&str> = events.iter().map(|e| e.bucket.as_str()).collect();
    let mut results = Vec::with_capacity(buckets.len());

    for bucket in buckets {
        let computed = totals.compute_totals(bucket).await?;
        let snapshot = BucketSnapshot {
            bucket: bucket.to_string(),
            timestamp: clock()?,
            size_bytes: computed.size_bytes,
            object_count: computed.object_count,
        };

        series.append(&snapshot).await?;

        info!(
            "Tracked {}: {} across {} objects",
            bucket,
            util::convert_bytes(snapshot.size_bytes),
            snapshot.object_count
        );

        results.push(TrackedBucket {
            bucket: snapshot.bucket,
            size_bytes: snapshot.size_bytes,
            object_count: snapshot.object_count,
        });
    }

    Ok(results)
}
