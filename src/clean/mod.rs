//! Evict the largest object from the tracked bucket.
//!
//! Rendered charts are only chosen when nothing else is left. Removal goes
//! through the normal notification path, so the trackers see it too.
use clap::{App, ArgMatches, SubCommand};
use serde::Serialize;

use crate::cli;
use crate::context::Context;
use crate::plot::PLOT_KEY;
use crate::storage::{ObjectEntry, ObjectStore};
use crate::types::TrackerResult;
use crate::util;
use crate::walker::ObjectWalker;

/// Status object returned by the `clean` command.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CleanStatus {
    Empty,
    Deleted {
        deleted_key: String,
        deleted_size: u64,
    },
}

/// Generates an appropriate `SubCommand` for this module.
pub fn cmd<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("clean")
        .about("Remove the largest object from the tracked bucket")
        .args(&cli::global_args())
}

/// Executes this subcommand and returns a `TrackerResult` to indicate success.
pub async fn exec(ctx: &Context, _args: &ArgMatches<'_>) -> TrackerResult<()> {
    let status = evict_largest(ctx.objects.as_ref(), ctx.config.bucket()?).await?;
    cli::print_status(&status)
}

/// Deletes the largest object in a bucket, preferring non-chart objects.
pub async fn evict_largest(store: &dyn ObjectStore, bucket: &str) -> TrackerResult<CleanStatus> {
    let mut walker = ObjectWalker::new(store, bucket.to_string());
    let mut largest: Option<ObjectEntry> = None;
    let mut largest_chart: Option<ObjectEntry> = None;

    while let Some(object) = walker.next().await? {
        let slot = if object.key.starts_with(PLOT_KEY) {
            &mut largest_chart
        } else {
            &mut largest
        };

        // first of equally sized objects wins
        if slot.as_ref().map_or(true, |current| object.size > current.size) {
            *slot = Some(object);
        }
    }

    let victim = match largest.or(largest_chart) {
        Some(victim) => victim,
        None => return Ok(CleanStatus::Empty),
    };

    info!(
        "Removing {} ({}) from {}",
        victim.key,
        util::convert_bytes(victim.size),
        bucket
    );

    store.delete_object(bucket, &victim.key).await?;

    Ok(CleanStatus::Deleted {
        deleted_key: victim.key,
        deleted_size: victim.size,
    })
}
