//! Emit one signed size record per object mutation.
//!
//! Creations log their notified size; removals log the negated size
//! recovered by the `SizeResolver` from earlier records of this very
//! stream, closing the loop between the logger and the resolver.
use clap::{App, ArgMatches, SubCommand};
use serde::Serialize;

use std::convert::TryFrom;
use std::io::{self, Write};

use crate::cli;
use crate::context::Context;
use crate::notify::{self, MutationEvent, MutationKind};
use crate::types::TrackerResult;

pub mod cloudwatch;
pub mod record;
pub mod resolver;

use self::record::SizeLogRecord;
use self::resolver::SizeResolver;

/// Destination for size log records.
pub trait LogSink: Send + Sync {
    /// Writes a single record to the durable log.
    fn emit(&self, record: &SizeLogRecord) -> TrackerResult<()>;
}

/// Sink writing JSON lines to stdout, which the runtime ships to the log
/// group searched by `cloudwatch::CloudWatchSource`.
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn emit(&self, record: &SizeLogRecord) -> TrackerResult<()> {
        let line = serde_json::to_string(record)?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", line)?;
        handle.flush()?;
        Ok(())
    }
}

/// Status object returned by the `log` command.
#[derive(Debug, Serialize)]
pub struct LogStatus {
    pub status: &'static str,
    pub logged: usize,
}

/// Generates an appropriate `SubCommand` for this module.
pub fn cmd<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("log")
        .about("Log signed size deltas for a notification batch")
        .args(&cli::global_args())
        .arg(cli::batch_arg())
}

/// Executes this subcommand and returns a `TrackerResult` to indicate success.
pub async fn exec(ctx: &Context, args: &ArgMatches<'_>) -> TrackerResult<()> {
    let batch = cli::read_batch(args)?;
    let events = notify::normalize(&batch);

    let logged = log_events(&events, &ctx.resolver, ctx.sink.as_ref()).await;

    cli::print_status(&LogStatus {
        status: "ok",
        logged,
    })
}

/// Resolves and emits a record for every event, returning the number
/// of records written.
///
/// Emission failures are reported and skipped; they never abort the batch.
pub async fn log_events(
    events: &[MutationEvent],
    resolver: &SizeResolver,
    sink: &dyn LogSink,
) -> usize {
    let mut logged = 0;

    for event in events {
        let size_delta = match event.kind {
            MutationKind::Created => signed(event.size.unwrap_or(0)),
            MutationKind::Removed => {
                -signed(resolver.resolve_removed_size(&event.bucket, &event.key).await)
            }
        };

        let record = SizeLogRecord {
            bucket: event.bucket.clone(),
            object_name: event.key.clone(),
            size_delta,
        };

        match sink.emit(&record) {
            Ok(()) => logged += 1,
            Err(err) => error!("Unable to log {}/{}: {}", event.bucket, event.key, err),
        }
    }

    logged
}

fn signed(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}
