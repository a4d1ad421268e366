//! Tracks the size of an S3 bucket over time from object notifications.
//!
//! Each subcommand handles one entry point of the pipeline: logging signed
//! size deltas, snapshotting bucket totals, rendering recent history, and
//! evicting the largest object. Notification batches are read from a file
//! or stdin and every command prints a JSON status object.
//!
//! Credentials must be provided via guidelines in the [AWS Documentation]
//! (https://docs.aws.amazon.com/cli/latest/userguide/cli-environment.html).
#[macro_use]
extern crate log as logger;

mod cli;
mod config;
mod context;
mod log;
mod notify;
mod series;
mod storage;
mod types;
mod util;
mod walker;

mod clean;
mod ingest;
mod plot;
mod sizelog;
mod track;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> types::TrackerResult<()> {
    // build the CLI and grab all arguments
    let args = cli::build().get_matches();

    // logging switches live on the subcommands
    let subargs = args.subcommand().1.unwrap_or(&args);
    log::init(subargs)?;

    // connect all backends up front and hand them down
    let config = config::Config::from_env()?;
    let ctx = context::Context::connect(config)?;

    // delegate to the cli mod
    cli::exec(ctx, &args).await
}
