//! CLI bindings for all internal commands and modules.
//!
//! This module focuses on the common CLI bindings required to provide easy
//! APIs and consistency across all other modules. This is where the parent
//! CLI can be found, as well as utilities for reading notification batches
//! and writing status objects.
use clap::{App, AppSettings, Arg, ArgMatches};
use serde::Serialize;

use std::fs;
use std::io::{self, Read};

use crate::context::Context;
use crate::notify::TransportBatch;
use crate::types::TrackerResult;

/// Constructs a new CLI application using Clap.
///
/// This will register all subcommand modules and embed all metadata. All
/// metadata is fetched dynamically from Cargo and shouldn't require to
/// be updated (ever).
pub fn build<'a, 'b>() -> App<'a, 'b> {
    App::new("")
        .name(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .subcommand(crate::track::cmd())
        .subcommand(crate::sizelog::cmd())
        .subcommand(crate::ingest::cmd())
        .subcommand(crate::plot::cmd())
        .subcommand(crate::clean::cmd())
        .settings(&[
            AppSettings::ArgRequiredElseHelp,
            AppSettings::DisableHelpSubcommand,
            AppSettings::SubcommandRequiredElseHelp,
            AppSettings::VersionlessSubcommands,
        ])
}

/// Executes a subcommand based on the parsed arguments from the CLI.
///
/// The shared `Context` carries every backend client, so no module has to
/// construct its own.
pub async fn exec(ctx: Context, args: &ArgMatches<'_>) -> TrackerResult<()> {
    match args.subcommand() {
        ("track", Some(subargs)) => crate::track::exec(&ctx, subargs).await,
        ("log", Some(subargs)) => crate::sizelog::exec(&ctx, subargs).await,
        ("ingest", Some(subargs)) => crate::ingest::exec(&ctx, subargs).await,
        ("plot", Some(subargs)) => crate::plot::exec(&ctx, subargs).await,
        ("clean", Some(subargs)) => crate::clean::exec(&ctx, subargs).await,
        _ => {
            build().print_help()?;
            Ok(())
        }
    }
}

/// Fetches the set of global arguments which should be attached on each command.
pub fn global_args<'a, 'b>() -> [Arg<'a, 'b>; 1] {
    [Arg::with_name("quiet")
        .help("Only prints errors and status output")
        .short("q")
        .long("quiet")]
}

/// Fetches the batch argument for commands consuming notifications.
pub fn batch_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("batch")
        .help("A file containing a notification batch (defaults to stdin)")
        .index(1)
}

/// Reads and parses the notification batch named by the arguments.
pub fn read_batch(args: &ArgMatches<'_>) -> TrackerResult<TransportBatch> {
    let raw = match args.value_of("batch") {
        Some(path) if path != "-" => fs::read_to_string(path)?,
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    TransportBatch::parse(&raw)
}

/// Writes a status object to stdout as a single JSON document.
pub fn print_status<T: Serialize>(status: &T) -> TrackerResult<()> {
    println!("{}", serde_json::to_string(status)?);
    Ok(())
}
