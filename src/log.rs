//! Logging module for terminal based output control.
//!
//! Operational messages go through this logger; size-log records do not,
//! as they are written as raw JSON lines by `sizelog::StdoutSink`.
use clap::ArgMatches;
use logger::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Basic logger instance to allow quiet-aware logging.
struct BasicLogger {
    quiet: bool,
}

impl Log for BasicLogger {
    /// Returns enabled only for bucket-tracker modules.
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("bucket_tracker")
    }

    /// Logs out a `Record` when logging is enabled.
    ///
    /// Errors and warnings are routed to stderr so that stdout only ever
    /// carries informational output and JSON records.
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.metadata().level() {
            Level::Error | Level::Warn => eprintln!("{}", record.args()),
            _ if !self.quiet => println!("{}", record.args()),
            _ => (),
        }
    }

    fn flush(&self) {}
}

/// Initializes the logger based on the provided arguments.
///
/// If the `-q` flag was provided, this culls everything below a warning.
pub fn init(args: &ArgMatches) -> Result<(), SetLoggerError> {
    let logger = Box::new(BasicLogger {
        quiet: args.is_present("quiet"),
    });
    logger::set_boxed_logger(logger).map(|_| logger::set_max_level(LevelFilter::Info))
}
