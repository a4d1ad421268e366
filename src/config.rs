//! Environment based configuration for all entry points.
//!
//! Values are read once at startup; required values are only checked at
//! the point they're needed, so `log` can run without a table configured.
use rusoto_core::Region;

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::types::TrackerResult;

/// Default render window, in seconds.
pub const DEFAULT_WINDOW_SECONDS: u64 = 20;

/// Default region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Runtime configuration resolved from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub region: Region,
    pub bucket: Option<String>,
    pub table: Option<String>,
    pub window_seconds: u64,
    // only read by the driver collaborator
    #[allow(dead_code)]
    pub plotting_api_url: Option<String>,
    pub log_group: Option<String>,
}

impl Config {
    /// Loads a `Config` from the process environment.
    pub fn from_env() -> TrackerResult<Config> {
        Config::from_vars(&env::vars().collect())
    }

    /// Loads a `Config` from a provided variable mapping.
    pub fn from_vars(vars: &HashMap<String, String>) -> TrackerResult<Config> {
        let lookup = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let region = lookup("AWS_REGION")
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
            .parse::<Region>()?;

        let window_seconds = match lookup("WINDOW_SECONDS") {
            Some(raw) => parse_window(&raw)?,
            None => DEFAULT_WINDOW_SECONDS,
        };

        Ok(Config {
            region,
            window_seconds,
            bucket: lookup("BUCKET_NAME"),
            table: lookup("TABLE_NAME"),
            plotting_api_url: lookup("PLOTTING_API_URL"),
            log_group: lookup("AWS_LAMBDA_LOG_GROUP_NAME"),
        })
    }

    /// Retrieves the tracked bucket name, failing when unset.
    pub fn bucket(&self) -> TrackerResult<&str> {
        required(&self.bucket, "BUCKET_NAME")
    }

    /// Retrieves the time-series table name, failing when unset.
    pub fn table(&self) -> TrackerResult<&str> {
        required(&self.table, "TABLE_NAME")
    }
}

/// Parses a window length as either bare seconds or a humantime duration.
fn parse_window(raw: &str) -> TrackerResult<u64> {
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(secs);
    }
    let duration: Duration = humantime::parse_duration(raw)?;
    Ok(duration.as_secs())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> TrackerResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| format!("Missing required environment variable: {}", name).into())
}
