//! Render the recent size history of a bucket as a chart.
//!
//! The chart is written back into the tracked bucket under `PLOT_KEY`,
//! replacing any previous render. That key is excluded from bucket totals
//! so the artifact never inflates the series it draws.
use clap::{App, Arg, ArgMatches, SubCommand};
use serde::Serialize;

use std::time::{Duration, UNIX_EPOCH};

use crate::cli;
use crate::context::Context;
use crate::series::TimeSeriesStore;
use crate::storage::ObjectStore;
use crate::types::TrackerResult;
use crate::util;

pub mod chart;
pub mod peak;

use self::chart::ChartPlan;

/// Well-known key the rendered chart is stored under.
pub const PLOT_KEY: &str = "plot";

/// Content type of the rendered chart.
pub const CONTENT_TYPE: &str = "image/svg+xml";

/// Summary of a successful render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlotSummary {
    pub bucket: String,
    pub plot_key: String,
    pub max_ever: u64,
    pub points_in_window: usize,
    pub window_seconds: u64,
}

/// Outcome of a render; an empty window is not a failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(PlotSummary),
    NoData,
}

/// Status object returned by the `plot` command.
#[derive(Debug, Serialize)]
pub struct PlotStatus {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

#[derive(Serialize)]
struct NoDataBody {
    msg: &'static str,
}

/// Generates an appropriate `SubCommand` for this module.
pub fn cmd<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("plot")
        .about("Render recent bucket sizes into the bucket")
        .args(&cli::global_args())
        .args(&[
            Arg::with_name("window")
                .help("Window length in seconds (overrides WINDOW_SECONDS)")
                .short("w")
                .long("window")
                .takes_value(true),
            Arg::with_name("bucket")
                .help("Bucket to render (overrides BUCKET_NAME)")
                .index(1),
        ])
}

/// Executes this subcommand and returns a `TrackerResult` to indicate success.
pub async fn exec(ctx: &Context, args: &ArgMatches<'_>) -> TrackerResult<()> {
    let bucket = match args.value_of("bucket") {
        Some(bucket) => bucket,
        None => ctx.config.bucket()?,
    };

    let window_seconds = match args.value_of("window") {
        Some(window) => window.parse()?,
        None => ctx.config.window_seconds,
    };

    let outcome = render(
        ctx.series()?,
        ctx.objects.as_ref(),
        bucket,
        window_seconds,
        util::now_millis()?,
    )
    .await?;

    let body = match outcome {
        RenderOutcome::Rendered(summary) => serde_json::to_string(&summary)?,
        RenderOutcome::NoData => serde_json::to_string(&NoDataBody { msg: "No data yet" })?,
    };

    cli::print_status(&PlotStatus {
        status_code: 200,
        body,
    })
}

/// Renders the trailing window of a bucket's history and stores the chart.
///
/// Nothing is written when the window is empty.
pub async fn render(
    series: &dyn TimeSeriesStore,
    objects: &dyn ObjectStore,
    bucket: &str,
    window_seconds: u64,
    now: u64,
) -> TrackerResult<RenderOutcome> {
    let window = series.query_window(bucket, now, window_seconds).await?;
    let history = series.query_all(bucket).await?;

    let plan = match ChartPlan::new(&window, &history) {
        Some(plan) => plan,
        None => {
            info!("No snapshots for {} in the last {}s", bucket, window_seconds);
            return Ok(RenderOutcome::NoData);
        }
    };

    let svg = chart::draw(bucket, &plan)?;
    objects
        .put_object(bucket, PLOT_KEY, svg.into_bytes(), CONTENT_TYPE)
        .await?;

    info!(
        "Rendered {} points for {} with a window high of {}",
        plan.points.len(),
        bucket,
        util::convert_bytes(plan.window_high.value())
    );

    if let Some(at) = plan.max_ever.at() {
        let seen = UNIX_EPOCH + Duration::from_millis(at);
        info!(
            "Historical high of {} first seen at {} ({} snapshots)",
            util::convert_bytes(plan.max_ever.value()),
            humantime::format_rfc3339_millis(seen),
            plan.max_ever.count()
        );
    }

    Ok(RenderOutcome::Rendered(PlotSummary {
        bucket: bucket.to_string(),
        plot_key: PLOT_KEY.to_string(),
        max_ever: plan.max_ever.value(),
        points_in_window: plan.points.len(),
        window_seconds,
    }))
}
