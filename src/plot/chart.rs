//! Layout and SVG drawing of the windowed size chart.
//!
//! The dashed reference line is drawn at the highest size inside the
//! window, while `max_ever` is computed over the full history. The two
//! can differ and both are reported as-is.
use plotters::prelude::*;

use std::fmt::Display;

use super::peak::HighWater;
use crate::series::BucketSnapshot;
use crate::types::{TrackerError, TrackerResult};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// Everything needed to draw a chart, derived from stored snapshots.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartPlan {
    /// Points of `(seconds since first window point, size in bytes)`.
    pub points: Vec<(f64, u64)>,
    /// Highest size inside the window; where the reference line sits.
    pub window_high: HighWater,
    /// Highest size across the entire history.
    pub max_ever: HighWater,
}

impl ChartPlan {
    /// Builds a plan from a window and the full history, or `None` when
    /// the window holds no snapshots.
    pub fn new(window: &[BucketSnapshot], history: &[BucketSnapshot]) -> Option<ChartPlan> {
        let origin = window.first()?.timestamp;

        let points = window
            .iter()
            .map(|s| {
                let elapsed = s.timestamp.saturating_sub(origin) as f64 / 1000.0;
                (elapsed, s.size_bytes)
            })
            .collect();

        Some(ChartPlan {
            points,
            window_high: HighWater::over(window),
            max_ever: HighWater::over(history),
        })
    }
}

/// Draws a plan as an SVG document titled with the bucket name.
pub fn draw(bucket: &str, plan: &ChartPlan) -> TrackerResult<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let high = plan.window_high.value() as f64;
        let x_end = plan
            .points
            .last()
            .map(|(x, _)| *x)
            .unwrap_or(0.0)
            .max(1.0);
        let y_end = (high * 1.1).max(1.0);

        let mut chart = ChartBuilder::on(&root)
            .caption(bucket, ("sans-serif", 20).into_font())
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(0.0..x_end, 0.0..y_end)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_desc("Time (s)")
            .y_desc("Bucket size (bytes)")
            .draw()
            .map_err(chart_err)?;

        let series: Vec<(f64, f64)> = plan.points.iter().map(|(x, y)| (*x, *y as f64)).collect();

        chart
            .draw_series(LineSeries::new(series.iter().copied(), &BLUE))
            .map_err(chart_err)?
            .label("Bucket size")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

        chart
            .draw_series(series.iter().map(|p| Circle::new(*p, 3, BLUE.filled())))
            .map_err(chart_err)?;

        let reference = vec![(0.0, high), (x_end, high)];
        chart
            .draw_series(DashedLineSeries::new(reference, 8, 6, RED.stroke_width(2)))
            .map_err(chart_err)?
            .label("Historical high")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

fn chart_err<E: Display>(err: E) -> TrackerError {
    format!("Unable to draw chart: {}", err).into()
}
