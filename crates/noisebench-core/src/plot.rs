//! Conditioning-vs-quality scatter plot.

use std::io;
use std::path::Path;

use plotters::prelude::*;

use crate::aggregate::ConditioningSummary;

const PLOT_SIZE: (u32, u32) = (1540, 990);
const COLORBAR_WIDTH: u32 = 170;
const MARKER_RADIUS: i32 = 7;

/// Viridis anchor colors at t = 0, 0.25, 0.5, 0.75, 1.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// A plottable (condition number, mean PSNR, failure rate) triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub condition_number: f64,
    pub psnr_mean: f64,
    pub failure_rate: f64,
}

/// Groups that can be placed on a log-x axis: finite positive condition
/// number and finite mean PSNR.
pub fn scatter_points(rows: &[ConditioningSummary]) -> Vec<ScatterPoint> {
    rows.iter()
        .filter(|r| {
            r.condition_number.is_finite() && r.condition_number > 0.0 && r.psnr_mean.is_finite()
        })
        .map(|r| ScatterPoint {
            condition_number: r.condition_number,
            psnr_mean: r.psnr_mean,
            failure_rate: r.failure_rate,
        })
        .collect()
}

/// Render condition number (log x) against mean PSNR, colored by failure rate.
///
/// Returns `Ok(false)` and writes nothing when no group is plottable.
pub fn render_conditioning_plot(path: &Path, rows: &[ConditioningSummary]) -> io::Result<bool> {
    let points = scatter_points(rows);
    if points.is_empty() {
        return Ok(false);
    }

    let (x_lo, x_hi) = log_range(points.iter().map(|p| p.condition_number));
    let (y_lo, y_hi) = padded_range(points.iter().map(|p| p.psnr_mean));
    let (c_lo, c_hi) = color_range(points.iter().map(|p| p.failure_rate));

    let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    let (main, bar) = root.split_horizontally(PLOT_SIZE.0 - COLORBAR_WIDTH);

    let mut chart = ChartBuilder::on(&main)
        .caption("Conditioning vs Reconstruction Quality", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d((x_lo..x_hi).log_scale(), y_lo..y_hi)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("Condition number cond(K) [log]")
        .y_desc("Mean PSNR")
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(points.iter().map(|p| {
            let t = normalize(p.failure_rate, c_lo, c_hi);
            Circle::new(
                (p.condition_number, p.psnr_mean),
                MARKER_RADIUS,
                viridis(t).filled(),
            )
        }))
        .map_err(plot_error)?;
    chart
        .draw_series(points.iter().map(|p| {
            Circle::new(
                (p.condition_number, p.psnr_mean),
                MARKER_RADIUS,
                BLACK.stroke_width(1),
            )
        }))
        .map_err(plot_error)?;

    draw_colorbar(&bar, c_lo, c_hi)?;

    root.present().map_err(plot_error)?;
    Ok(true)
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    lo: f64,
    hi: f64,
) -> io::Result<()> {
    let mut bar = ChartBuilder::on(area)
        .margin_top(60)
        .margin_bottom(80)
        .margin_right(20)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, lo..hi)
        .map_err(plot_error)?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc("Failure rate")
        .draw()
        .map_err(plot_error)?;

    let steps = 100;
    let span = hi - lo;
    bar.draw_series((0..steps).map(|i| {
        let t0 = i as f64 / steps as f64;
        let t1 = (i + 1) as f64 / steps as f64;
        Rectangle::new(
            [(0.0, lo + t0 * span), (1.0, lo + t1 * span)],
            viridis(t0).filled(),
        )
    }))
    .map_err(plot_error)?;
    Ok(())
}

/// Linear interpolation through the viridis anchors; `t` is clamped to [0, 1].
pub fn viridis(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let f = scaled - i as f64;
    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

fn normalize(v: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo { (v - lo) / (hi - lo) } else { 0.5 }
}

/// Bounds of a log axis, widened by a quarter decade on each side.
fn log_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = min_max(values);
    let pad = 10f64.powf(0.25);
    (lo / pad, hi * pad)
}

/// Bounds of a linear axis with 5% padding (1.0 when all values coincide).
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = min_max(values);
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad, hi + pad)
}

/// Color scale spans the observed failure rates, like a data-scaled colormap.
fn color_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = min_max(values);
    if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn plot_error<E: std::fmt::Display>(e: E) -> io::Error {
    io::Error::other(format!("plot rendering failed: {e}"))
}
