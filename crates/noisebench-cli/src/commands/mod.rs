pub mod analyze;
pub mod inspect;

use noisebench_core::Metric;

/// Parse a comma-separated metric list, e.g. `"psnr_db,time_ms"`.
///
/// Blank entries are ignored; duplicates keep their first position.
pub fn parse_metrics(s: &str) -> Result<Vec<Metric>, String> {
    let mut out = Vec::new();
    for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let metric: Metric = name.parse()?;
        if !out.contains(&metric) {
            out.push(metric);
        }
    }
    if out.is_empty() {
        return Err("no metrics given".to_string());
    }
    Ok(out)
}

/// Bootstrap alpha must lie strictly inside (0, 1).
pub fn validate_alpha(alpha: f64) -> Result<f64, String> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(alpha)
    } else {
        Err(format!("alpha must be in (0, 1), got {alpha}"))
    }
}

/// Format a statistic for the terminal; NaN shows as `-`.
pub fn fmt_stat(v: f64, precision: usize) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{v:.precision$}")
    }
}
