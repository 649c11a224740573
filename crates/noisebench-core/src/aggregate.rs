//! Group-level summaries of the detail table.
//!
//! Groups are keyed by raw identifier text and emitted in key order.

use std::collections::BTreeMap;

use noisebench_stats::mean;
use serde::Serialize;

use crate::record::DetailRow;
use crate::table::{CsvRow, format_float};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// MSE statistics for one (image, matrix type, solver, sigma) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMapSummary {
    pub image_name: String,
    pub matrix_type: String,
    pub solver: String,
    pub sigma: String,
    pub mse_mean: f64,
    pub mse_max: f64,
    /// Lower median: element `n / 2` of the ascending values.
    pub mse_median: f64,
}

/// Conditioning, quality and failure rate for one (matrix type, solver, sigma) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditioningSummary {
    pub matrix_type: String,
    pub solver: String,
    pub sigma: String,
    /// Taken from the first row of the group.
    pub condition_number: f64,
    /// `1 / condition_number`, NaN unless the condition number is finite and positive.
    pub sigma_min_proxy: f64,
    pub psnr_mean: f64,
    pub failure_rate: f64,
    pub n_rows: usize,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Summarize finite MSE values per (image_name, matrix_type, solver, sigma).
///
/// Groups without a single finite MSE are left out.
pub fn aggregate_error_maps(rows: &[DetailRow]) -> Vec<ErrorMapSummary> {
    let mut groups: BTreeMap<(&str, &str, &str, &str), Vec<f64>> = BTreeMap::new();
    for r in rows.iter().filter(|r| r.mse.is_finite()) {
        groups
            .entry((
                r.image_name.as_str(),
                r.matrix_type.as_str(),
                r.solver.as_str(),
                r.sigma.as_str(),
            ))
            .or_default()
            .push(r.mse);
    }
    log::debug!("error maps: {} groups", groups.len());

    groups
        .into_iter()
        .map(|((image_name, matrix_type, solver, sigma), mut vals)| {
            let mse_mean = mean(&vals);
            vals.sort_by(f64::total_cmp);
            ErrorMapSummary {
                image_name: image_name.to_string(),
                matrix_type: matrix_type.to_string(),
                solver: solver.to_string(),
                sigma: sigma.to_string(),
                mse_mean,
                mse_max: vals[vals.len() - 1],
                mse_median: lower_median(&vals),
            }
        })
        .collect()
}

/// Summarize conditioning against quality per (matrix_type, solver, sigma).
pub fn aggregate_conditioning(rows: &[DetailRow]) -> Vec<ConditioningSummary> {
    let mut groups: BTreeMap<(&str, &str, &str), Vec<&DetailRow>> = BTreeMap::new();
    for r in rows {
        groups
            .entry((r.matrix_type.as_str(), r.solver.as_str(), r.sigma.as_str()))
            .or_default()
            .push(r);
    }
    log::debug!("conditioning: {} groups", groups.len());

    groups
        .into_iter()
        .map(|((matrix_type, solver, sigma), members)| {
            let condition_number = members[0].condition_number;
            let psnr: Vec<f64> = members
                .iter()
                .map(|r| r.psnr_db)
                .filter(|v| v.is_finite())
                .collect();
            let failures = members.iter().filter(|r| !r.is_ok()).count();
            ConditioningSummary {
                matrix_type: matrix_type.to_string(),
                solver: solver.to_string(),
                sigma: sigma.to_string(),
                condition_number,
                sigma_min_proxy: sigma_min_proxy(condition_number),
                psnr_mean: mean(&psnr),
                failure_rate: failures as f64 / members.len() as f64,
                n_rows: members.len(),
            }
        })
        .collect()
}

/// Smallest-singular-value proxy from a condition number.
pub fn sigma_min_proxy(condition_number: f64) -> f64 {
    if condition_number.is_finite() && condition_number > 0.0 {
        1.0 / condition_number
    } else {
        f64::NAN
    }
}

/// Element at index `n / 2` of an ascending slice; NaN when empty.
///
/// Even-length input is not averaged.
pub fn lower_median(sorted: &[f64]) -> f64 {
    sorted.get(sorted.len() / 2).copied().unwrap_or(f64::NAN)
}

// ---------------------------------------------------------------------------
// CSV rows
// ---------------------------------------------------------------------------

impl CsvRow for ErrorMapSummary {
    fn header() -> &'static [&'static str] {
        &[
            "image_name",
            "matrix_type",
            "solver",
            "sigma",
            "mse_mean",
            "mse_max",
            "mse_median",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.image_name.clone(),
            self.matrix_type.clone(),
            self.solver.clone(),
            self.sigma.clone(),
            format_float(self.mse_mean),
            format_float(self.mse_max),
            format_float(self.mse_median),
        ]
    }
}

impl CsvRow for ConditioningSummary {
    fn header() -> &'static [&'static str] {
        &[
            "matrix_type",
            "solver",
            "sigma",
            "condition_number",
            "sigma_min_proxy",
            "psnr_mean",
            "failure_rate",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.matrix_type.clone(),
            self.solver.clone(),
            self.sigma.clone(),
            format_float(self.condition_number),
            format_float(self.sigma_min_proxy),
            format_float(self.psnr_mean),
            format_float(self.failure_rate),
        ]
    }
}
