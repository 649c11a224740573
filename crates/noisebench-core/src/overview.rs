//! Quick dataset overview for the `inspect` command.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::record::{DetailRow, SummaryRow};
use crate::table::parse_metric;

/// Trial and failure counts for one solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolverCounts {
    pub trials: usize,
    pub failures: usize,
}

/// Shape of the loaded experiment tables.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetOverview {
    pub detail_rows: usize,
    pub summary_rows: usize,
    pub matrix_types: Vec<String>,
    /// Ordered numerically where possible, non-numeric labels last.
    pub sigmas: Vec<String>,
    pub images: usize,
    pub solvers: BTreeMap<String, SolverCounts>,
    /// Mean of finite `psnr_mean` values per solver in the summary table.
    pub summary_psnr: BTreeMap<String, f64>,
}

pub fn overview(detail: &[DetailRow], summary: &[SummaryRow]) -> DatasetOverview {
    let mut matrix_types = BTreeSet::new();
    let mut sigmas = BTreeSet::new();
    let mut images = BTreeSet::new();
    let mut solvers: BTreeMap<String, SolverCounts> = BTreeMap::new();

    for r in detail {
        matrix_types.insert(r.matrix_type.clone());
        sigmas.insert(r.sigma.clone());
        images.insert(r.image_name.as_str());
        let counts = solvers.entry(r.solver.clone()).or_default();
        counts.trials += 1;
        if !r.is_ok() {
            counts.failures += 1;
        }
    }
    for r in summary {
        matrix_types.insert(r.matrix_type.clone());
        sigmas.insert(r.sigma.clone());
    }

    let mut psnr: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in summary.iter().filter(|r| r.psnr_mean.is_finite()) {
        let acc = psnr.entry(r.solver.as_str()).or_insert((0.0, 0));
        acc.0 += r.psnr_mean;
        acc.1 += 1;
    }

    let mut sigmas: Vec<String> = sigmas.into_iter().collect();
    sigmas.sort_by(|a, b| {
        let (x, y) = (parse_metric(a), parse_metric(b));
        match (x.is_nan(), y.is_nan()) {
            (false, false) => x.total_cmp(&y),
            (a_nan, b_nan) => a_nan.cmp(&b_nan),
        }
    });

    DatasetOverview {
        detail_rows: detail.len(),
        summary_rows: summary.len(),
        matrix_types: matrix_types.into_iter().collect(),
        sigmas,
        images: images.len(),
        solvers,
        summary_psnr: psnr
            .into_iter()
            .map(|(s, (sum, n))| (s.to_string(), sum / n as f64))
            .collect(),
    }
}
