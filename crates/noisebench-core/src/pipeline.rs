//! End-to-end analysis run: load → pair → resample → aggregate → write.
//!
//! # Output Layout
//!
//! All artifacts land in one directory (default `<input>/analysis`):
//! - `paired_stats.csv`: n, mean delta and sign-test p per (metric, solver)
//! - `bootstrap_ci.csv`: n, mean delta and percentile CI per (metric, solver)
//! - `error_map_summary.csv`: MSE mean/max/median per image group
//! - `conditioning_failure_summary.csv`: conditioning vs quality and failures
//! - `conditioning_vs_quality.png`: log-x scatter of the conditioning table
//!
//! Tables with no rows are not written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use noisebench_stats::{BootstrapConfig, PairedComparison, compare_metric};
use serde::Serialize;

use crate::aggregate::{
    ConditioningSummary, ErrorMapSummary, aggregate_conditioning, aggregate_error_maps,
};
use crate::plot::render_conditioning_plot;
use crate::record::{DetailRow, Metric, SummaryRow, load_detail, load_summary};
use crate::table::{CsvRow, format_float, write_rows};

pub const DETAIL_CSV: &str = "results_detail.csv";
pub const SUMMARY_CSV: &str = "results_summary.csv";
pub const PAIRED_STATS_CSV: &str = "paired_stats.csv";
pub const BOOTSTRAP_CI_CSV: &str = "bootstrap_ci.csv";
pub const ERROR_MAP_CSV: &str = "error_map_summary.csv";
pub const CONDITIONING_CSV: &str = "conditioning_failure_summary.csv";
pub const CONDITIONING_PLOT: &str = "conditioning_vs_quality.png";

/// Solver every alternative is compared against by default.
pub const DEFAULT_BASELINE: &str = "np_solve";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Directory holding `results_detail.csv` and `results_summary.csv`.
    pub input_dir: PathBuf,
    /// Output directory; `None` means `<input_dir>/analysis`.
    pub output_dir: Option<PathBuf>,
    pub baseline: String,
    pub metrics: Vec<Metric>,
    pub bootstrap: BootstrapConfig,
    pub plot: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("out"),
            output_dir: None,
            baseline: DEFAULT_BASELINE.to_string(),
            metrics: vec![Metric::PsnrDb, Metric::TimeMs],
            bootstrap: BootstrapConfig::default(),
            plot: true,
        }
    }
}

impl AnalysisConfig {
    pub fn detail_path(&self) -> PathBuf {
        self.input_dir.join(DETAIL_CSV)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.input_dir.join(SUMMARY_CSV)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.input_dir.join("analysis"))
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything one run computed, plus the files it wrote.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub noisebench_version: String,
    pub baseline: String,
    pub metrics: Vec<Metric>,
    pub bootstrap: BootstrapConfig,
    pub detail_rows: usize,
    pub summary_rows: usize,
    pub comparisons: Vec<PairedComparison>,
    pub error_maps: Vec<ErrorMapSummary>,
    pub conditioning: Vec<ConditioningSummary>,
    pub output_dir: PathBuf,
    pub written: Vec<PathBuf>,
}

impl AnalysisReport {
    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Both input tables, typed.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub detail: Vec<DetailRow>,
    pub summary: Vec<SummaryRow>,
}

/// Load both input tables from `input_dir`.
///
/// Fails with `NotFound` if either file is absent, before reading anything.
pub fn load_inputs(input_dir: &Path) -> io::Result<Inputs> {
    let detail_path = input_dir.join(DETAIL_CSV);
    let summary_path = input_dir.join(SUMMARY_CSV);
    for path in [&detail_path, &summary_path] {
        if !path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "missing {}; run the experiment notebook first to produce {DETAIL_CSV} and {SUMMARY_CSV}",
                    path.display()
                ),
            ));
        }
    }
    Ok(Inputs {
        detail: load_detail(&detail_path)?,
        summary: load_summary(&summary_path)?,
    })
}

/// Paired comparison of every solver against `baseline`, metric by metric.
pub fn compare_to_baseline(
    rows: &[DetailRow],
    metrics: &[Metric],
    baseline: &str,
    bootstrap: &BootstrapConfig,
) -> Vec<PairedComparison> {
    metrics
        .iter()
        .flat_map(|&metric| {
            compare_metric(
                rows,
                metric.column(),
                |r: &DetailRow| r.metric(metric),
                baseline,
                bootstrap,
            )
        })
        .collect()
}

/// Run the full analysis and write every artifact.
///
/// Nothing is written unless both inputs load.
pub fn run_analysis(config: &AnalysisConfig) -> io::Result<AnalysisReport> {
    let inputs = load_inputs(&config.input_dir)?;
    log::info!(
        "loaded {} detail rows, {} summary rows from {}",
        inputs.detail.len(),
        inputs.summary.len(),
        config.input_dir.display()
    );

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir)?;
    let mut written = Vec::new();

    let comparisons = compare_to_baseline(
        &inputs.detail,
        &config.metrics,
        &config.baseline,
        &config.bootstrap,
    );
    if comparisons.is_empty() {
        log::warn!(
            "no pairs found against baseline '{}'; paired tables skipped",
            config.baseline
        );
    }
    let paired: Vec<PairedStatsRow<'_>> = comparisons.iter().map(PairedStatsRow).collect();
    let boot: Vec<BootstrapCiRow<'_>> = comparisons.iter().map(BootstrapCiRow).collect();
    write_table(&output_dir, PAIRED_STATS_CSV, &paired, &mut written)?;
    write_table(&output_dir, BOOTSTRAP_CI_CSV, &boot, &mut written)?;

    let error_maps = aggregate_error_maps(&inputs.detail);
    write_table(&output_dir, ERROR_MAP_CSV, &error_maps, &mut written)?;

    let conditioning = aggregate_conditioning(&inputs.detail);
    write_table(&output_dir, CONDITIONING_CSV, &conditioning, &mut written)?;

    if config.plot {
        let path = output_dir.join(CONDITIONING_PLOT);
        if render_conditioning_plot(&path, &conditioning)? {
            log::info!("wrote {}", path.display());
            written.push(path);
        } else {
            log::warn!("no plottable conditioning groups; {CONDITIONING_PLOT} skipped");
        }
    }

    Ok(AnalysisReport {
        noisebench_version: crate::VERSION.to_string(),
        baseline: config.baseline.clone(),
        metrics: config.metrics.clone(),
        bootstrap: config.bootstrap,
        detail_rows: inputs.detail.len(),
        summary_rows: inputs.summary.len(),
        comparisons,
        error_maps,
        conditioning,
        output_dir,
        written,
    })
}

fn write_table<T: CsvRow>(
    dir: &Path,
    name: &str,
    rows: &[T],
    written: &mut Vec<PathBuf>,
) -> io::Result<()> {
    let path = dir.join(name);
    if write_rows(&path, rows)? {
        log::info!("wrote {} ({} rows)", path.display(), rows.len());
        written.push(path);
    } else {
        log::warn!("{name}: no rows, file not written");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV rows for comparisons
// ---------------------------------------------------------------------------

/// `paired_stats.csv` view of a comparison.
pub struct PairedStatsRow<'a>(pub &'a PairedComparison);

/// `bootstrap_ci.csv` view of a comparison.
pub struct BootstrapCiRow<'a>(pub &'a PairedComparison);

impl CsvRow for PairedStatsRow<'_> {
    fn header() -> &'static [&'static str] {
        &[
            "metric",
            "solver",
            "n_pairs",
            "mean_delta_vs_np",
            "sign_test_pvalue",
        ]
    }

    fn fields(&self) -> Vec<String> {
        let c = self.0;
        vec![
            c.metric.clone(),
            c.solver.clone(),
            c.n_pairs.to_string(),
            format_float(c.mean_delta()),
            format_float(c.sign_test_pvalue),
        ]
    }
}

impl CsvRow for BootstrapCiRow<'_> {
    fn header() -> &'static [&'static str] {
        &[
            "metric",
            "solver",
            "n_pairs",
            "mean_delta_vs_np",
            "ci95_low",
            "ci95_high",
        ]
    }

    fn fields(&self) -> Vec<String> {
        let c = self.0;
        vec![
            c.metric.clone(),
            c.solver.clone(),
            c.n_pairs.to_string(),
            format_float(c.mean_delta()),
            format_float(c.ci.lower),
            format_float(c.ci.upper),
        ]
    }
}
