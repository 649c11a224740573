//! # noisebench-core
//!
//! **Paired solver comparisons for noisy matrix-encryption experiments.**
//!
//! An experiment encrypts images with a matrix, adds noise, and recovers them
//! with several linear solvers. It leaves behind two tables,
//! `results_detail.csv` (one row per trial) and `results_summary.csv`. This
//! crate turns them into paper-ready statistics.
//!
//! ## Quick Start
//!
//! ```no_run
//! use noisebench_core::{AnalysisConfig, run_analysis};
//!
//! let report = run_analysis(&AnalysisConfig::default()).expect("inputs present");
//! for c in &report.comparisons {
//!     println!("{} {}: Δ={:.3} p={:.4}", c.metric, c.solver, c.mean_delta(), c.sign_test_pvalue);
//! }
//! ```
//!
//! ## Architecture
//!
//! CSV → typed rows → pairing / aggregation → CSV tables + plot
//!
//! - [`record`]: typed rows; unusable numeric cells become NaN at the boundary.
//! - [`aggregate`]: error-map and conditioning summaries per group.
//! - [`pipeline`]: the end-to-end run and its output layout.
//! - Pairing, bootstrap and sign test live in `noisebench-stats`.

pub mod aggregate;
pub mod overview;
pub mod pipeline;
pub mod plot;
pub mod record;
pub mod table;

pub use aggregate::{
    ConditioningSummary, ErrorMapSummary, aggregate_conditioning, aggregate_error_maps,
    lower_median, sigma_min_proxy,
};
pub use noisebench_stats::{
    BootstrapCi, BootstrapConfig, PairedComparison, bootstrap_ci, paired_differences,
    sign_test_pvalue,
};
pub use overview::{DatasetOverview, SolverCounts, overview};
pub use pipeline::{
    AnalysisConfig, AnalysisReport, Inputs, compare_to_baseline, load_inputs, run_analysis,
};
pub use plot::render_conditioning_plot;
pub use record::{DetailRow, Metric, PairKey, SummaryRow, load_detail, load_summary};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
