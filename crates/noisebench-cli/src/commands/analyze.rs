use std::path::{Path, PathBuf};

use noisebench_core::{AnalysisConfig, AnalysisReport, BootstrapConfig, run_analysis};
use noisebench_stats::significance_marker;

use super::fmt_stat;

pub struct AnalyzeCommandConfig<'a> {
    pub input_dir: &'a str,
    pub output_dir: Option<&'a str>,
    pub baseline: &'a str,
    pub metrics: &'a str,
    pub resamples: usize,
    pub alpha: f64,
    pub seed: u64,
    pub plot: bool,
    pub json_path: Option<&'a str>,
}

impl AnalyzeCommandConfig<'_> {
    /// Validate flags into a pipeline config.
    fn to_analysis_config(&self) -> Result<AnalysisConfig, String> {
        let metrics = super::parse_metrics(self.metrics)?;
        let alpha = super::validate_alpha(self.alpha)?;
        if self.baseline.trim().is_empty() {
            return Err("baseline solver name must not be empty".to_string());
        }
        Ok(AnalysisConfig {
            input_dir: PathBuf::from(self.input_dir),
            output_dir: self.output_dir.map(PathBuf::from),
            baseline: self.baseline.trim().to_string(),
            metrics,
            bootstrap: BootstrapConfig {
                resamples: self.resamples,
                alpha,
                seed: self.seed,
            },
            plot: self.plot,
        })
    }
}

pub fn run(cfg: AnalyzeCommandConfig<'_>) {
    let config = match cfg.to_analysis_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    log::debug!("analysis config: {config:?}");

    println!(
        "Comparing solvers against '{}' ({} resamples, seed {})...\n",
        config.baseline, config.bootstrap.resamples, config.bootstrap.seed
    );

    let report = match run_analysis(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    print_comparisons(&report);
    print_conditioning(&report);

    if let Some(path) = cfg.json_path {
        if let Err(e) = report.write_json(Path::new(path)) {
            eprintln!("Error writing {path}: {e}");
            std::process::exit(1);
        }
        println!("\nReport written to {path}");
    }

    println!(
        "\nAnalysis artifacts written to: {}",
        report.output_dir.display()
    );
}

fn print_comparisons(report: &AnalysisReport) {
    if report.comparisons.is_empty() {
        println!(
            "  No solver shares a trial with baseline '{}'.",
            report.baseline
        );
        return;
    }

    let level = (1.0 - report.bootstrap.alpha) * 100.0;
    println!(
        "  {:<16} {:<20} {:>7} {:>12} {:>25} {:>10}",
        "Metric",
        "Solver",
        "Pairs",
        "Mean Δ",
        format!("{level:.0}% CI"),
        "Sign p"
    );
    println!("  {}", "─".repeat(95));

    for c in &report.comparisons {
        let ci = format!("[{}, {}]", fmt_stat(c.ci.lower, 4), fmt_stat(c.ci.upper, 4));
        println!(
            "  {:<16} {:<20} {:>7} {:>12} {:>25} {:>7} {:<3}",
            c.metric,
            c.solver,
            c.n_pairs,
            fmt_stat(c.mean_delta(), 4),
            ci,
            fmt_stat(c.sign_test_pvalue, 4),
            significance_marker(c.sign_test_pvalue)
        );
    }
    println!("\n  Δ = solver − {}; * p<0.05, ** p<0.01, *** p<0.001", report.baseline);
}

fn print_conditioning(report: &AnalysisReport) {
    if report.conditioning.is_empty() {
        return;
    }
    let failing = report
        .conditioning
        .iter()
        .filter(|c| c.failure_rate > 0.0)
        .count();
    println!(
        "\n  {} conditioning group(s), {} with failures; {} error-map group(s)",
        report.conditioning.len(),
        failing,
        report.error_maps.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use noisebench_core::Metric;

    fn cfg() -> AnalyzeCommandConfig<'static> {
        AnalyzeCommandConfig {
            input_dir: "runs/today",
            output_dir: None,
            baseline: "np_solve",
            metrics: "psnr_db,time_ms",
            resamples: 2000,
            alpha: 0.1,
            seed: 7,
            plot: false,
            json_path: None,
        }
    }

    #[test]
    fn test_flags_map_to_config() {
        let c = cfg().to_analysis_config().unwrap();
        assert_eq!(c.input_dir, PathBuf::from("runs/today"));
        assert_eq!(c.output_dir(), PathBuf::from("runs/today/analysis"));
        assert_eq!(c.metrics, vec![Metric::PsnrDb, Metric::TimeMs]);
        assert_eq!(c.bootstrap.resamples, 2000);
        assert_eq!(c.bootstrap.alpha, 0.1);
        assert_eq!(c.bootstrap.seed, 7);
        assert!(!c.plot);
    }

    #[test]
    fn test_explicit_output_dir() {
        let mut a = cfg();
        a.output_dir = Some("elsewhere");
        let c = a.to_analysis_config().unwrap();
        assert_eq!(c.output_dir(), PathBuf::from("elsewhere"));
    }

    #[test]
    fn test_bad_flags_rejected() {
        let mut a = cfg();
        a.metrics = "psnr_db,ssim";
        assert!(a.to_analysis_config().is_err());

        let mut a = cfg();
        a.alpha = 1.5;
        assert!(a.to_analysis_config().is_err());

        let mut a = cfg();
        a.baseline = "  ";
        assert!(a.to_analysis_config().is_err());
    }
}
