//! CLI for noisebench: paired solver comparisons from experiment result tables.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "noisebench")]
#[command(about = "noisebench: paired solver comparisons from experiment result tables")]
#[command(version = noisebench_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every solver against a baseline: bootstrap CIs, sign tests,
    /// error-map and conditioning summaries, plus a conditioning plot.
    Analyze {
        /// Directory holding results_detail.csv and results_summary.csv
        #[arg(long, default_value = "out")]
        input: String,

        /// Output directory (default: <input>/analysis)
        #[arg(long)]
        output: Option<String>,

        /// Reference solver every other solver is compared against
        #[arg(long, default_value = "np_solve")]
        baseline: String,

        /// Comma-separated metrics to compare: psnr_db, time_ms, mse, condition_number
        #[arg(long, default_value = "psnr_db,time_ms")]
        metrics: String,

        /// Bootstrap resamples per comparison
        #[arg(long, default_value = "5000")]
        resamples: usize,

        /// Two-sided miss rate of the bootstrap interval (0.05 gives 95%)
        #[arg(long, default_value = "0.05")]
        alpha: f64,

        /// Seed for the bootstrap RNG
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Skip the conditioning-vs-quality plot
        #[arg(long)]
        no_plot: bool,

        /// Write the full analysis report as JSON
        #[arg(long)]
        json: Option<String>,
    },

    /// Summarize the experiment tables: rows, solvers, failures, noise levels
    Inspect {
        /// Directory holding results_detail.csv and results_summary.csv
        #[arg(long, default_value = "out")]
        input: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            baseline,
            metrics,
            resamples,
            alpha,
            seed,
            no_plot,
            json,
        } => commands::analyze::run(commands::analyze::AnalyzeCommandConfig {
            input_dir: &input,
            output_dir: output.as_deref(),
            baseline: &baseline,
            metrics: &metrics,
            resamples,
            alpha,
            seed,
            plot: !no_plot,
            json_path: json.as_deref(),
        }),
        Commands::Inspect { input } => commands::inspect::run(&input),
    }
}
