use std::path::Path;

use noisebench_core::{DatasetOverview, load_inputs, overview};

use super::fmt_stat;

pub fn run(input_dir: &str) {
    let inputs = match load_inputs(Path::new(input_dir)) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let o = overview(&inputs.detail, &inputs.summary);
    print_overview(input_dir, &o);
}

fn print_overview(input_dir: &str, o: &DatasetOverview) {
    println!("Experiment tables in {input_dir}:\n");
    println!("  Detail rows:   {}", o.detail_rows);
    println!("  Summary rows:  {}", o.summary_rows);
    println!("  Images:        {}", o.images);
    println!("  Matrix types:  {}", join_or_dash(&o.matrix_types));
    println!("  Sigma levels:  {}", join_or_dash(&o.sigmas));

    if o.solvers.is_empty() && o.summary_psnr.is_empty() {
        println!("\n  No solver rows found.");
        return;
    }

    println!(
        "\n  {:<20} {:>8} {:>9} {:>10} {:>12}",
        "Solver", "Trials", "Failures", "Fail rate", "Mean PSNR"
    );
    println!("  {}", "─".repeat(63));

    let mut names: Vec<&String> = o.solvers.keys().chain(o.summary_psnr.keys()).collect();
    names.sort();
    names.dedup();
    for name in names {
        let counts = o.solvers.get(name).copied().unwrap_or_default();
        let rate = if counts.trials > 0 {
            counts.failures as f64 / counts.trials as f64
        } else {
            f64::NAN
        };
        let psnr = o.summary_psnr.get(name).copied().unwrap_or(f64::NAN);
        println!(
            "  {:<20} {:>8} {:>9} {:>10} {:>12}",
            name,
            counts.trials,
            counts.failures,
            fmt_stat(rate, 3),
            fmt_stat(psnr, 2)
        );
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
