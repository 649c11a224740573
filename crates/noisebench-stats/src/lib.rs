//! Paired-comparison battery for solver benchmarks.
//!
//! Every alternative solver is compared against a baseline on the same trials:
//! rows are matched by a pairing key, per-trial deltas are collected, and each
//! delta list is summarized by a percentile-bootstrap confidence interval on
//! the mean and an exact two-sided sign test.
//!
//! Non-finite values never raise: they are excluded from the statistic they
//! would feed, and statistics over zero usable samples come back as NaN.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use statrs::distribution::{Binomial, DiscreteCDF};

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// One observation of a solver on a trial that other solvers also ran.
pub trait Observation {
    /// Identity of the trial, excluding the solver.
    type Key: Hash + Eq + Clone;

    fn pair_key(&self) -> Self::Key;
    fn solver(&self) -> &str;
}

/// Percentile-bootstrap estimate of a mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BootstrapCi {
    /// Mean of the original (non-resampled) values.
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

impl BootstrapCi {
    pub const NAN: BootstrapCi = BootstrapCi {
        mean: f64::NAN,
        lower: f64::NAN,
        upper: f64::NAN,
    };
}

/// Resampling parameters for [`bootstrap_ci`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BootstrapConfig {
    pub resamples: usize,
    /// Two-sided miss rate; 0.05 gives a 95% interval.
    pub alpha: f64,
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            resamples: 5000,
            alpha: 0.05,
            seed: 42,
        }
    }
}

/// Result of comparing one solver against the baseline on one metric.
#[derive(Debug, Clone, Serialize)]
pub struct PairedComparison {
    pub metric: String,
    pub solver: String,
    pub n_pairs: usize,
    pub ci: BootstrapCi,
    pub sign_test_pvalue: f64,
}

impl PairedComparison {
    /// Mean of (solver − baseline) over all pairs.
    pub fn mean_delta(&self) -> f64 {
        self.ci.mean
    }
}

/// Conventional star marker for a p-value: `***` < 0.001, `**` < 0.01,
/// `*` < 0.05, otherwise empty (NaN included).
pub fn significance_marker(p: f64) -> &'static str {
    match p {
        p if p < 0.001 => "***",
        p if p < 0.01 => "**",
        p if p < 0.05 => "*",
        _ => "",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Pairing
// ═══════════════════════════════════════════════════════════════════════════════

/// Collect per-solver deltas against `baseline`.
///
/// Rows are grouped by [`Observation::pair_key`]. A group whose baseline value
/// is missing or non-finite contributes nothing for any solver. Otherwise every
/// other solver with a finite value gets `value - baseline_value` appended.
///
/// Deltas keep the order in which their pairing keys first appear in `rows`.
/// If a solver shows up twice under one key, the later row wins.
pub fn paired_differences<R, F>(rows: &[R], value: F, baseline: &str) -> BTreeMap<String, Vec<f64>>
where
    R: Observation,
    F: Fn(&R) -> f64,
{
    let mut index: HashMap<R::Key, usize> = HashMap::new();
    let mut groups: Vec<Vec<(&str, f64)>> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.pair_key()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        let group = &mut groups[slot];
        let v = value(row);
        match group.iter_mut().find(|(s, _)| *s == row.solver()) {
            Some(entry) => entry.1 = v,
            None => group.push((row.solver(), v)),
        }
    }

    let mut diffs: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for group in &groups {
        let base = match group.iter().find(|(s, _)| *s == baseline) {
            Some(&(_, b)) if b.is_finite() => b,
            _ => continue,
        };
        for &(solver, v) in group {
            if solver == baseline || !v.is_finite() {
                continue;
            }
            diffs.entry(solver.to_string()).or_default().push(v - base);
        }
    }
    diffs
}

// ═══════════════════════════════════════════════════════════════════════════════
// Bootstrap
// ═══════════════════════════════════════════════════════════════════════════════

/// Empirical-percentile bootstrap CI on the mean of `values`.
///
/// Draws `resamples` resamples of size `n` with replacement from a `StdRng`
/// seeded with `seed`, so identical inputs always give identical bounds.
/// The lower bound is the sorted resample mean at rank `floor(alpha/2 * B)`,
/// the upper at `ceil((1 - alpha/2) * B) - 1`, both clamped into range.
pub fn bootstrap_ci(values: &[f64], resamples: usize, alpha: f64, seed: u64) -> BootstrapCi {
    if values.is_empty() {
        return BootstrapCi::NAN;
    }

    let n = values.len();
    let resamples = resamples.max(1);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut means = Vec::with_capacity(resamples);
    for _ in 0..resamples {
        let mut sum = 0.0;
        for _ in 0..n {
            sum += values[rng.random_range(0..n)];
        }
        means.push(sum / n as f64);
    }
    means.sort_by(f64::total_cmp);

    let b = resamples as f64;
    let last = resamples - 1;
    let lo_idx = ((alpha / 2.0) * b).floor().max(0.0) as usize;
    let hi_idx = (((1.0 - alpha / 2.0) * b).ceil() as isize - 1).max(0) as usize;

    BootstrapCi {
        mean: mean(values),
        lower: means[lo_idx.min(last)],
        upper: means[hi_idx.min(last)],
    }
}

impl BootstrapConfig {
    pub fn ci(&self, values: &[f64]) -> BootstrapCi {
        bootstrap_ci(values, self.resamples, self.alpha, self.seed)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sign test
// ═══════════════════════════════════════════════════════════════════════════════

/// Largest `n` for which the binomial tail is summed exactly in `u128`.
///
/// C(120, 60) * 60 stays below 2^123, so the running coefficient cannot
/// overflow while k <= n/2.
const EXACT_TAIL_MAX_N: usize = 120;

/// Two-sided exact sign test on paired differences.
///
/// Zero (and NaN) deltas are dropped. With `k = min(pos, neg)` over the
/// remaining `n`, returns `min(1, 2 * P(X <= k))` for `X ~ Binomial(n, 1/2)`.
/// Returns NaN when no delta has a sign.
pub fn sign_test_pvalue(diffs: &[f64]) -> f64 {
    let pos = diffs.iter().filter(|&&d| d > 0.0).count();
    let neg = diffs.iter().filter(|&&d| d < 0.0).count();
    let n = pos + neg;
    if n == 0 {
        return f64::NAN;
    }
    let k = pos.min(neg);
    (2.0 * binomial_half_lower_tail(n, k)).min(1.0)
}

/// P(X <= k) for X ~ Binomial(n, 1/2), with k <= n/2.
fn binomial_half_lower_tail(n: usize, k: usize) -> f64 {
    if n <= EXACT_TAIL_MAX_N {
        let mut coeff: u128 = 1;
        let mut sum: u128 = 0;
        for i in 0..=k {
            sum += coeff;
            if i < k {
                coeff = coeff * (n - i) as u128 / (i + 1) as u128;
            }
        }
        return sum as f64 / 2f64.powi(n as i32);
    }

    match Binomial::new(0.5, n as u64) {
        Ok(dist) => dist.cdf(k as u64),
        Err(_) => f64::NAN,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Comparison battery
// ═══════════════════════════════════════════════════════════════════════════════

/// Compare every non-baseline solver against `baseline` on one metric.
///
/// Output is ordered by solver name. Solvers never paired with a finite
/// baseline value do not appear.
pub fn compare_metric<R, F>(
    rows: &[R],
    metric: &str,
    value: F,
    baseline: &str,
    config: &BootstrapConfig,
) -> Vec<PairedComparison>
where
    R: Observation,
    F: Fn(&R) -> f64,
{
    paired_differences(rows, value, baseline)
        .into_iter()
        .map(|(solver, diffs)| PairedComparison {
            metric: metric.to_string(),
            n_pairs: diffs.len(),
            ci: config.ci(&diffs),
            sign_test_pvalue: sign_test_pvalue(&diffs),
            solver,
        })
        .collect()
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Trial {
        key: &'static str,
        solver: &'static str,
        psnr: f64,
    }

    impl Observation for Trial {
        type Key = &'static str;

        fn pair_key(&self) -> Self::Key {
            self.key
        }

        fn solver(&self) -> &str {
            self.solver
        }
    }

    fn trial(key: &'static str, solver: &'static str, psnr: f64) -> Trial {
        Trial { key, solver, psnr }
    }

    /// Symmetric, low-variance deltas around 1.0 (simple LCG jitter).
    fn symmetric_deltas(n: usize) -> Vec<f64> {
        let mut state: u64 = 0xDEAD_BEEF_CAFE_BABE;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n / 2 {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let jitter = ((state >> 33) as f64 / (1u64 << 31) as f64) * 0.1;
            out.push(1.0 + jitter);
            out.push(1.0 - jitter);
        }
        out
    }

    // -----------------------------------------------------------------------
    // paired_differences
    // -----------------------------------------------------------------------

    #[test]
    fn test_paired_differences_basic() {
        let rows = vec![
            trial("A", "np_solve", 30.0),
            trial("A", "lu", 28.0),
            trial("B", "np_solve", 32.0),
            trial("B", "lu", 33.0),
        ];
        let diffs = paired_differences(&rows, |r| r.psnr, "np_solve");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs["lu"], vec![-2.0, 1.0]);
    }

    #[test]
    fn test_missing_baseline_skips_group() {
        let rows = vec![
            trial("A", "lu", 28.0),
            trial("A", "qr", 27.0),
            trial("B", "np_solve", 32.0),
            trial("B", "lu", 33.0),
        ];
        let diffs = paired_differences(&rows, |r| r.psnr, "np_solve");
        assert_eq!(diffs["lu"], vec![1.0]);
        assert!(!diffs.contains_key("qr"));
    }

    #[test]
    fn test_non_finite_baseline_skips_group() {
        let rows = vec![
            trial("A", "np_solve", f64::NAN),
            trial("A", "lu", 28.0),
            trial("B", "np_solve", f64::INFINITY),
            trial("B", "lu", 33.0),
        ];
        let diffs = paired_differences(&rows, |r| r.psnr, "np_solve");
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_non_finite_alternative_dropped() {
        let rows = vec![
            trial("A", "np_solve", 30.0),
            trial("A", "lu", f64::NAN),
            trial("A", "qr", 31.0),
        ];
        let diffs = paired_differences(&rows, |r| r.psnr, "np_solve");
        assert!(!diffs.contains_key("lu"));
        assert_eq!(diffs["qr"], vec![1.0]);
    }

    #[test]
    fn test_order_follows_first_key_appearance() {
        let rows = vec![
            trial("B", "lu", 10.0),
            trial("A", "np_solve", 0.0),
            trial("A", "lu", 5.0),
            trial("B", "np_solve", 0.0),
        ];
        let diffs = paired_differences(&rows, |r| r.psnr, "np_solve");
        assert_eq!(diffs["lu"], vec![10.0, 5.0]);
    }

    #[test]
    fn test_duplicate_solver_last_wins() {
        let rows = vec![
            trial("A", "np_solve", 30.0),
            trial("A", "lu", 20.0),
            trial("A", "lu", 29.0),
        ];
        let diffs = paired_differences(&rows, |r| r.psnr, "np_solve");
        assert_eq!(diffs["lu"], vec![-1.0]);
    }

    // -----------------------------------------------------------------------
    // bootstrap_ci
    // -----------------------------------------------------------------------

    #[test]
    fn test_bootstrap_empty_is_nan() {
        let ci = bootstrap_ci(&[], 5000, 0.05, 42);
        assert!(ci.mean.is_nan());
        assert!(ci.lower.is_nan());
        assert!(ci.upper.is_nan());
    }

    #[test]
    fn test_bootstrap_deterministic() {
        let data = symmetric_deltas(40);
        let a = bootstrap_ci(&data, 2000, 0.05, 7);
        let b = bootstrap_ci(&data, 2000, 0.05, 7);
        assert_eq!(a.mean.to_bits(), b.mean.to_bits());
        assert_eq!(a.lower.to_bits(), b.lower.to_bits());
        assert_eq!(a.upper.to_bits(), b.upper.to_bits());
    }

    #[test]
    fn test_bootstrap_brackets_symmetric_mean() {
        let data = symmetric_deltas(60);
        let ci = BootstrapConfig::default().ci(&data);
        assert!(ci.lower <= ci.upper);
        assert!(
            ci.lower <= ci.mean && ci.mean <= ci.upper,
            "{} <= {} <= {}",
            ci.lower,
            ci.mean,
            ci.upper
        );
        assert!((ci.mean - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bootstrap_constant_values() {
        let ci = bootstrap_ci(&[2.5; 10], 500, 0.05, 1);
        assert_eq!(ci.mean, 2.5);
        assert_eq!(ci.lower, 2.5);
        assert_eq!(ci.upper, 2.5);
    }

    #[test]
    fn test_bootstrap_single_value_and_zero_resamples() {
        let ci = bootstrap_ci(&[-3.0], 0, 0.05, 42);
        assert_eq!(ci.mean, -3.0);
        assert_eq!(ci.lower, -3.0);
        assert_eq!(ci.upper, -3.0);
    }

    #[test]
    fn test_bootstrap_bound_ranks() {
        // (1 - 0.025) * 999 = 974.025, so the upper rank is ceil(..) - 1 = 974.
        let data = [
            0.31, -1.27, 2.53, 0.07, 4.19, -0.73, 1.97, 3.11, -2.39, 0.83, 5.47, -0.11,
        ];
        let (resamples, alpha, seed) = (999, 0.05, 11);
        let ci = bootstrap_ci(&data, resamples, alpha, seed);

        let mut rng = StdRng::seed_from_u64(seed);
        let n = data.len();
        let mut means = Vec::with_capacity(resamples);
        for _ in 0..resamples {
            let mut sum = 0.0;
            for _ in 0..n {
                sum += data[rng.random_range(0..n)];
            }
            means.push(sum / n as f64);
        }
        means.sort_by(f64::total_cmp);

        assert_eq!(ci.lower.to_bits(), means[24].to_bits());
        assert_eq!(ci.upper.to_bits(), means[974].to_bits());
    }

    #[test]
    fn test_bootstrap_lower_le_upper_small_skewed() {
        let data = [0.0, 0.0, 0.0, 10.0];
        for seed in 0..20 {
            let ci = bootstrap_ci(&data, 300, 0.05, seed);
            assert!(ci.lower <= ci.upper);
        }
    }

    // -----------------------------------------------------------------------
    // sign_test_pvalue
    // -----------------------------------------------------------------------

    #[test]
    fn test_sign_test_no_signal() {
        assert!(sign_test_pvalue(&[]).is_nan());
        assert!(sign_test_pvalue(&[0.0, 0.0]).is_nan());
    }

    #[test]
    fn test_sign_test_single_positive() {
        assert_eq!(sign_test_pvalue(&[5.0]), 1.0);
    }

    #[test]
    fn test_sign_test_balanced_is_one() {
        assert_eq!(sign_test_pvalue(&[1.0, -1.0]), 1.0);
        assert_eq!(sign_test_pvalue(&[1.0, 2.0, -1.0, -2.0, 0.0]), 1.0);
        let mut many = vec![0.5; 100];
        many.extend(vec![-0.5; 100]);
        assert_eq!(sign_test_pvalue(&many), 1.0);
    }

    #[test]
    fn test_sign_test_symmetric() {
        let diffs = [1.0, 2.0, 3.0, -0.5, 4.0, 0.0, 7.0, 1.5];
        let neg: Vec<f64> = diffs.iter().map(|d| -d).collect();
        assert_eq!(sign_test_pvalue(&diffs), sign_test_pvalue(&neg));
    }

    #[test]
    fn test_sign_test_exact_values() {
        // 10 positives, 0 negatives: 2 / 2^10
        let p = sign_test_pvalue(&[1.0; 10]);
        assert!((p - 2.0 / 1024.0).abs() < 1e-15);
        // 8 vs 2: 2 * (1 + 10 + 45) / 1024
        let mut d = vec![1.0; 8];
        d.extend([-1.0, -1.0]);
        let p = sign_test_pvalue(&d);
        assert!((p - 112.0 / 1024.0).abs() < 1e-15);
    }

    #[test]
    fn test_sign_test_large_n_uses_distribution() {
        let mut d = vec![1.0; 150];
        d.extend(vec![-1.0; 50]);
        let p = sign_test_pvalue(&d);
        assert!(p > 0.0 && p < 1e-6, "p = {p}");
        let neg: Vec<f64> = d.iter().map(|x| -x).collect();
        assert!((p - sign_test_pvalue(&neg)).abs() < 1e-18);
    }

    #[test]
    fn test_exact_tail_boundary_agrees_with_statrs() {
        let exact = binomial_half_lower_tail(EXACT_TAIL_MAX_N, 50);
        let dist = Binomial::new(0.5, EXACT_TAIL_MAX_N as u64).unwrap();
        assert!((exact - dist.cdf(50)).abs() < 1e-9);
    }

    // -----------------------------------------------------------------------
    // compare_metric
    // -----------------------------------------------------------------------

    #[test]
    fn test_compare_metric_rows() {
        let rows = vec![
            trial("A", "np_solve", 30.0),
            trial("A", "lu", 28.0),
            trial("A", "cg", 31.0),
            trial("B", "np_solve", 32.0),
            trial("B", "lu", 33.0),
            trial("B", "cg", 34.0),
        ];
        let cmp = compare_metric(
            &rows,
            "psnr_db",
            |r| r.psnr,
            "np_solve",
            &BootstrapConfig::default(),
        );
        assert_eq!(cmp.len(), 2);
        assert_eq!(cmp[0].solver, "cg");
        assert_eq!(cmp[1].solver, "lu");
        assert_eq!(cmp[1].n_pairs, 2);
        assert!((cmp[1].mean_delta() - -0.5).abs() < 1e-12);
        assert_eq!(cmp[0].sign_test_pvalue, 0.5);
        assert!(cmp.iter().all(|c| c.metric == "psnr_db"));
    }

    #[test]
    fn test_significance_marker() {
        assert_eq!(significance_marker(0.0001), "***");
        assert_eq!(significance_marker(0.005), "**");
        assert_eq!(significance_marker(0.03), "*");
        assert_eq!(significance_marker(0.5), "");
        assert_eq!(significance_marker(f64::NAN), "");
    }

    #[test]
    fn test_mean_empty() {
        assert!(mean(&[]).is_nan());
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }
}
