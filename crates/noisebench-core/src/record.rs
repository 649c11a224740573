//! Typed rows of the experiment result tables.
//!
//! Identifiers (solver, sigma, repeat, ...) keep their raw text so grouping
//! and output reproduce the input exactly. Metric columns are parsed once at
//! load time; unusable cells become NaN.

use std::path::Path;
use std::str::FromStr;

use noisebench_stats::Observation;
use serde::Serialize;

use crate::table::{Record, Table, parse_metric};

/// Columns `results_detail.csv` is expected to carry.
pub const DETAIL_COLUMNS: &[&str] = &[
    "matrix_type",
    "solver",
    "sigma",
    "repeat",
    "image_idx",
    "image_name",
    "data_source",
    "psnr_db",
    "time_ms",
    "mse",
    "condition_number",
    "status",
];

/// Columns `results_summary.csv` is expected to carry.
pub const SUMMARY_COLUMNS: &[&str] = &["matrix_type", "solver", "sigma", "psnr_mean"];

/// Status value of a successful trial.
pub const STATUS_OK: &str = "ok";

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Numeric per-trial measurement in the detail table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Reconstruction quality in decibels.
    PsnrDb,
    /// Solver wall time in milliseconds.
    TimeMs,
    Mse,
    ConditionNumber,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::PsnrDb,
        Metric::TimeMs,
        Metric::Mse,
        Metric::ConditionNumber,
    ];

    /// Column name in the detail table.
    pub fn column(self) -> &'static str {
        match self {
            Self::PsnrDb => "psnr_db",
            Self::TimeMs => "time_ms",
            Self::Mse => "mse",
            Self::ConditionNumber => "condition_number",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.column() == s.trim())
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.column()).collect();
                format!("unknown metric '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Detail rows
// ---------------------------------------------------------------------------

/// One trial: a solver recovering one image at one noise level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub matrix_type: String,
    pub solver: String,
    pub sigma: String,
    pub repeat: String,
    pub image_idx: String,
    pub image_name: String,
    pub data_source: String,
    pub psnr_db: f64,
    pub time_ms: f64,
    pub mse: f64,
    pub condition_number: f64,
    pub status: String,
}

impl Default for DetailRow {
    fn default() -> Self {
        Self {
            matrix_type: String::new(),
            solver: String::new(),
            sigma: String::new(),
            repeat: String::new(),
            image_idx: String::new(),
            image_name: String::new(),
            data_source: String::new(),
            psnr_db: f64::NAN,
            time_ms: f64::NAN,
            mse: f64::NAN,
            condition_number: f64::NAN,
            status: String::new(),
        }
    }
}

/// Identity of a trial across solvers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub matrix_type: String,
    pub sigma: String,
    pub repeat: String,
    pub image_idx: String,
    pub data_source: String,
}

impl DetailRow {
    pub fn from_record(rec: &Record<'_>) -> Self {
        Self {
            matrix_type: rec.get("matrix_type").to_string(),
            solver: rec.get("solver").to_string(),
            sigma: rec.get("sigma").to_string(),
            repeat: rec.get("repeat").to_string(),
            image_idx: rec.get("image_idx").to_string(),
            image_name: rec.get("image_name").to_string(),
            data_source: rec.get("data_source").to_string(),
            psnr_db: rec.number("psnr_db"),
            time_ms: rec.number("time_ms"),
            mse: rec.number("mse"),
            condition_number: rec.number("condition_number"),
            status: rec.get("status").to_string(),
        }
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::PsnrDb => self.psnr_db,
            Metric::TimeMs => self.time_ms,
            Metric::Mse => self.mse,
            Metric::ConditionNumber => self.condition_number,
        }
    }

    /// Exact match on `"ok"`; any other status, including blank, is a failure.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Noise level as a number (NaN if the cell is not numeric).
    pub fn sigma_value(&self) -> f64 {
        parse_metric(&self.sigma)
    }

    pub fn key(&self) -> PairKey {
        PairKey {
            matrix_type: self.matrix_type.clone(),
            sigma: self.sigma.clone(),
            repeat: self.repeat.clone(),
            image_idx: self.image_idx.clone(),
            data_source: self.data_source.clone(),
        }
    }
}

impl Observation for DetailRow {
    type Key = PairKey;

    fn pair_key(&self) -> PairKey {
        self.key()
    }

    fn solver(&self) -> &str {
        &self.solver
    }
}

// ---------------------------------------------------------------------------
// Summary rows
// ---------------------------------------------------------------------------

/// Per-configuration aggregate produced by the experiment pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub matrix_type: String,
    pub solver: String,
    pub sigma: String,
    pub psnr_mean: f64,
}

impl SummaryRow {
    pub fn from_record(rec: &Record<'_>) -> Self {
        Self {
            matrix_type: rec.get("matrix_type").to_string(),
            solver: rec.get("solver").to_string(),
            sigma: rec.get("sigma").to_string(),
            psnr_mean: rec.number("psnr_mean"),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load `results_detail.csv`.
pub fn load_detail(path: &Path) -> std::io::Result<Vec<DetailRow>> {
    let table = read_required(path, DETAIL_COLUMNS)?;
    Ok(table
        .records()
        .map(|rec| DetailRow::from_record(&rec))
        .collect())
}

/// Load `results_summary.csv`.
pub fn load_summary(path: &Path) -> std::io::Result<Vec<SummaryRow>> {
    let table = read_required(path, SUMMARY_COLUMNS)?;
    Ok(table
        .records()
        .map(|rec| SummaryRow::from_record(&rec))
        .collect())
}

fn read_required(path: &Path, columns: &[&str]) -> std::io::Result<Table> {
    if !path.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("missing input file {}", path.display()),
        ));
    }
    let table = Table::read(path)?;
    let missing = table.missing_columns(columns);
    if !missing.is_empty() {
        log::warn!(
            "{}: missing column(s) {}; their values are treated as unusable",
            path.display(),
            missing.join(", ")
        );
    }
    log::debug!("{}: {} rows", path.display(), table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = "\
matrix_type,solver,sigma,repeat,image_idx,image_name,data_source,psnr_db,time_ms,mse,condition_number,status
dense,np_solve,0.01,0,3,lena,synthetic,31.5,2.0,0.0007,120.5,ok
dense,lu,0.01,0,3,lena,synthetic,bad,,0.0009,120.5,singular
";

    #[test]
    fn test_metric_names_roundtrip() {
        for m in Metric::ALL {
            assert_eq!(m.column().parse::<Metric>().unwrap(), m);
            assert_eq!(m.to_string(), m.column());
        }
        assert!("psnr".parse::<Metric>().is_err());
        assert_eq!(" time_ms ".parse::<Metric>().unwrap(), Metric::TimeMs);
    }

    #[test]
    fn test_detail_row_parsing() {
        let table = Table::parse(DETAIL);
        let rows: Vec<DetailRow> = table
            .records()
            .map(|r| DetailRow::from_record(&r))
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].solver, "np_solve");
        assert_eq!(rows[0].sigma, "0.01");
        assert_eq!(rows[0].psnr_db, 31.5);
        assert_eq!(rows[0].metric(Metric::ConditionNumber), 120.5);
        assert!(rows[0].is_ok());

        assert!(rows[1].psnr_db.is_nan());
        assert!(rows[1].time_ms.is_nan());
        assert!(!rows[1].is_ok());
        assert_eq!(rows[0].key(), rows[1].key());
    }

    #[test]
    fn test_default_row_is_unusable() {
        let row = DetailRow::default();
        for m in Metric::ALL {
            assert!(row.metric(m).is_nan());
        }
        assert!(!row.is_ok());
    }

    #[test]
    fn test_sigma_value() {
        let row = DetailRow {
            sigma: "0.05".into(),
            ..Default::default()
        };
        assert_eq!(row.sigma_value(), 0.05);
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_detail(&tmp.path().join("results_detail.csv")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_load_summary_tolerates_missing_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("results_summary.csv");
        std::fs::write(&path, "matrix_type,solver\ndense,lu\n").unwrap();
        let rows = load_summary(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sigma, "");
        assert!(rows[0].psnr_mean.is_nan());
    }
}
