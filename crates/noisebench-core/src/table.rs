//! CSV boundary: header-indexed reading and plain table writing.
//!
//! Reading is lenient. A missing column reads as an empty string and a value
//! that does not parse as a number reads as NaN, so one malformed cell never
//! aborts a run. Writing skips empty tables entirely.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// An in-memory CSV table with a header row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    header: Vec<String>,
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

/// One data row, addressed by column name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a HashMap<String, usize>,
    fields: &'a [String],
}

impl Table {
    /// Read and parse a CSV file. Fails only on I/O errors.
    pub fn read(path: &Path) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Parse CSV text. The first non-blank line is the header.
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = split_records(text).into_iter();
        let header = match lines.next() {
            Some(h) => h,
            None => return Self::default(),
        };
        let mut columns = HashMap::with_capacity(header.len());
        for (i, name) in header.iter().enumerate() {
            // First occurrence of a duplicated column name wins.
            columns.entry(name.clone()).or_insert(i);
        }
        Self {
            header,
            columns,
            rows: lines.collect(),
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names from `required` that the header lacks.
    pub fn missing_columns<'n>(&self, required: &[&'n str]) -> Vec<&'n str> {
        required
            .iter()
            .copied()
            .filter(|c| !self.has_column(c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|fields| Record {
            columns: &self.columns,
            fields,
        })
    }
}

impl<'a> Record<'a> {
    /// Raw text of a field; empty when the column or the cell is absent.
    pub fn get(&self, name: &str) -> &'a str {
        self.columns
            .get(name)
            .and_then(|&i| self.fields.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Numeric value of a field; NaN when absent or unparsable.
    pub fn number(&self, name: &str) -> f64 {
        parse_metric(self.get(name))
    }
}

/// Parse a numeric cell. Surrounding whitespace is ignored; anything that is
/// not a float (including an empty cell) becomes NaN.
pub fn parse_metric(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Split CSV text into records of fields.
///
/// Handles double-quoted fields with `""` escapes and embedded separators or
/// newlines, and CRLF line endings. Blank lines are skipped.
fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }
    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].is_empty();
    if !blank {
        records.push(record);
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// A row type that can be written as one CSV line.
pub trait CsvRow {
    fn header() -> &'static [&'static str];
    fn fields(&self) -> Vec<String>;
}

/// Write `rows` to `path` with a header line.
///
/// Returns `Ok(false)` without touching the filesystem when `rows` is empty.
pub fn write_rows<T: CsvRow>(path: &Path, rows: &[T]) -> io::Result<bool> {
    if rows.is_empty() {
        return Ok(false);
    }
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{}", join_fields(T::header().iter().copied()))?;
    for row in rows {
        let fields = row.fields();
        writeln!(w, "{}", join_fields(fields.iter().map(String::as_str)))?;
    }
    w.flush()?;
    Ok(true)
}

fn join_fields<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    fields.map(quote_field).collect::<Vec<_>>().join(",")
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Format a float cell: `nan`, `inf`, `-inf`, otherwise the shortest
/// round-trip representation with a decimal point (`30.0`, `0.25`).
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        let s = if v > 0.0 { "inf" } else { "-inf" };
        s.to_string()
    } else {
        format!("{v:?}")
    }
}
