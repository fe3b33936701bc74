//! CSV loading with automatic type inference.
//!
//! This is the loader that hands tables to the cleaning and analysis layers.
//! Column types are inferred from content with the priority
//! Numeric → Boolean → Categorical → Text. Dates are left as text; use
//! [`Cleaner::convert_dtypes`](crate::cleaner::Cleaner::convert_dtypes) to
//! turn them into a temporal column.
//!
//! - RFC 4180 quoting (quoted fields, escaped quotes, delimiters and newlines in fields)
//! - Null markers: empty, `NA`, `N/A`, `null`, `NULL`, `None`, `NaN`, `.` and friends
//! - Low-cardinality strings are dictionary-encoded as Categorical
//!
//! ```
//! use u_tidy::csv_parser::CsvParser;
//! use u_tidy::dataframe::DataType;
//!
//! let csv = "name,value,active\nAlice,1.5,true\nBob,NA,false\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//! assert_eq!(df.row_count(), 2);
//! assert_eq!(df.column(1).unwrap().data_type(), DataType::Numeric);
//! assert_eq!(df.column(1).unwrap().null_count(), 1);
//! ```

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::dataframe::{Column, DataFrame, DataType, ValidityBitmap};
use crate::error::{Result, TidyError};

const DEFAULT_NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "na", "n/a", "null", "NULL", "None", "none", ".", "NaN", "nan", "NAN",
    "#N/A", "#NA",
];

/// Maximum unique-value ratio for a string column to be Categorical.
const CATEGORICAL_THRESHOLD: f64 = 0.5;

/// Maximum dictionary size for categorical columns.
const MAX_CATEGORICAL_UNIQUE: usize = 1000;

/// CSV parser configuration and entry point.
#[derive(Debug, Clone)]
pub struct CsvParser {
    delimiter: u8,
    has_header: bool,
    null_markers: Vec<String>,
}

impl CsvParser {
    /// Comma delimiter, header row, standard null markers.
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn delimiter(mut self, delim: u8) -> Self {
        self.delimiter = delim;
        self
    }

    pub fn has_header(mut self, header: bool) -> Self {
        self.has_header = header;
        self
    }

    /// Replaces the default null markers.
    pub fn null_markers(mut self, markers: Vec<String>) -> Self {
        self.null_markers = markers;
        self
    }

    /// Parses CSV text into a DataFrame.
    pub fn parse_str(&self, input: &str) -> Result<DataFrame> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        let rows = self.tokenize(input);

        let (headers, data_rows): (Vec<String>, &[Vec<String>]) = match rows.split_first() {
            None => return Ok(DataFrame::new()),
            Some((first, rest)) if self.has_header => (first.clone(), rest),
            Some((first, _)) => (
                (0..first.len()).map(|i| format!("col_{i}")).collect(),
                &rows[..],
            ),
        };
        if data_rows.is_empty() {
            return Ok(DataFrame::new());
        }

        let n_cols = headers.len();
        let mut raw_columns: Vec<Vec<&str>> = vec![Vec::with_capacity(data_rows.len()); n_cols];
        for (row_idx, row) in data_rows.iter().enumerate() {
            if row.len() != n_cols {
                let line = row_idx + if self.has_header { 2 } else { 1 };
                return Err(TidyError::CsvParse {
                    line,
                    message: format!("expected {n_cols} fields, got {}", row.len()),
                });
            }
            for (col_idx, field) in row.iter().enumerate() {
                raw_columns[col_idx].push(field.trim());
            }
        }

        let mut df = DataFrame::new();
        for (name, raw) in headers.into_iter().zip(raw_columns) {
            let column = self.build_column(&raw);
            debug!(column = %name, data_type = %column.data_type(), "inferred column type");
            df.add_column(name, column)?;
        }
        Ok(df)
    }

    /// Reads and parses a CSV file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading CSV file");
        let content = std::fs::read_to_string(path)?;
        let df = self.parse_str(&content)?;
        info!(
            rows = df.row_count(),
            columns = df.column_count(),
            "loaded CSV file"
        );
        Ok(df)
    }

    // ── Internal parsing ─────────────────────────────────────────

    /// Splits CSV text into rows of raw fields.
    fn tokenize(&self, input: &str) -> Vec<Vec<String>> {
        let delim = self.delimiter as char;
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut row: Vec<String> = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();

        let end_row = |row: &mut Vec<String>, rows: &mut Vec<Vec<String>>| {
            // Blank lines before the first record are skipped.
            if row.iter().any(|f| !f.is_empty()) || !rows.is_empty() {
                rows.push(std::mem::take(row));
            } else {
                row.clear();
            }
        };

        while let Some(c) = chars.next() {
            if in_quotes {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    field.push(c);
                }
                continue;
            }
            match c {
                '"' if field.is_empty() => in_quotes = true,
                c if c == delim => row.push(std::mem::take(&mut field)),
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' | '\r' => {
                    row.push(std::mem::take(&mut field));
                    end_row(&mut row, &mut rows);
                }
                c => field.push(c),
            }
        }

        if !field.is_empty() || !row.is_empty() {
            row.push(field);
            rows.push(row);
        }
        while rows.last().is_some_and(|r| r.iter().all(|f| f.is_empty())) {
            rows.pop();
        }
        rows
    }

    fn is_null(&self, value: &str) -> bool {
        self.null_markers.iter().any(|m| m == value)
    }

    /// Infers the column type and builds a typed Column.
    fn build_column(&self, raw: &[&str]) -> Column {
        let present: Vec<Option<&str>> = raw
            .iter()
            .map(|&v| if self.is_null(v) { None } else { Some(v) })
            .collect();

        match infer_type(&present) {
            DataType::Numeric => Column::numeric_opt(
                present
                    .iter()
                    .map(|v| v.and_then(|s| s.parse::<f64>().ok()))
                    .collect(),
            ),
            DataType::Boolean => {
                Column::boolean_opt(present.iter().map(|v| v.map(parse_boolean_str)).collect())
            }
            DataType::Categorical => Column::categorical_opt(present),
            _ => {
                let validity: ValidityBitmap = present.iter().map(Option::is_some).collect();
                let values = present
                    .iter()
                    .map(|v| v.unwrap_or_default().to_string())
                    .collect();
                Column::text(values, validity)
            }
        }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helper functions ──────────────────────────────────────────────────

/// Determines the most specific type that fits all present values.
/// An all-missing column defaults to numeric.
fn infer_type(present: &[Option<&str>]) -> DataType {
    let values: Vec<&str> = present.iter().flatten().copied().collect();
    if values.iter().all(|s| s.parse::<f64>().is_ok()) {
        return DataType::Numeric;
    }
    if values.iter().all(|s| is_boolean_str(s)) {
        return DataType::Boolean;
    }
    let unique: HashSet<&str> = values.iter().copied().collect();
    let ratio = unique.len() as f64 / values.len() as f64;
    if ratio < CATEGORICAL_THRESHOLD && unique.len() <= MAX_CATEGORICAL_UNIQUE {
        DataType::Categorical
    } else {
        DataType::Text
    }
}

fn is_boolean_str(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "t" | "f" | "y" | "n"
    )
}

fn parse_boolean_str(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "yes" | "t" | "y")
}

// ── Tests ─────────────────────────────────────────────────────────────
