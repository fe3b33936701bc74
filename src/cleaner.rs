//! Data cleaning: missing values, duplicates, type coercion and outliers.
//!
//! A [`Cleaner`] owns a private copy of its input table. Each operation
//! replaces that copy with its result, so operations chain naturally:
//!
//! ```
//! use u_tidy::cleaner::{Cleaner, KeepPolicy, MissingStrategy};
//! use u_tidy::dataframe::{Column, DataFrame};
//!
//! let df = DataFrame::from_columns(vec![
//!     ("id", Column::numeric_opt(vec![Some(1.0), Some(2.0), Some(2.0), Some(4.0)])),
//!     ("score", Column::numeric_opt(vec![Some(10.0), None, None, Some(40.0)])),
//! ])
//! .unwrap();
//!
//! let mut cleaner = Cleaner::new(&df);
//! cleaner.remove_duplicates(None, KeepPolicy::First).unwrap();
//! let cleaned = cleaner
//!     .handle_missing_values(MissingStrategy::Mean, None, None)
//!     .unwrap();
//!
//! assert_eq!(cleaned.row_count(), 3);
//! assert_eq!(cleaned.total_null_count(), 0);
//! assert_eq!(cleaned.column_by_name("score").unwrap().f64_at(1), Some(25.0));
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyzer;
use crate::dataframe::{Column, DataFrame, ValidityBitmap, Value};
use crate::error::{Result, TidyError};
use crate::outlier::{outlier_mask, OutlierMethod};

// ── Configuration ─────────────────────────────────────────────────────

/// How [`Cleaner::handle_missing_values`] treats missing cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MissingStrategy {
    /// Remove rows with a missing value in any targeted column.
    #[default]
    Drop,
    /// Replace missing cells with a caller-supplied literal.
    Fill,
    /// Propagate the last preceding value forward.
    ForwardFill,
    /// Propagate the next following value backward.
    BackwardFill,
    /// Replace with the column mean (numeric columns only).
    Mean,
    /// Replace with the column median (numeric columns only).
    Median,
}

impl FromStr for MissingStrategy {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "fill" => Ok(Self::Fill),
            "ffill" | "forward_fill" => Ok(Self::ForwardFill),
            "bfill" | "backward_fill" => Ok(Self::BackwardFill),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            other => Err(TidyError::config(format!(
                "invalid strategy '{other}', choose from drop, fill, ffill, bfill, mean, median"
            ))),
        }
    }
}

impl fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Drop => "drop",
            Self::Fill => "fill",
            Self::ForwardFill => "ffill",
            Self::BackwardFill => "bfill",
            Self::Mean => "mean",
            Self::Median => "median",
        };
        f.write_str(name)
    }
}

/// Which member of a duplicate set survives [`Cleaner::remove_duplicates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum KeepPolicy {
    #[default]
    First,
    Last,
    /// Drop every row that has a duplicate.
    None,
}

impl FromStr for KeepPolicy {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "none" | "false" => Ok(Self::None),
            other => Err(TidyError::config(format!(
                "invalid keep policy '{other}', choose 'first', 'last' or 'none'"
            ))),
        }
    }
}

impl fmt::Display for KeepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::First => "first",
            Self::Last => "last",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Target type for [`Cleaner::convert_dtypes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetType {
    /// Whole numbers, stored in a numeric column. Cannot hold missing cells.
    Integer,
    Float,
    Temporal,
}

impl FromStr for TargetType {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "int64" | "integer" => Ok(Self::Integer),
            "float" | "float64" => Ok(Self::Float),
            "datetime" | "datetime64" | "datetime64[ns]" | "temporal" => Ok(Self::Temporal),
            other => Err(TidyError::config(format!("unsupported target type '{other}'"))),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "int64",
            Self::Float => "float64",
            Self::Temporal => "datetime64",
        };
        f.write_str(name)
    }
}

/// A column that [`Cleaner::convert_dtypes`] left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionWarning {
    pub column: String,
    pub target: TargetType,
    pub reason: String,
}

// ── Cleaner ───────────────────────────────────────────────────────────

/// Applies cleaning operations to a private copy of a table.
#[derive(Debug, Clone)]
pub struct Cleaner {
    data: DataFrame,
    warnings: Vec<ConversionWarning>,
}

impl Cleaner {
    /// Copies `df`; later operations never touch the caller's table.
    pub fn new(df: &DataFrame) -> Self {
        info!(
            rows = df.row_count(),
            columns = df.column_count(),
            "cleaner initialized"
        );
        Self {
            data: df.clone(),
            warnings: Vec::new(),
        }
    }

    /// The current state of the table.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Consumes the cleaner and returns the cleaned table.
    pub fn into_data(self) -> DataFrame {
        self.data
    }

    /// Columns skipped by the most recent [`convert_dtypes`](Self::convert_dtypes) call.
    pub fn conversion_warnings(&self) -> &[ConversionWarning] {
        &self.warnings
    }

    /// Treats missing cells in `columns` (default: all) with `strategy`.
    ///
    /// Mean and median skip non-numeric columns. Forward and backward fill
    /// leave leading and trailing gaps missing.
    ///
    /// # Errors
    ///
    /// - [`TidyError::ColumnNotFound`] for an unknown column
    /// - [`TidyError::InvalidConfiguration`] for [`MissingStrategy::Fill`]
    ///   without a `fill_value`
    pub fn handle_missing_values(
        &mut self,
        strategy: MissingStrategy,
        columns: Option<&[&str]>,
        fill_value: Option<&Value>,
    ) -> Result<&DataFrame> {
        let targets = self.target_columns(columns)?;
        let initial = self.null_count(&targets);
        info!(missing = initial, %strategy, "handling missing values");

        let mut df = self.data.clone();
        match strategy {
            MissingStrategy::Drop => {
                let cols: Vec<&Column> = targets.iter().filter_map(|&c| df.column(c)).collect();
                let keep: Vec<bool> = (0..df.row_count())
                    .map(|row| cols.iter().all(|col| col.is_valid(row)))
                    .collect();
                df = df.filter_rows(&keep);
            }
            MissingStrategy::Fill => {
                let fill = fill_value.ok_or_else(|| {
                    TidyError::config("fill_value must be provided when strategy is 'fill'")
                })?;
                for &c in &targets {
                    if let Some(filled) = df.column(c).map(|col| col.filled(fill)) {
                        df.replace_column(c, filled)?;
                    }
                }
            }
            MissingStrategy::ForwardFill | MissingStrategy::BackwardFill => {
                let forward = strategy == MissingStrategy::ForwardFill;
                for &c in &targets {
                    let filled = df
                        .column(c)
                        .map(|col| col.gather(&propagation_sources(col.validity(), forward)));
                    if let Some(filled) = filled {
                        df.replace_column(c, filled)?;
                    }
                }
            }
            MissingStrategy::Mean | MissingStrategy::Median => {
                for &c in &targets {
                    let Some(col) = df.column(c) else { continue };
                    let name = df.column_names()[c].clone();
                    let Some(mut valid) = col.valid_numeric_values() else {
                        debug!(column = %name, %strategy, "skipping non-numeric column");
                        continue;
                    };
                    valid.retain(|v| !v.is_nan());
                    let center = if strategy == MissingStrategy::Mean {
                        analyzer::mean(&valid)
                    } else {
                        u_numflow::stats::median(&valid)
                    };
                    match center.filter(|v| !v.is_nan()) {
                        Some(v) => {
                            let filled = col.filled(&Value::Number(v));
                            df.replace_column(c, filled)?;
                        }
                        None => {
                            debug!(column = %name, %strategy, "no fill value could be computed")
                        }
                    }
                }
            }
        }

        self.data = df;
        info!(missing = self.null_count(&targets), "missing values after treatment");
        Ok(&self.data)
    }

    /// Removes repeated rows, comparing `subset` columns (default: all).
    ///
    /// Two missing cells compare equal. Survivors keep their relative order.
    pub fn remove_duplicates(
        &mut self,
        subset: Option<&[&str]>,
        keep: KeepPolicy,
    ) -> Result<&DataFrame> {
        let targets = self.target_columns(subset)?;
        let n = self.data.row_count();
        let keys: Vec<Vec<Option<Value>>> = (0..n)
            .map(|row| {
                targets
                    .iter()
                    .map(|&c| self.data.column(c).and_then(|col| col.value_at(row)))
                    .collect()
            })
            .collect();

        let mask: Vec<bool> = match keep {
            KeepPolicy::First => {
                let mut seen = HashSet::with_capacity(n);
                keys.iter().map(|k| seen.insert(k)).collect()
            }
            KeepPolicy::Last => {
                let mut seen = HashSet::with_capacity(n);
                let mut mask: Vec<bool> = keys.iter().rev().map(|k| seen.insert(k)).collect();
                mask.reverse();
                mask
            }
            KeepPolicy::None => {
                let mut counts: HashMap<&Vec<Option<Value>>, usize> = HashMap::with_capacity(n);
                for k in &keys {
                    *counts.entry(k).or_insert(0) += 1;
                }
                keys.iter().map(|k| counts[k] == 1).collect()
            }
        };

        self.data = self.data.filter_rows(&mask);
        info!(removed = n - self.data.row_count(), %keep, "removed duplicate rows");
        Ok(&self.data)
    }

    /// Converts columns to the requested types, in mapping order.
    ///
    /// Every column is looked up before anything is converted. A column whose
    /// values cannot be coerced is left unchanged and reported through
    /// [`conversion_warnings`](Self::conversion_warnings).
    ///
    /// ```
    /// use u_tidy::cleaner::{Cleaner, TargetType};
    /// use u_tidy::dataframe::{Column, DataFrame, DataType};
    ///
    /// let df = DataFrame::from_columns(vec![
    ///     ("when", Column::text_opt(vec![Some("2023-01-01"), Some("2023-01-02")])),
    ///     ("code", Column::text_opt(vec![Some("7"), Some("x")])),
    /// ])
    /// .unwrap();
    ///
    /// let mut cleaner = Cleaner::new(&df);
    /// cleaner
    ///     .convert_dtypes(&[("when", TargetType::Temporal), ("code", TargetType::Integer)])
    ///     .unwrap();
    ///
    /// assert_eq!(cleaner.data().column_by_name("when").unwrap().data_type(), DataType::Temporal);
    /// assert_eq!(cleaner.data().column_by_name("code").unwrap().data_type(), DataType::Text);
    /// assert_eq!(cleaner.conversion_warnings().len(), 1);
    /// ```
    pub fn convert_dtypes(&mut self, mapping: &[(&str, TargetType)]) -> Result<&DataFrame> {
        let names: Vec<&str> = mapping.iter().map(|(name, _)| *name).collect();
        let indices = self.data.resolve_columns(&names)?;

        self.warnings.clear();
        for (&(name, target), &idx) in mapping.iter().zip(&indices) {
            let Some(col) = self.data.column(idx) else { continue };
            match convert_column(col, target) {
                Ok(converted) => {
                    self.data.replace_column(idx, converted)?;
                    info!(column = name, %target, "converted column");
                }
                Err(reason) => {
                    warn!(column = name, %target, %reason, "failed to convert column");
                    self.warnings.push(ConversionWarning {
                        column: name.to_string(),
                        target,
                        reason,
                    });
                }
            }
        }
        Ok(&self.data)
    }

    /// Flags outlier rows of a numeric column. Does not modify the table.
    pub fn detect_outliers(
        &self,
        column: &str,
        method: OutlierMethod,
        threshold: f64,
    ) -> Result<Vec<bool>> {
        let mask = outlier_mask(&self.data, column, method, threshold)?;
        info!(
            column,
            %method,
            outliers = mask.iter().filter(|&&m| m).count(),
            "detected outliers"
        );
        Ok(mask)
    }

    /// Removes the rows [`detect_outliers`](Self::detect_outliers) flags.
    pub fn remove_outliers(
        &mut self,
        column: &str,
        method: OutlierMethod,
        threshold: f64,
    ) -> Result<&DataFrame> {
        let mask = self.detect_outliers(column, method, threshold)?;
        let before = self.data.row_count();
        let keep: Vec<bool> = mask.iter().map(|&m| !m).collect();
        self.data = self.data.filter_rows(&keep);
        info!(removed = before - self.data.row_count(), "removed outlier rows");
        Ok(&self.data)
    }

    fn target_columns(&self, columns: Option<&[&str]>) -> Result<Vec<usize>> {
        match columns {
            Some(names) => self.data.resolve_columns(names),
            None => Ok((0..self.data.column_count()).collect()),
        }
    }

    fn null_count(&self, targets: &[usize]) -> usize {
        targets
            .iter()
            .filter_map(|&c| self.data.column(c))
            .map(Column::null_count)
            .sum()
    }
}

/// For each row, the nearest valid row in fill direction (itself if valid).
fn propagation_sources(validity: &ValidityBitmap, forward: bool) -> Vec<Option<usize>> {
    let n = validity.len();
    let mut sources = vec![None; n];
    let mut last = None;
    let order: Box<dyn Iterator<Item = usize>> = if forward {
        Box::new(0..n)
    } else {
        Box::new((0..n).rev())
    };
    for i in order {
        if validity.is_valid(i) {
            last = Some(i);
        }
        sources[i] = last;
    }
    sources
}

// ── Type conversion ───────────────────────────────────────────────────

fn convert_column(col: &Column, target: TargetType) -> std::result::Result<Column, String> {
    match target {
        TargetType::Integer => to_integer(col),
        TargetType::Float => to_float(col),
        TargetType::Temporal => to_temporal(col),
    }
}

fn to_integer(col: &Column) -> std::result::Result<Column, String> {
    if col.null_count() > 0 {
        return Err(format!(
            "{} missing values cannot be represented as integers",
            col.null_count()
        ));
    }
    let values = (0..col.len())
        .map(|i| match col.value_at(i) {
            Some(Value::Number(v)) if v.is_finite() => Ok(v.trunc()),
            Some(Value::Number(v)) => Err(format!("cannot convert {v} to integer")),
            Some(Value::Bool(b)) => Ok(if b { 1.0 } else { 0.0 }),
            Some(Value::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map(|v| v as f64)
                .map_err(|_| format!("invalid integer literal '{s}'")),
            Some(Value::Timestamp(_)) => Err("cannot convert timestamps to integer".to_string()),
            None => Err("missing value".to_string()),
        })
        .collect::<std::result::Result<Vec<f64>, String>>()?;
    let n = values.len();
    Ok(Column::numeric(values, ValidityBitmap::all_valid(n)))
}

fn to_float(col: &Column) -> std::result::Result<Column, String> {
    if let Column::Numeric { .. } = col {
        return Ok(col.clone());
    }
    let values = (0..col.len())
        .map(|i| match col.value_at(i) {
            None => Ok(None),
            Some(Value::Number(v)) => Ok(Some(v)),
            Some(Value::Bool(b)) => Ok(Some(if b { 1.0 } else { 0.0 })),
            Some(Value::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("could not convert string to float: '{s}'")),
            Some(Value::Timestamp(_)) => Err("cannot convert timestamps to float".to_string()),
        })
        .collect::<std::result::Result<Vec<Option<f64>>, String>>()?;
    Ok(Column::numeric_opt(values))
}

fn to_temporal(col: &Column) -> std::result::Result<Column, String> {
    match col {
        Column::Temporal { .. } => return Ok(col.clone()),
        Column::Numeric { .. } | Column::Boolean { .. } => {
            return Err(format!("cannot parse {} values as timestamps", col.data_type()));
        }
        Column::Text { .. } | Column::Categorical { .. } => {}
    }
    let values = (0..col.len())
        .map(|i| match col.str_at(i) {
            None => Ok(None),
            Some(s) => parse_timestamp(s)
                .map(Some)
                .ok_or_else(|| format!("unrecognized timestamp '{s}'")),
        })
        .collect::<std::result::Result<Vec<Option<NaiveDateTime>>, String>>()?;
    Ok(Column::temporal_opt(values))
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];

/// Parses the timestamp layouts [`Cleaner::convert_dtypes`] accepts.
///
/// RFC 3339 inputs are normalized to UTC; date-only inputs map to midnight.
///
/// ```
/// use u_tidy::cleaner::parse_timestamp;
///
/// let t = parse_timestamp("2023-01-02").unwrap();
/// assert_eq!(t.to_string(), "2023-01-02 00:00:00");
/// assert!(parse_timestamp("2023-01-02T10:00:00+02:00").is_some());
/// assert!(parse_timestamp("soon").is_none());
/// ```
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::CsvParser;
    use crate::dataframe::DataType;

    /// Seven employees with a duplicate row, gaps and an age outlier.
    fn sample_with_issues() -> DataFrame {
        DataFrame::from_columns(vec![
            (
                "id",
                Column::numeric_opt(
                    [1.0, 2.0, 2.0, 4.0, 5.0, 6.0, 7.0].into_iter().map(Some).collect(),
                ),
            ),
            (
                "name",
                Column::text_opt(vec![
                    Some("Alice"),
                    Some("Bob"),
                    Some("Bob"),
                    Some("David"),
                    None,
                    Some("Frank"),
                    Some("Grace"),
                ]),
            ),
            (
                "age",
                Column::numeric_opt(vec![
                    Some(25.0),
                    Some(30.0),
                    Some(30.0),
                    None,
                    Some(45.0),
                    Some(28.0),
                    Some(150.0),
                ]),
            ),
            (
                "salary",
                Column::numeric_opt(vec![
                    Some(50000.0),
                    Some(60000.0),
                    Some(60000.0),
                    Some(80000.0),
                    Some(90000.0),
                    None,
                    Some(55000.0),
                ]),
            ),
            (
                "department",
                Column::categorical_opt(vec![
                    Some("HR"),
                    Some("IT"),
                    Some("IT"),
                    Some("Finance"),
                    Some("IT"),
                    Some("HR"),
                    Some("HR"),
                ]),
            ),
        ])
        .unwrap()
    }

    fn col<'a>(df: &'a DataFrame, name: &str) -> &'a Column {
        df.column_by_name(name).unwrap()
    }

    // ── Construction ──

    #[test]
    fn new_copies_input() {
        let df = sample_with_issues();
        let mut cleaner = Cleaner::new(&df);
        cleaner
            .handle_missing_values(MissingStrategy::Drop, None, None)
            .unwrap();
        assert_eq!(df.row_count(), 7);
        assert_eq!(cleaner.data().row_count(), 4);
    }

    #[test]
    fn config_parsing() {
        assert_eq!("ffill".parse::<MissingStrategy>().unwrap(), MissingStrategy::ForwardFill);
        assert_eq!(
            "backward_fill".parse::<MissingStrategy>().unwrap(),
            MissingStrategy::BackwardFill
        );
        assert!(matches!(
            "invalid".parse::<MissingStrategy>(),
            Err(TidyError::InvalidConfiguration(_))
        ));
        assert_eq!("false".parse::<KeepPolicy>().unwrap(), KeepPolicy::None);
        assert_eq!("datetime64[ns]".parse::<TargetType>().unwrap(), TargetType::Temporal);
        assert_eq!("int64".parse::<TargetType>().unwrap(), TargetType::Integer);
        assert!("complex128".parse::<TargetType>().is_err());
        assert_eq!(MissingStrategy::default(), MissingStrategy::Drop);
        assert_eq!(KeepPolicy::default(), KeepPolicy::First);
    }

    // ── Missing values ──

    #[test]
    fn drop_removes_incomplete_rows() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        let out = cleaner
            .handle_missing_values(MissingStrategy::Drop, None, None)
            .unwrap();
        assert_eq!(out.total_null_count(), 0);
        assert_eq!(out.row_count(), 4);
        let ids: Vec<f64> = col(out, "id").valid_numeric_values().unwrap();
        assert_eq!(ids, vec![1.0, 2.0, 2.0, 7.0]);
    }

    #[test]
    fn drop_restricted_to_columns() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        let out = cleaner
            .handle_missing_values(MissingStrategy::Drop, Some(&["age"]), None)
            .unwrap();
        assert_eq!(out.row_count(), 6);
        assert_eq!(col(out, "name").null_count(), 1);
    }

    #[test]
    fn fill_with_literal() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        let out = cleaner
            .handle_missing_values(MissingStrategy::Fill, None, Some(&Value::from(0)))
            .unwrap();
        assert_eq!(out.total_null_count(), 0);
        assert_eq!(col(out, "age").f64_at(3), Some(0.0));
        assert_eq!(col(out, "name").str_at(4), Some("0"));
        assert_eq!(col(out, "name").data_type(), DataType::Text);
    }

    #[test]
    fn fill_text_into_numeric_widens() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        let out = cleaner
            .handle_missing_values(
                MissingStrategy::Fill,
                Some(&["age"]),
                Some(&Value::from("unknown")),
            )
            .unwrap();
        assert_eq!(col(out, "age").data_type(), DataType::Text);
        assert_eq!(col(out, "age").str_at(3), Some("unknown"));
    }

    #[test]
    fn fill_requires_value() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        let err = cleaner
            .handle_missing_values(MissingStrategy::Fill, None, None)
            .unwrap_err();
        assert!(matches!(err, TidyError::InvalidConfiguration(_)));
    }

    #[test]
    fn forward_and_backward_fill() {
        let df = DataFrame::from_columns(vec![(
            "v",
            Column::numeric_opt(vec![None, Some(1.0), None, None, Some(4.0), None]),
        )])
        .unwrap();

        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .handle_missing_values(MissingStrategy::ForwardFill, None, None)
            .unwrap();
        let v = col(out, "v");
        let got: Vec<Option<f64>> = (0..6).map(|i| v.f64_at(i)).collect();
        assert_eq!(got, vec![None, Some(1.0), Some(1.0), Some(1.0), Some(4.0), Some(4.0)]);

        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .handle_missing_values(MissingStrategy::BackwardFill, None, None)
            .unwrap();
        let v = col(out, "v");
        let got: Vec<Option<f64>> = (0..6).map(|i| v.f64_at(i)).collect();
        assert_eq!(got, vec![Some(1.0), Some(1.0), Some(4.0), Some(4.0), Some(4.0), None]);
    }

    #[test]
    fn ffill_never_increases_missing() {
        let df = sample_with_issues();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .handle_missing_values(MissingStrategy::ForwardFill, None, None)
            .unwrap();
        assert!(out.total_null_count() <= df.total_null_count());
        assert_eq!(col(out, "name").str_at(4), Some("David"));
    }

    #[test]
    fn mean_and_median_fill_numeric_only() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        let out = cleaner
            .handle_missing_values(MissingStrategy::Mean, None, None)
            .unwrap();
        let mean_age = (25.0 + 30.0 + 30.0 + 45.0 + 28.0 + 150.0) / 6.0;
        assert!((col(out, "age").f64_at(3).unwrap() - mean_age).abs() < 1e-9);
        assert_eq!(col(out, "salary").null_count(), 0);
        // text column untouched
        assert_eq!(col(out, "name").null_count(), 1);

        let mut cleaner = Cleaner::new(&sample_with_issues());
        let out = cleaner
            .handle_missing_values(MissingStrategy::Median, None, None)
            .unwrap();
        assert_eq!(col(out, "age").f64_at(3), Some(30.0));
        assert_eq!(col(out, "salary").f64_at(5), Some(60000.0));
    }

    #[test]
    fn mean_of_all_missing_column_stays_missing() {
        let df =
            DataFrame::from_columns(vec![("v", Column::numeric_opt(vec![None, None]))]).unwrap();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .handle_missing_values(MissingStrategy::Mean, None, None)
            .unwrap();
        assert_eq!(out.total_null_count(), 2);
    }

    #[test]
    fn mean_fill_with_infinite_values() {
        let df = CsvParser::new().parse_str("v\n1\ninf\n\n3\nNA\n").unwrap();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .handle_missing_values(MissingStrategy::Mean, None, None)
            .unwrap();
        assert_eq!(out.total_null_count(), 0);
        assert_eq!(col(out, "v").f64_at(2), Some(f64::INFINITY));
        assert_eq!(col(out, "v").f64_at(4), Some(f64::INFINITY));

        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .handle_missing_values(MissingStrategy::Median, None, None)
            .unwrap();
        assert_eq!(col(out, "v").f64_at(2), Some(3.0));

        // opposite infinities have no mean
        let df = DataFrame::from_columns(vec![(
            "v",
            Column::numeric_opt(vec![Some(f64::INFINITY), None, Some(f64::NEG_INFINITY)]),
        )])
        .unwrap();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .handle_missing_values(MissingStrategy::Mean, None, None)
            .unwrap();
        assert_eq!(out.total_null_count(), 1);
    }

    #[test]
    fn mean_fill_ignores_nan_cells() {
        let df = DataFrame::from_columns(vec![(
            "v",
            Column::numeric_opt(vec![Some(1.0), Some(f64::NAN), None, Some(3.0)]),
        )])
        .unwrap();
        for strategy in [MissingStrategy::Mean, MissingStrategy::Median] {
            let mut cleaner = Cleaner::new(&df);
            let out = cleaner.handle_missing_values(strategy, None, None).unwrap();
            assert_eq!(col(out, "v").f64_at(2), Some(2.0));
        }
    }

    #[test]
    fn unknown_column_is_not_found() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        assert!(matches!(
            cleaner.handle_missing_values(MissingStrategy::Drop, Some(&["nope"]), None),
            Err(TidyError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            cleaner.remove_duplicates(Some(&["nope"]), KeepPolicy::First),
            Err(TidyError::ColumnNotFound { .. })
        ));
    }

    // ── Duplicates ──

    #[test]
    fn remove_duplicates_all_columns() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        let out = cleaner.remove_duplicates(None, KeepPolicy::First).unwrap();
        assert_eq!(out.row_count(), 6);
        let ids = col(out, "id").valid_numeric_values().unwrap();
        assert_eq!(ids, vec![1.0, 2.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn remove_duplicates_subset_and_policies() {
        let df = sample_with_issues();

        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .remove_duplicates(Some(&["department"]), KeepPolicy::First)
            .unwrap();
        assert_eq!(col(out, "id").valid_numeric_values().unwrap(), vec![1.0, 2.0, 4.0]);

        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .remove_duplicates(Some(&["department"]), KeepPolicy::Last)
            .unwrap();
        assert_eq!(col(out, "id").valid_numeric_values().unwrap(), vec![4.0, 5.0, 7.0]);

        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .remove_duplicates(Some(&["department"]), KeepPolicy::None)
            .unwrap();
        assert_eq!(col(out, "id").valid_numeric_values().unwrap(), vec![4.0]);
    }

    #[test]
    fn missing_cells_compare_equal() {
        let df = DataFrame::from_columns(vec![
            ("a", Column::numeric_opt(vec![None, None, Some(1.0)])),
            ("b", Column::text_opt(vec![Some("x"), Some("x"), None])),
        ])
        .unwrap();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner.remove_duplicates(None, KeepPolicy::First).unwrap();
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn signed_zeros_are_duplicates() {
        let df = DataFrame::from_columns(vec![
            ("v", Column::numeric_opt(vec![Some(0.0), Some(-0.0), Some(1.0)])),
            ("k", Column::categorical_opt(vec![Some("a"), Some("a"), Some("b")])),
        ])
        .unwrap();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner.remove_duplicates(None, KeepPolicy::First).unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(col(out, "v").valid_numeric_values().unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn fill_leaves_complete_columns_alone() {
        let df = DataFrame::from_columns(vec![
            ("n", Column::numeric_opt(vec![Some(1.0), Some(2.0)])),
            ("d", Column::categorical_opt(vec![Some("HR"), Some("IT")])),
        ])
        .unwrap();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .handle_missing_values(MissingStrategy::Fill, None, Some(&Value::from("unknown")))
            .unwrap();
        assert_eq!(out, &df);
        assert_eq!(col(out, "n").data_type(), DataType::Numeric);
    }

    #[test]
    fn remove_duplicates_idempotent() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        let once = cleaner.remove_duplicates(None, KeepPolicy::First).unwrap().clone();
        let twice = cleaner.remove_duplicates(None, KeepPolicy::First).unwrap();
        assert_eq!(&once, twice);
    }

    // ── Type conversion ──

    #[test]
    fn convert_text_to_integer() {
        let df = DataFrame::from_columns(vec![(
            "value",
            Column::text_opt(vec![Some("1"), Some("2"), Some(" 3"), Some("4")]),
        )])
        .unwrap();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner.convert_dtypes(&[("value", TargetType::Integer)]).unwrap();
        assert_eq!(col(out, "value").valid_numeric_values().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(cleaner.conversion_warnings().is_empty());
    }

    #[test]
    fn convert_to_integer_truncates() {
        let df = DataFrame::from_columns(vec![(
            "value",
            Column::numeric_opt(vec![Some(1.9), Some(-2.7)]),
        )])
        .unwrap();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner.convert_dtypes(&[("value", TargetType::Integer)]).unwrap();
        assert_eq!(col(out, "value").valid_numeric_values().unwrap(), vec![1.0, -2.0]);
    }

    #[test]
    fn integer_with_missing_is_soft_failure() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        let out = cleaner
            .convert_dtypes(&[("age", TargetType::Integer), ("id", TargetType::Float)])
            .unwrap();
        assert_eq!(col(out, "age").null_count(), 1);
        let warnings = cleaner.conversion_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].column, "age");
        assert_eq!(warnings[0].target, TargetType::Integer);
    }

    #[test]
    fn convert_to_float() {
        let df = DataFrame::from_columns(vec![
            ("flag", Column::boolean_opt(vec![Some(true), None, Some(false)])),
            ("text", Column::text_opt(vec![Some("1.5"), Some("2"), None])),
        ])
        .unwrap();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .convert_dtypes(&[("flag", TargetType::Float), ("text", TargetType::Float)])
            .unwrap();
        let flag = col(out, "flag");
        assert_eq!(flag.data_type(), DataType::Numeric);
        assert_eq!((flag.f64_at(0), flag.f64_at(1), flag.f64_at(2)), (Some(1.0), None, Some(0.0)));
        assert_eq!(col(out, "text").f64_at(0), Some(1.5));
        assert_eq!(col(out, "text").null_count(), 1);
    }

    #[test]
    fn convert_to_temporal() {
        let df = DataFrame::from_columns(vec![
            (
                "date",
                Column::text_opt(vec![Some("2023-01-01"), Some("2023-01-02"), Some("2023-01-03")]),
            ),
            ("num", Column::numeric_opt(vec![Some(1.0), Some(2.0), Some(3.0)])),
        ])
        .unwrap();
        let mut cleaner = Cleaner::new(&df);
        let out = cleaner
            .convert_dtypes(&[("date", TargetType::Temporal), ("num", TargetType::Temporal)])
            .unwrap();
        assert_eq!(col(out, "date").data_type(), DataType::Temporal);
        assert_eq!(col(out, "num").data_type(), DataType::Numeric);
        assert_eq!(cleaner.conversion_warnings().len(), 1);
        assert_eq!(cleaner.conversion_warnings()[0].column, "num");
    }

    #[test]
    fn convert_checks_every_column_first() {
        let df = DataFrame::from_columns(vec![(
            "value",
            Column::text_opt(vec![Some("1"), Some("2")]),
        )])
        .unwrap();
        let mut cleaner = Cleaner::new(&df);
        let err = cleaner
            .convert_dtypes(&[("value", TargetType::Integer), ("nonexistent", TargetType::Integer)])
            .unwrap_err();
        assert!(matches!(err, TidyError::ColumnNotFound { .. }));
        assert_eq!(col(cleaner.data(), "value").data_type(), DataType::Text);
    }

    #[test]
    fn timestamp_layouts() {
        for s in [
            "2023-01-02 03:04:05",
            "2023-01-02 03:04:05.250",
            "2023-01-02T03:04:05",
            "2023-01-02T03:04:05Z",
            "2023-01-02",
            "2023/01/02",
            "02.01.2023",
            "01/02/2023",
        ] {
            let t = parse_timestamp(s).unwrap_or_else(|| panic!("failed to parse {s}"));
            assert_eq!(t.date(), NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        }
        assert!(parse_timestamp("2023-13-45").is_none());
    }

    // ── Outliers ──

    #[test]
    fn detect_outliers_flags_age_150() {
        let cleaner = Cleaner::new(&sample_with_issues());
        let mask = cleaner.detect_outliers("age", OutlierMethod::Iqr, 1.5).unwrap();
        assert_eq!(mask.len(), 7);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 1);
        assert!(mask[6]);
    }

    #[test]
    fn detect_outliers_errors() {
        let cleaner = Cleaner::new(&sample_with_issues());
        assert!(matches!(
            cleaner.detect_outliers("nonexistent", OutlierMethod::Iqr, 1.5),
            Err(TidyError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            cleaner.detect_outliers("name", OutlierMethod::Zscore, 3.0),
            Err(TidyError::NonNumericColumn { .. })
        ));
    }

    #[test]
    fn remove_outliers_drops_flagged_rows() {
        let mut cleaner = Cleaner::new(&sample_with_issues());
        let out = cleaner.remove_outliers("age", OutlierMethod::Iqr, 1.5).unwrap();
        assert_eq!(out.row_count(), 6);
        // the row with missing age is kept
        assert_eq!(col(out, "age").null_count(), 1);
        assert!(col(out, "age").valid_numeric_values().unwrap().iter().all(|&a| a < 150.0));
    }
}
