//! Read-only statistical analysis over a cleaned table.
//!
//! An [`Analyzer`] owns a private copy of its input and answers independent
//! queries: descriptive statistics, missingness, correlations, grouped
//! aggregates, simple linear regression, value distributions and anomalies.
//!
//! # Example
//!
//! ```
//! use u_tidy::analyzer::{AggFunc, Analyzer};
//! use u_tidy::dataframe::{Column, DataFrame, Value};
//!
//! let df = DataFrame::from_columns(vec![
//!     ("dept", Column::categorical_opt(vec![Some("IT"), Some("HR"), Some("IT"), Some("HR")])),
//!     ("salary", Column::numeric_opt(vec![Some(60.0), Some(50.0), Some(80.0), Some(40.0)])),
//! ])
//! .unwrap();
//!
//! let analyzer = Analyzer::new(&df);
//! let by_dept = analyzer.group_analysis("dept", "salary", AggFunc::Mean).unwrap();
//! assert_eq!(by_dept.len(), 2);
//! assert_eq!(by_dept.get(&Value::from("IT")), Some(70.0));
//!
//! let summary = analyzer.summary_statistics();
//! assert_eq!(summary.value("max", "salary").unwrap(), 80.0);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;
use u_analytics::regression;

use crate::correlation::{self, CorrelationMatrix, CorrelationMethod, CorrelationPair};
use crate::dataframe::{Column, DataFrame, Value};
use crate::error::{Result, TidyError};
use crate::outlier::{outlier_mask, OutlierMethod};

/// Row labels of [`SummaryStatistics`], in order.
pub const STAT_NAMES: [&str; 10] = [
    "count", "mean", "std", "min", "25%", "50%", "75%", "max", "skewness", "kurtosis",
];

// ── Summary Statistics ────────────────────────────────────────────────

/// Descriptive statistics of one numeric column, over its present values.
///
/// Statistics that are undefined for the sample (e.g. `std` of a single
/// value) are NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
    /// Bias-corrected sample skewness (G1).
    pub skewness: f64,
    /// Bias-corrected excess kurtosis (G2).
    pub kurtosis: f64,
}

impl ColumnSummary {
    fn compute(column: &str, col: &Column) -> Option<Self> {
        let valid: Vec<f64> = col
            .valid_numeric_values()?
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect();
        let stat = |v: Option<f64>| v.unwrap_or(f64::NAN);
        Some(Self {
            column: column.to_string(),
            count: valid.len(),
            mean: stat(mean(&valid)),
            std: stat(u_numflow::stats::std_dev(&valid)),
            min: stat(u_numflow::stats::min(&valid)),
            q25: stat(u_numflow::stats::quantile(&valid, 0.25)),
            median: stat(u_numflow::stats::median(&valid)),
            q75: stat(u_numflow::stats::quantile(&valid, 0.75)),
            max: stat(u_numflow::stats::max(&valid)),
            skewness: stat(u_numflow::stats::skewness(&valid)),
            kurtosis: stat(u_numflow::stats::kurtosis(&valid)),
        })
    }

    /// Statistic by its [`STAT_NAMES`] label.
    pub fn stat(&self, name: &str) -> Option<f64> {
        let v = match name {
            "count" => self.count as f64,
            "mean" => self.mean,
            "std" => self.std,
            "min" => self.min,
            "25%" => self.q25,
            "50%" => self.median,
            "75%" => self.q75,
            "max" => self.max,
            "skewness" => self.skewness,
            "kurtosis" => self.kurtosis,
            _ => return None,
        };
        Some(v)
    }

    /// All statistics in [`STAT_NAMES`] order.
    pub fn values(&self) -> [f64; 10] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
            self.skewness,
            self.kurtosis,
        ]
    }
}

/// Statistic × column table produced by [`Analyzer::summary_statistics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub columns: Vec<ColumnSummary>,
}

impl SummaryStatistics {
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.column == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column.as_str()).collect()
    }

    /// Looks up one cell.
    ///
    /// # Errors
    ///
    /// [`TidyError::ColumnNotFound`] for a column that is not summarized,
    /// [`TidyError::InvalidConfiguration`] for an unknown statistic label.
    pub fn value(&self, stat: &str, column: &str) -> Result<f64> {
        let summary = self
            .column(column)
            .ok_or_else(|| TidyError::not_found(column))?;
        summary
            .stat(stat)
            .ok_or_else(|| TidyError::config(format!("unknown statistic '{stat}'")))
    }

    /// One statistic across every summarized column.
    pub fn row(&self, stat: &str) -> Result<Vec<f64>> {
        self.columns
            .iter()
            .map(|c| {
                c.stat(stat)
                    .ok_or_else(|| TidyError::config(format!("unknown statistic '{stat}'")))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One line of the missing-value report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingValueEntry {
    pub column: String,
    pub missing_count: usize,
    /// `100 × missing_count / row_count`.
    pub missing_percentage: f64,
}

// ── Grouping ──────────────────────────────────────────────────────────

/// Aggregation applied per group by [`Analyzer::group_analysis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AggFunc {
    #[default]
    Mean,
    Sum,
    /// Non-missing cells; works on any column type.
    Count,
    Median,
    /// Sample standard deviation.
    Std,
}

impl FromStr for AggFunc {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "count" => Ok(Self::Count),
            "median" => Ok(Self::Median),
            "std" => Ok(Self::Std),
            other => Err(TidyError::config(format!(
                "invalid aggregation '{other}', choose from 'mean', 'sum', 'count', 'median', 'std'"
            ))),
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Count => "count",
            Self::Median => "median",
            Self::Std => "std",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: Value,
    /// `None` when the aggregate is undefined for the group.
    pub value: Option<f64>,
}

/// One row per distinct group key, in ascending key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAggregate {
    pub group_by: String,
    pub agg_column: String,
    pub func: AggFunc,
    pub rows: Vec<GroupRow>,
}

impl GroupAggregate {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Aggregate for `key`; `None` if the group is absent or its value undefined.
    pub fn get(&self, key: &Value) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key == *key)
            .and_then(|r| r.value)
    }
}

// ── Regression ────────────────────────────────────────────────────────

/// Ordinary least squares fit of `y = intercept + slope · x`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    pub x_column: String,
    pub y_column: String,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// NaN with fewer than three pairs.
    pub adjusted_r_squared: f64,
    /// Complete `(x, y)` pairs used in the fit.
    pub n: usize,
    /// Two-sided t-test of `slope = 0`; needs three pairs and a non-perfect fit.
    pub slope_p_value: Option<f64>,
    /// Two-sided t-test of `intercept = 0`.
    pub intercept_p_value: Option<f64>,
}

// ── Value Counts ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: Value,
    pub count: usize,
    /// Share of all present cells; set when counts are normalized.
    pub proportion: Option<f64>,
}

// ── Analyzer ──────────────────────────────────────────────────────────

/// Answers statistical queries over a private copy of a table.
#[derive(Debug, Clone)]
pub struct Analyzer {
    data: DataFrame,
}

impl Analyzer {
    /// Copies `df`.
    pub fn new(df: &DataFrame) -> Self {
        info!(
            rows = df.row_count(),
            columns = df.column_count(),
            "analyzer initialized"
        );
        Self { data: df.clone() }
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Descriptive statistics for every numeric column.
    pub fn summary_statistics(&self) -> SummaryStatistics {
        info!("generating summary statistics");
        let columns = self
            .data
            .iter()
            .filter_map(|(name, col)| ColumnSummary::compute(name, col))
            .collect();
        SummaryStatistics { columns }
    }

    /// Columns with at least one missing cell, most missing first.
    pub fn missing_value_report(&self) -> Vec<MissingValueEntry> {
        info!("generating missing value report");
        let rows = self.data.row_count();
        let mut report: Vec<MissingValueEntry> = self
            .data
            .iter()
            .filter(|(_, col)| col.null_count() > 0)
            .map(|(name, col)| MissingValueEntry {
                column: name.to_string(),
                missing_count: col.null_count(),
                missing_percentage: 100.0 * col.null_count() as f64 / rows as f64,
            })
            .collect();
        report.sort_by(|a, b| b.missing_count.cmp(&a.missing_count));
        report
    }

    /// Correlation matrix over `columns` (default: all numeric columns).
    ///
    /// # Errors
    ///
    /// [`TidyError::ColumnNotFound`] for an absent column,
    /// [`TidyError::NonNumericColumn`] for a non-numeric one.
    pub fn correlation_matrix(
        &self,
        method: CorrelationMethod,
        columns: Option<&[&str]>,
    ) -> Result<CorrelationMatrix> {
        info!(%method, "calculating correlation matrix");
        correlation::correlation_matrix(&self.data, method, columns)
    }

    /// Numeric column pairs with `|r| > threshold`, strongest first.
    ///
    /// ```
    /// use u_tidy::analyzer::Analyzer;
    /// use u_tidy::correlation::CorrelationMethod;
    /// use u_tidy::dataframe::{Column, DataFrame};
    ///
    /// let df = DataFrame::from_columns(vec![
    ///     ("x", Column::numeric_opt(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)])),
    ///     ("y", Column::numeric_opt([2.1, 3.9, 6.2, 7.8, 10.1].into_iter().map(Some).collect())),
    ///     ("z", Column::numeric_opt(vec![Some(3.0), Some(1.0), Some(4.0), Some(1.0), Some(5.0)])),
    /// ])
    /// .unwrap();
    ///
    /// let pairs = Analyzer::new(&df)
    ///     .find_high_correlations(0.9, CorrelationMethod::Pearson)
    ///     .unwrap();
    /// assert_eq!(pairs.len(), 1);
    /// assert_eq!(pairs[0].col_a, "x");
    /// assert_eq!(pairs[0].col_b, "y");
    /// ```
    pub fn find_high_correlations(
        &self,
        threshold: f64,
        method: CorrelationMethod,
    ) -> Result<Vec<CorrelationPair>> {
        let pairs = self.correlation_matrix(method, None)?.high_pairs(threshold);
        info!(
            pairs = pairs.len(),
            threshold, "found feature pairs above correlation threshold"
        );
        Ok(pairs)
    }

    /// Aggregates `agg_column` per distinct value of `group_by`.
    ///
    /// Rows whose key is missing are dropped. Missing cells in `agg_column`
    /// are skipped; the sum of an all-missing group is 0.
    ///
    /// # Errors
    ///
    /// - [`TidyError::ColumnNotFound`] if either column is absent
    /// - [`TidyError::NonNumericColumn`] if `func` is not
    ///   [`AggFunc::Count`] and `agg_column` is not numeric
    pub fn group_analysis(
        &self,
        group_by: &str,
        agg_column: &str,
        func: AggFunc,
    ) -> Result<GroupAggregate> {
        info!(group_by, agg_column, %func, "performing group analysis");
        let keys = self.data.require_column(group_by)?;
        let target = self.data.require_column(agg_column)?;
        if func != AggFunc::Count && !target.data_type().is_numeric() {
            return Err(TidyError::non_numeric(agg_column));
        }

        let mut groups: BTreeMap<Value, Vec<usize>> = BTreeMap::new();
        for row in 0..self.data.row_count() {
            if let Some(key) = keys.value_at(row) {
                groups.entry(key).or_default().push(row);
            }
        }

        let rows = groups
            .into_iter()
            .map(|(key, members)| GroupRow {
                key,
                value: aggregate(target, &members, func),
            })
            .collect();

        Ok(GroupAggregate {
            group_by: group_by.to_string(),
            agg_column: agg_column.to_string(),
            func,
            rows,
        })
    }

    /// Fits `y_column` on `x_column` by ordinary least squares, using the
    /// rows where both are present.
    ///
    /// # Errors
    ///
    /// - [`TidyError::ColumnNotFound`] / [`TidyError::NonNumericColumn`] for
    ///   either column
    /// - [`TidyError::Computation`] with fewer than two complete pairs or
    ///   zero variance in x
    pub fn simple_linear_regression(
        &self,
        x_column: &str,
        y_column: &str,
    ) -> Result<RegressionResult> {
        info!(x_column, y_column, "performing linear regression");
        let x = self.numeric_column(x_column)?;
        let y = self.numeric_column(y_column)?;

        let (xs, ys): (Vec<f64>, Vec<f64>) = (0..self.data.row_count())
            .filter_map(|i| match (x.f64_at(i), y.f64_at(i)) {
                (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((a, b)),
                _ => None,
            })
            .unzip();

        let n = xs.len();
        if n < 2 {
            return Err(TidyError::computation(format!(
                "regressing '{y_column}' on '{x_column}' needs 2 complete pairs, got {n}"
            )));
        }
        if xs.windows(2).all(|w| w[0] == w[1]) {
            return Err(TidyError::computation(format!(
                "'{x_column}' has zero variance, regression slope is undefined"
            )));
        }

        let (slope, intercept, r_squared, adjusted_r_squared, slope_p_value, intercept_p_value) =
            if n == 2 {
                // the line through both points; no residual degrees of freedom
                let slope = (ys[1] - ys[0]) / (xs[1] - xs[0]);
                (slope, ys[0] - slope * xs[0], 1.0, f64::NAN, None, None)
            } else {
                let fit = regression::simple_linear_regression(&xs, &ys).ok_or_else(|| {
                    TidyError::computation(format!(
                        "regression of '{y_column}' on '{x_column}' is undefined"
                    ))
                })?;
                // a perfect fit leaves no residual variance to test against
                let testable = fit.r_squared < 1.0;
                (
                    fit.slope,
                    fit.intercept,
                    fit.r_squared,
                    fit.adjusted_r_squared,
                    testable.then_some(fit.slope_p),
                    testable.then_some(fit.intercept_p),
                )
            };

        info!(r_squared, slope, intercept, n, "regression results");
        Ok(RegressionResult {
            x_column: x_column.to_string(),
            y_column: y_column.to_string(),
            slope,
            intercept,
            r_squared,
            adjusted_r_squared,
            n,
            slope_p_value,
            intercept_p_value,
        })
    }

    /// Occurrences of each distinct present value, most frequent first.
    ///
    /// Ties keep first-appearance order. Proportions are taken over all
    /// present cells before `top_n` truncation.
    pub fn value_counts(
        &self,
        column: &str,
        normalize: bool,
        top_n: Option<usize>,
    ) -> Result<Vec<ValueCount>> {
        info!(column, "getting value counts");
        let col = self.data.require_column(column)?;

        let mut index: HashMap<Value, usize> = HashMap::new();
        let mut counts: Vec<(Value, usize)> = Vec::new();
        for row in 0..col.len() {
            let Some(v) = col.value_at(row) else { continue };
            match index.get(&v) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    index.insert(v.clone(), counts.len());
                    counts.push((v, 1));
                }
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let total = col.valid_count() as f64;
        let limit = top_n.unwrap_or(counts.len());
        Ok(counts
            .into_iter()
            .take(limit)
            .map(|(value, count)| ValueCount {
                value,
                count,
                proportion: normalize.then(|| count as f64 / total),
            })
            .collect())
    }

    /// Rows whose `column` value is anomalous under `method`.
    ///
    /// Same detection and errors as
    /// [`Cleaner::detect_outliers`](crate::cleaner::Cleaner::detect_outliers).
    pub fn detect_anomalies(
        &self,
        column: &str,
        method: OutlierMethod,
        threshold: f64,
    ) -> Result<DataFrame> {
        info!(column, %method, "detecting anomalies");
        let mask = outlier_mask(&self.data, column, method, threshold)?;
        let anomalies = self.data.filter_rows(&mask);
        info!(anomalies = anomalies.row_count(), "found anomalies");
        Ok(anomalies)
    }

    fn numeric_column(&self, name: &str) -> Result<&Column> {
        let col = self.data.require_column(name)?;
        if col.data_type().is_numeric() {
            Ok(col)
        } else {
            Err(TidyError::non_numeric(name))
        }
    }
}

fn aggregate(col: &Column, members: &[usize], func: AggFunc) -> Option<f64> {
    if func == AggFunc::Count {
        return Some(members.iter().filter(|&&r| col.is_valid(r)).count() as f64);
    }
    let values: Vec<f64> = members
        .iter()
        .filter_map(|&r| col.f64_at(r))
        .filter(|v| !v.is_nan())
        .collect();
    match func {
        AggFunc::Mean => mean(&values),
        AggFunc::Sum => Some(values.iter().sum()),
        AggFunc::Median => u_numflow::stats::median(&values),
        AggFunc::Std => u_numflow::stats::std_dev(&values),
        AggFunc::Count => None,
    }
}

/// Arithmetic mean of NaN-free values.
///
/// Infinite values propagate: the mean is `±inf`, or NaN when both signs
/// are present. `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    u_numflow::stats::mean(values)
        .or_else(|| (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64))
}

// ── Tests ─────────────────────────────────────────────────────────────
