//! Pairwise correlation with per-pair deletion of missing cells.
//!
//! Every coefficient is computed over the rows where both columns hold a
//! finite value. A coefficient is undefined (`None`) when fewer than two
//! complete pairs remain or either side has zero variance.
//!
//! # Example
//!
//! ```
//! use u_tidy::correlation::{correlation_matrix, CorrelationMethod, DEFAULT_HIGH_CORRELATION};
//! use u_tidy::dataframe::{Column, DataFrame};
//!
//! let df = DataFrame::from_columns(vec![
//!     ("x", Column::numeric_opt(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)])),
//!     ("y", Column::numeric_opt(vec![Some(8.0), Some(6.0), Some(4.0), Some(2.0)])),
//! ])
//! .unwrap();
//!
//! let matrix = correlation_matrix(&df, CorrelationMethod::Pearson, None).unwrap();
//! assert_eq!(matrix.get(0, 0), Some(1.0));
//! assert!((matrix.value("x", "y").unwrap() + 1.0).abs() < 1e-12);
//!
//! let pairs = matrix.high_pairs(DEFAULT_HIGH_CORRELATION);
//! assert_eq!(pairs.len(), 1);
//! assert_eq!((pairs[0].col_a.as_str(), pairs[0].col_b.as_str()), ("x", "y"));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;
use u_analytics::correlation;

use crate::dataframe::{Column, DataFrame};
use crate::error::{Result, TidyError};

/// Default cutoff for [`CorrelationMatrix::high_pairs`].
pub const DEFAULT_HIGH_CORRELATION: f64 = 0.7;

/// Correlation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CorrelationMethod {
    /// Pearson product-moment correlation.
    #[default]
    Pearson,
    /// Pearson correlation of average ranks.
    Spearman,
    /// Kendall tau-b, adjusted for ties.
    Kendall,
}

impl FromStr for CorrelationMethod {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pearson" => Ok(Self::Pearson),
            "spearman" => Ok(Self::Spearman),
            "kendall" => Ok(Self::Kendall),
            other => Err(TidyError::config(format!(
                "invalid correlation method '{other}', choose 'pearson', 'spearman' or 'kendall'"
            ))),
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
            Self::Kendall => "kendall",
        };
        f.write_str(name)
    }
}

/// A pair of columns whose correlation exceeds a threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPair {
    /// Earlier column in matrix order.
    pub col_a: String,
    /// Later column in matrix order.
    pub col_b: String,
    /// Correlation coefficient.
    pub r: f64,
}

/// Square, symmetric correlation matrix indexed by column name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    method: CorrelationMethod,
    names: Vec<String>,
    /// Row-major `n × n` entries; `None` marks an undefined coefficient.
    values: Vec<Option<f64>>,
}

impl CorrelationMatrix {
    pub fn method(&self) -> CorrelationMethod {
        self.method
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows (and columns) in the matrix.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entry at `(i, j)`; `None` if undefined or out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.len();
        if i >= n || j >= n {
            return None;
        }
        self.values[i * n + j]
    }

    /// Entry for the named pair.
    ///
    /// # Errors
    ///
    /// [`TidyError::ColumnNotFound`] if either name is not in the matrix,
    /// [`TidyError::Computation`] if the coefficient is undefined.
    pub fn value(&self, a: &str, b: &str) -> Result<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.get(i, j).ok_or_else(|| {
            TidyError::computation(format!(
                "{} correlation between '{a}' and '{b}' is undefined",
                self.method
            ))
        })
    }

    /// Rows of the matrix as `(name, entries)`.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        let n = self.len().max(1);
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.chunks(n))
    }

    /// Strict-upper-triangle pairs with `|r| > threshold`, sorted by `|r|`
    /// descending. Ties keep discovery order: the later column in the outer
    /// loop, the earlier one in the inner loop.
    pub fn high_pairs(&self, threshold: f64) -> Vec<CorrelationPair> {
        let n = self.len();
        let mut pairs = Vec::new();
        for j in 0..n {
            for i in 0..j {
                if let Some(r) = self.get(i, j) {
                    if r.abs() > threshold {
                        pairs.push(CorrelationPair {
                            col_a: self.names[i].clone(),
                            col_b: self.names[j].clone(),
                            r,
                        });
                    }
                }
            }
        }
        pairs.sort_by(|a, b| b.r.abs().partial_cmp(&a.r.abs()).unwrap_or(Ordering::Equal));
        pairs
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| TidyError::not_found(name))
    }
}

/// Computes the correlation matrix of `columns` (default: every numeric
/// column, in table order).
///
/// # Errors
///
/// [`TidyError::ColumnNotFound`] for an absent column and
/// [`TidyError::NonNumericColumn`] for an explicitly requested column that is
/// not numeric.
pub fn correlation_matrix(
    df: &DataFrame,
    method: CorrelationMethod,
    columns: Option<&[&str]>,
) -> Result<CorrelationMatrix> {
    let names: Vec<String> = match columns {
        Some(cols) => {
            for &name in cols {
                if !df.require_column(name)?.data_type().is_numeric() {
                    return Err(TidyError::non_numeric(name));
                }
            }
            cols.iter().map(|s| s.to_string()).collect()
        }
        None => df.numeric_column_names(),
    };

    let series: Vec<Vec<Option<f64>>> = names
        .iter()
        .map(|name| df.require_column(name).map(present_values))
        .collect::<Result<_>>()?;

    let n = names.len();
    let mut values = vec![None; n * n];
    for i in 0..n {
        values[i * n + i] = has_variance(&series[i]).then_some(1.0);
        for j in (i + 1)..n {
            let r = correlate(&series[i], &series[j], method);
            values[i * n + j] = r;
            values[j * n + i] = r;
        }
    }
    debug!(%method, columns = n, "computed correlation matrix");

    Ok(CorrelationMatrix {
        method,
        names,
        values,
    })
}

/// Correlation of two aligned series, skipping rows where either side is
/// missing or non-finite.
///
/// ```
/// use u_tidy::correlation::{correlate, CorrelationMethod};
///
/// let x = [Some(1.0), Some(2.0), None, Some(4.0)];
/// let y = [Some(1.0), Some(4.0), Some(9.0), Some(16.0)];
/// let rho = correlate(&x, &y, CorrelationMethod::Spearman).unwrap();
/// assert!((rho - 1.0).abs() < 1e-12);
/// ```
pub fn correlate(x: &[Option<f64>], y: &[Option<f64>], method: CorrelationMethod) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .unzip();
    if xs.len() < 2 || is_constant(&xs) || is_constant(&ys) {
        return None;
    }
    // two distinct points are perfectly ordered under every method
    if xs.len() == 2 {
        return Some(((xs[1] - xs[0]) * (ys[1] - ys[0])).signum());
    }
    let fit = match method {
        CorrelationMethod::Pearson => correlation::pearson(&xs, &ys),
        CorrelationMethod::Spearman => correlation::spearman(&xs, &ys),
        CorrelationMethod::Kendall => correlation::kendall_tau_b(&xs, &ys),
    }?;
    fit.r.is_finite().then(|| fit.r.clamp(-1.0, 1.0))
}

fn present_values(col: &Column) -> Vec<Option<f64>> {
    (0..col.len()).map(|i| col.f64_at(i)).collect()
}

fn has_variance(series: &[Option<f64>]) -> bool {
    let finite: Vec<f64> = series.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    !finite.is_empty() && !is_constant(&finite)
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

// ── Tests ─────────────────────────────────────────────────────────────
