//! Univariate outlier detection shared by the cleaning and analysis layers.
//!
//! Both methods estimate their fences from the finite, present values of a
//! numeric column and produce a mask aligned with the DataFrame's rows.
//! Missing cells and NaN are never flagged.
//!
//! ```
//! use u_tidy::dataframe::{Column, DataFrame};
//! use u_tidy::outlier::{outlier_mask, OutlierMethod};
//!
//! let df = DataFrame::from_columns(vec![(
//!     "value",
//!     Column::numeric_opt([1.0, 2.0, 3.0, 4.0, 5.0, 100.0].into_iter().map(Some).collect()),
//! )])
//! .unwrap();
//! let mask = outlier_mask(&df, "value", OutlierMethod::Zscore, 2.0).unwrap();
//! assert_eq!(mask, vec![false, false, false, false, false, true]);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::dataframe::{Column, DataFrame};
use crate::error::{Result, TidyError};

/// Standard deviations below this are treated as zero variance.
const MIN_STD_DEV: f64 = 1e-15;

/// Method for univariate outlier detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutlierMethod {
    /// Tukey fences: outlier if value < Q1 − k·IQR or > Q3 + k·IQR.
    Iqr,
    /// Outlier if |value − mean| / std > threshold (sample std).
    Zscore,
}

impl FromStr for OutlierMethod {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "iqr" => Ok(Self::Iqr),
            "zscore" | "z-score" | "z_score" => Ok(Self::Zscore),
            other => Err(TidyError::config(format!(
                "invalid outlier method '{other}', choose 'iqr' or 'zscore'"
            ))),
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iqr => write!(f, "iqr"),
            Self::Zscore => write!(f, "zscore"),
        }
    }
}

/// Method and threshold for outlier or anomaly detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierConfig {
    pub method: OutlierMethod,
    /// IQR multiplier or number of standard deviations.
    pub threshold: f64,
}

impl OutlierConfig {
    pub fn new(method: OutlierMethod, threshold: f64) -> Self {
        Self { method, threshold }
    }

    /// Z-score with threshold 3.0, the default for anomaly reports.
    pub fn anomaly_default() -> Self {
        Self::new(OutlierMethod::Zscore, 3.0)
    }
}

impl Default for OutlierConfig {
    /// IQR with multiplier 1.5.
    fn default() -> Self {
        Self::new(OutlierMethod::Iqr, 1.5)
    }
}

/// Flags the rows of `column` that lie outside the fences of `method`.
///
/// # Errors
///
/// - [`TidyError::ColumnNotFound`] if `column` does not exist
/// - [`TidyError::NonNumericColumn`] if it is not numeric
/// - [`TidyError::InvalidConfiguration`] if `threshold` is not finite
pub fn outlier_mask(
    df: &DataFrame,
    column: &str,
    method: OutlierMethod,
    threshold: f64,
) -> Result<Vec<bool>> {
    let col = df.require_column(column)?;
    let Column::Numeric { values, validity } = col else {
        return Err(TidyError::non_numeric(column));
    };
    if !threshold.is_finite() {
        return Err(TidyError::config(format!(
            "outlier threshold must be finite, got {threshold}"
        )));
    }

    let present: Vec<Option<f64>> = (0..values.len())
        .map(|i| validity.is_valid(i).then_some(values[i]))
        .collect();
    let finite: Vec<f64> = present.iter().flatten().copied().filter(|v| v.is_finite()).collect();

    let mask = match method {
        OutlierMethod::Iqr => iqr_mask(&present, &finite, threshold),
        OutlierMethod::Zscore => zscore_mask(&present, &finite, threshold),
    };
    debug!(
        column,
        %method,
        threshold,
        flagged = mask.iter().filter(|&&m| m).count(),
        "computed outlier mask"
    );
    Ok(mask)
}

fn iqr_mask(present: &[Option<f64>], finite: &[f64], k: f64) -> Vec<bool> {
    let (Some(q1), Some(q3)) = (
        u_numflow::stats::quantile(finite, 0.25),
        u_numflow::stats::quantile(finite, 0.75),
    ) else {
        return vec![false; present.len()];
    };
    let iqr = q3 - q1;
    let lower = q1 - k * iqr;
    let upper = q3 + k * iqr;
    present
        .iter()
        .map(|v| v.is_some_and(|x| x < lower || x > upper))
        .collect()
}

fn zscore_mask(present: &[Option<f64>], finite: &[f64], threshold: f64) -> Vec<bool> {
    let (Some(mean), Some(std)) = (
        u_numflow::stats::mean(finite),
        u_numflow::stats::std_dev(finite),
    ) else {
        return vec![false; present.len()];
    };
    if std < MIN_STD_DEV {
        return vec![false; present.len()];
    }
    present
        .iter()
        .map(|v| v.is_some_and(|x| ((x - mean) / std).abs() > threshold))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────
