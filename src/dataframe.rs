//! Column-major DataFrame for tabular data.
//!
//! The [`DataFrame`] stores data in column-major order with typed columns
//! and a compact validity bitmap for tracking missing values. It is a value
//! type: cloning yields an independent copy, which is how the
//! [`Cleaner`](crate::cleaner::Cleaner) and [`Analyzer`](crate::analyzer::Analyzer)
//! take their private snapshots.
//!
//! # Column Types
//!
//! | Type | Storage | Use case |
//! |------|---------|----------|
//! | [`Numeric`](Column::Numeric) | `Vec<f64>` + bitmap | Continuous/integer values |
//! | [`Boolean`](Column::Boolean) | `Vec<bool>` + bitmap | True/false values |
//! | [`Categorical`](Column::Categorical) | Dictionary + `Vec<u32>` | Low-cardinality strings |
//! | [`Text`](Column::Text) | `Vec<String>` + bitmap | High-cardinality strings |
//! | [`Temporal`](Column::Temporal) | `Vec<NaiveDateTime>` + bitmap | Dates and timestamps |
//!
//! # Example
//!
//! ```
//! use u_tidy::dataframe::{Column, DataFrame};
//!
//! let df = DataFrame::from_columns(vec![
//!     ("temperature", Column::numeric_opt(vec![Some(20.5), None, Some(19.8)])),
//!     ("site", Column::text_opt(vec![Some("north"), Some("south"), None])),
//! ])
//! .unwrap();
//! assert_eq!(df.row_count(), 3);
//! assert_eq!(df.total_null_count(), 2);
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{Result, TidyError};

/// Display format used when a timestamp is rendered as text.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── ValidityBitmap ────────────────────────────────────────────────────

/// Bit-packed validity bitmap using `Vec<u64>`.
///
/// Each bit indicates whether the corresponding row is valid (1) or
/// missing (0).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityBitmap {
    bits: Vec<u64>,
    len: usize,
}

impl ValidityBitmap {
    /// Creates a bitmap where all `len` positions are valid.
    pub fn all_valid(len: usize) -> Self {
        let n_words = len.div_ceil(64);
        let mut bits = vec![u64::MAX; n_words];
        let trailing = len % 64;
        if trailing != 0 && n_words > 0 {
            bits[n_words - 1] = (1u64 << trailing) - 1;
        }
        Self { bits, len }
    }

    /// Creates an empty bitmap with no rows.
    pub fn empty() -> Self {
        Self {
            bits: Vec::new(),
            len: 0,
        }
    }

    /// Returns `true` if the value at `idx` is present.
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        (self.bits[idx / 64] >> (idx % 64)) & 1 == 1
    }

    /// Appends a new position.
    pub fn push(&mut self, valid: bool) {
        let idx = self.len;
        self.len += 1;
        if idx / 64 >= self.bits.len() {
            self.bits.push(0);
        }
        if valid {
            self.bits[idx / 64] |= 1u64 << (idx % 64);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts the number of missing positions.
    pub fn null_count(&self) -> usize {
        let valid: usize = self.bits.iter().map(|w| w.count_ones() as usize).sum();
        self.len - valid
    }

    /// Counts the number of present positions.
    pub fn valid_count(&self) -> usize {
        self.len - self.null_count()
    }

    /// Returns an iterator over indices of present positions.
    pub fn valid_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.is_valid(i))
    }
}

impl FromIterator<bool> for ValidityBitmap {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bitmap = Self::empty();
        for valid in iter {
            bitmap.push(valid);
        }
        bitmap
    }
}

// ── DataType ──────────────────────────────────────────────────────────

/// Semantic data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    /// Continuous or integer numeric values (stored as `f64`).
    Numeric,
    /// Boolean (true/false) values.
    Boolean,
    /// Low-cardinality strings (dictionary-encoded).
    Categorical,
    /// High-cardinality or free-form text.
    Text,
    /// Date-time values without time zone.
    Temporal,
}

impl DataType {
    /// Only [`DataType::Numeric`] takes part in numeric statistics.
    pub fn is_numeric(self) -> bool {
        self == Self::Numeric
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "Numeric"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Categorical => write!(f, "Categorical"),
            Self::Text => write!(f, "Text"),
            Self::Temporal => write!(f, "Temporal"),
        }
    }
}

// ── Value ─────────────────────────────────────────────────────────────

/// A single non-missing cell value.
///
/// Values are totally ordered (variants rank `Number < Bool < Text <
/// Timestamp`, numbers by [`f64::total_cmp`]) and hashable, so they can key
/// groups, value counts and duplicate detection. Signed zeros compare equal,
/// as do all NaN payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Bool(_) => 1,
            Self::Text(_) => 2,
            Self::Timestamp(_) => 3,
        }
    }

    /// Returns the number, or `None` for other variants.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string, or `None` for other variants.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => canonical(*a).total_cmp(&canonical(*b)),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            // Bit pattern agrees with total_cmp equality.
            Self::Number(v) => canonical(*v).to_bits().hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Text(s) => s.hash(state),
            Self::Timestamp(t) => t.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
            Self::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(canonical(v))
    }
}

/// Folds `-0.0` into `0.0` and every NaN into one payload.
fn canonical(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

// ── Column ────────────────────────────────────────────────────────────

/// A typed column with validity bitmap for missing values.
///
/// All variants store values in a dense array alongside a
/// [`ValidityBitmap`]. Missing positions hold a placeholder (0.0, false,
/// empty string, dictionary index 0 or the Unix epoch) that must be ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric {
        values: Vec<f64>,
        validity: ValidityBitmap,
    },
    Boolean {
        values: Vec<bool>,
        validity: ValidityBitmap,
    },
    /// `dictionary` holds unique strings; `indices` maps each row into it.
    Categorical {
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    },
    Text {
        values: Vec<String>,
        validity: ValidityBitmap,
    },
    Temporal {
        values: Vec<NaiveDateTime>,
        validity: ValidityBitmap,
    },
}

impl Column {
    pub fn numeric(values: Vec<f64>, validity: ValidityBitmap) -> Self {
        Self::Numeric { values, validity }
    }

    pub fn boolean(values: Vec<bool>, validity: ValidityBitmap) -> Self {
        Self::Boolean { values, validity }
    }

    pub fn categorical(
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    ) -> Self {
        Self::Categorical {
            dictionary,
            indices,
            validity,
        }
    }

    pub fn text(values: Vec<String>, validity: ValidityBitmap) -> Self {
        Self::Text { values, validity }
    }

    pub fn temporal(values: Vec<NaiveDateTime>, validity: ValidityBitmap) -> Self {
        Self::Temporal { values, validity }
    }

    /// Builds a numeric column where `None` marks a missing value.
    ///
    /// ```
    /// use u_tidy::dataframe::Column;
    ///
    /// let col = Column::numeric_opt(vec![Some(1.0), None, Some(3.0)]);
    /// assert_eq!(col.null_count(), 1);
    /// ```
    pub fn numeric_opt(values: Vec<Option<f64>>) -> Self {
        let validity = values.iter().map(Option::is_some).collect();
        let values = values.into_iter().map(|v| v.unwrap_or(0.0)).collect();
        Self::Numeric { values, validity }
    }

    /// Builds a boolean column where `None` marks a missing value.
    pub fn boolean_opt(values: Vec<Option<bool>>) -> Self {
        let validity = values.iter().map(Option::is_some).collect();
        let values = values.into_iter().map(|v| v.unwrap_or(false)).collect();
        Self::Boolean { values, validity }
    }

    /// Builds a text column where `None` marks a missing value.
    pub fn text_opt<S: Into<String>>(values: Vec<Option<S>>) -> Self {
        let validity = values.iter().map(Option::is_some).collect();
        let values = values
            .into_iter()
            .map(|v| v.map(Into::into).unwrap_or_default())
            .collect();
        Self::Text { values, validity }
    }

    /// Builds a dictionary-encoded column where `None` marks a missing value.
    pub fn categorical_opt<S: AsRef<str>>(values: Vec<Option<S>>) -> Self {
        let mut lookup: HashMap<String, u32> = HashMap::new();
        let mut dictionary = Vec::new();
        let mut indices = Vec::with_capacity(values.len());
        let mut validity = ValidityBitmap::empty();
        for value in &values {
            match value {
                Some(s) => {
                    let s = s.as_ref();
                    let idx = *lookup.entry(s.to_string()).or_insert_with(|| {
                        dictionary.push(s.to_string());
                        (dictionary.len() - 1) as u32
                    });
                    indices.push(idx);
                    validity.push(true);
                }
                None => {
                    indices.push(0);
                    validity.push(false);
                }
            }
        }
        Self::Categorical {
            dictionary,
            indices,
            validity,
        }
    }

    /// Builds a temporal column where `None` marks a missing value.
    pub fn temporal_opt(values: Vec<Option<NaiveDateTime>>) -> Self {
        let validity = values.iter().map(Option::is_some).collect();
        let values = values.into_iter().map(Option::unwrap_or_default).collect();
        Self::Temporal { values, validity }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Numeric { .. } => DataType::Numeric,
            Self::Boolean { .. } => DataType::Boolean,
            Self::Categorical { .. } => DataType::Categorical,
            Self::Text { .. } => DataType::Text,
            Self::Temporal { .. } => DataType::Temporal,
        }
    }

    pub fn len(&self) -> usize {
        self.validity().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validity(&self) -> &ValidityBitmap {
        match self {
            Self::Numeric { validity, .. }
            | Self::Boolean { validity, .. }
            | Self::Categorical { validity, .. }
            | Self::Text { validity, .. }
            | Self::Temporal { validity, .. } => validity,
        }
    }

    pub fn null_count(&self) -> usize {
        self.validity().null_count()
    }

    pub fn valid_count(&self) -> usize {
        self.validity().valid_count()
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity().is_valid(idx)
    }

    /// Returns present numeric values (missing excluded) in row order.
    pub fn valid_numeric_values(&self) -> Option<Vec<f64>> {
        match self {
            Self::Numeric { values, validity } => {
                Some(validity.valid_indices().map(|i| values[i]).collect())
            }
            _ => None,
        }
    }

    /// Returns the numeric value at `idx`, or `None` if missing or not numeric.
    pub fn f64_at(&self, idx: usize) -> Option<f64> {
        match self {
            Self::Numeric { values, validity } if validity.is_valid(idx) => Some(values[idx]),
            _ => None,
        }
    }

    /// Returns the string at `idx` for text and categorical columns.
    pub fn str_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Text { values, validity } if validity.is_valid(idx) => Some(&values[idx]),
            Self::Categorical {
                dictionary,
                indices,
                validity,
            } if validity.is_valid(idx) => {
                dictionary.get(indices[idx] as usize).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Returns the cell at `idx` as a [`Value`], `None` when missing.
    pub fn value_at(&self, idx: usize) -> Option<Value> {
        if !self.is_valid(idx) {
            return None;
        }
        match self {
            Self::Numeric { values, .. } => Some(Value::from(values[idx])),
            Self::Boolean { values, .. } => Some(Value::Bool(values[idx])),
            Self::Categorical { .. } | Self::Text { .. } => {
                self.str_at(idx).map(|s| Value::Text(s.to_string()))
            }
            Self::Temporal { values, .. } => Some(Value::Timestamp(values[idx])),
        }
    }

    /// Builds a new column whose row `i` copies row `sources[i]` of this
    /// column, or is missing when `sources[i]` is `None`.
    pub fn gather(&self, sources: &[Option<usize>]) -> Column {
        let validity: ValidityBitmap = sources
            .iter()
            .map(|s| s.is_some_and(|i| self.is_valid(i)))
            .collect();
        match self {
            Self::Numeric { values, .. } => Self::Numeric {
                values: pick(values, sources),
                validity,
            },
            Self::Boolean { values, .. } => Self::Boolean {
                values: pick(values, sources),
                validity,
            },
            Self::Categorical {
                dictionary,
                indices,
                ..
            } => Self::Categorical {
                dictionary: dictionary.clone(),
                indices: pick(indices, sources),
                validity,
            },
            Self::Text { values, .. } => Self::Text {
                values: pick(values, sources),
                validity,
            },
            Self::Temporal { values, .. } => Self::Temporal {
                values: pick(values, sources),
                validity,
            },
        }
    }

    /// Selects the given rows, in the given order.
    pub fn take(&self, indices: &[usize]) -> Column {
        let sources: Vec<Option<usize>> = indices.iter().copied().map(Some).collect();
        self.gather(&sources)
    }

    /// Converts the column to [`Column::Text`], rendering each present value.
    pub fn to_text(&self) -> Column {
        let n = self.len();
        let values = (0..n)
            .map(|i| self.value_at(i).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        Self::Text {
            values,
            validity: self.validity().clone(),
        }
    }

    /// Returns a copy with every missing cell replaced by `fill`.
    ///
    /// The literal is stored natively when the column type can hold it; text
    /// and categorical columns take any literal rendered as a string. Other
    /// mismatches widen the column to text first. A column without gaps is
    /// returned unchanged.
    pub fn filled(&self, fill: &Value) -> Column {
        if self.null_count() == 0 {
            return self.clone();
        }
        let n = self.len();
        match (self, fill) {
            (Self::Numeric { values, validity }, Value::Number(v)) => Self::Numeric {
                values: (0..n)
                    .map(|i| if validity.is_valid(i) { values[i] } else { *v })
                    .collect(),
                validity: ValidityBitmap::all_valid(n),
            },
            (Self::Boolean { values, validity }, Value::Bool(b)) => Self::Boolean {
                values: (0..n)
                    .map(|i| if validity.is_valid(i) { values[i] } else { *b })
                    .collect(),
                validity: ValidityBitmap::all_valid(n),
            },
            (Self::Temporal { values, validity }, Value::Timestamp(t)) => Self::Temporal {
                values: (0..n)
                    .map(|i| if validity.is_valid(i) { values[i] } else { *t })
                    .collect(),
                validity: ValidityBitmap::all_valid(n),
            },
            (
                Self::Categorical {
                    dictionary,
                    indices,
                    validity,
                },
                _,
            ) => {
                let label = fill.to_string();
                let mut dictionary = dictionary.clone();
                let fill_idx = match dictionary.iter().position(|d| *d == label) {
                    Some(pos) => pos as u32,
                    None => {
                        dictionary.push(label);
                        (dictionary.len() - 1) as u32
                    }
                };
                Self::Categorical {
                    dictionary,
                    indices: (0..n)
                        .map(|i| if validity.is_valid(i) { indices[i] } else { fill_idx })
                        .collect(),
                    validity: ValidityBitmap::all_valid(n),
                }
            }
            (Self::Text { values, validity }, _) => {
                let label = fill.to_string();
                Self::Text {
                    values: (0..n)
                        .map(|i| {
                            if validity.is_valid(i) {
                                values[i].clone()
                            } else {
                                label.clone()
                            }
                        })
                        .collect(),
                    validity: ValidityBitmap::all_valid(n),
                }
            }
            _ => self.to_text().filled(fill),
        }
    }
}

fn pick<T: Clone + Default>(values: &[T], sources: &[Option<usize>]) -> Vec<T> {
    sources
        .iter()
        .map(|s| s.map(|i| values[i].clone()).unwrap_or_default())
        .collect()
}

// ── DataFrame ─────────────────────────────────────────────────────────

/// Column-major tabular data structure.
///
/// Stores uniquely named columns of typed data. All columns have the same
/// number of rows and share one row ordering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    /// Creates an empty DataFrame with no columns or rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a DataFrame from `(name, column)` pairs.
    pub fn from_columns<N, I>(columns: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Column)>,
    {
        let mut df = Self::new();
        for (name, column) in columns {
            df.add_column(name.into(), column)?;
        }
        Ok(df)
    }

    /// Adds a named column to the DataFrame.
    ///
    /// Returns an error if the name is already taken or the column length
    /// doesn't match the existing row count (unless this is the first column).
    pub fn add_column(&mut self, name: String, column: Column) -> Result<()> {
        if self.names.contains(&name) {
            return Err(TidyError::DuplicateColumn { name });
        }
        let col_len = column.len();
        if self.columns.is_empty() {
            self.row_count = col_len;
        } else if col_len != self.row_count {
            return Err(TidyError::DimensionMismatch {
                expected: self.row_count,
                actual: col_len,
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Replaces the column at `index`, keeping its name and position.
    pub fn replace_column(&mut self, index: usize, column: Column) -> Result<()> {
        if column.len() != self.row_count {
            return Err(TidyError::DimensionMismatch {
                expected: self.row_count,
                actual: column.len(),
            });
        }
        match self.columns.get_mut(index) {
            Some(slot) => {
                *slot = column;
                Ok(())
            }
            None => Err(TidyError::DimensionMismatch {
                expected: self.columns.len(),
                actual: index,
            }),
        }
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the DataFrame has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Like [`column_by_name`](Self::column_by_name), but a missing column is
    /// a [`TidyError::ColumnNotFound`].
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column_by_name(name)
            .ok_or_else(|| TidyError::not_found(name))
    }

    /// Resolves column names to indices, failing on the first unknown name.
    pub fn resolve_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                self.column_index(n).ok_or_else(|| TidyError::not_found(n))
            })
            .collect()
    }

    /// Returns an iterator over (name, column) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Returns a summary of column data types.
    pub fn schema(&self) -> Vec<(&str, DataType)> {
        self.iter().map(|(name, col)| (name, col.data_type())).collect()
    }

    /// Names of numeric columns, in column order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, col)| col.data_type().is_numeric())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Returns the total number of missing values across all columns.
    pub fn total_null_count(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }

    /// Returns the cells of row `idx` in column order.
    pub fn row(&self, idx: usize) -> Vec<Option<Value>> {
        self.columns.iter().map(|c| c.value_at(idx)).collect()
    }

    /// Returns a new DataFrame with the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> DataFrame {
        DataFrame {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            row_count: if self.columns.is_empty() { 0 } else { indices.len() },
        }
    }

    /// Returns a new DataFrame with the rows where `keep` is `true`.
    pub fn filter_rows(&self, keep: &[bool]) -> DataFrame {
        debug_assert_eq!(keep.len(), self.row_count);
        let indices: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter(|(_, &k)| k)
            .map(|(i, _)| i)
            .collect();
        self.take_rows(&indices)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
