//! # u-tidy
//!
//! Statistical data cleaning and exploratory analysis for in-memory tables.
//!
//! u-tidy takes a raw tabular dataset through two layers:
//!
//! - **Cleaning** — missing-value treatment, duplicate removal, type
//!   coercion and outlier removal, each producing a new table
//! - **Analysis** — read-only summaries of the cleaned table: descriptive
//!   statistics, missingness, correlations, grouped aggregates, regression,
//!   value distributions and anomalies
//!
//! ## Modules
//!
//! - [`dataframe`] — Column-major tabular data model (DataFrame, Column, Value)
//! - [`csv_parser`] — CSV parsing with automatic type inference
//! - [`cleaner`] — Cleaner: missing values, duplicates, dtype conversion, outliers
//! - [`analyzer`] — Analyzer: summaries, correlations, grouping, regression, value counts
//! - [`outlier`] — IQR and z-score outlier masks shared by both layers
//! - [`correlation`] — Pearson, Spearman and Kendall correlation with pairwise deletion
//! - [`logging`] — tracing subscriber setup
//! - [`error`] — Error types
//!
//! ## Quick Start
//!
//! ```
//! use u_tidy::analyzer::{AggFunc, Analyzer};
//! use u_tidy::cleaner::{Cleaner, KeepPolicy, MissingStrategy};
//! use u_tidy::csv_parser::CsvParser;
//! use u_tidy::outlier::OutlierMethod;
//!
//! let csv = "dept,salary,age\n\
//!            IT,70000,30\n\
//!            HR,50000,25\n\
//!            HR,50000,25\n\
//!            IT,,41\n\
//!            Sales,60000,500\n";
//! let raw = CsvParser::new().parse_str(csv).unwrap();
//!
//! let mut cleaner = Cleaner::new(&raw);
//! cleaner.remove_duplicates(None, KeepPolicy::First).unwrap();
//! cleaner.handle_missing_values(MissingStrategy::Median, None, None).unwrap();
//! cleaner.remove_outliers("age", OutlierMethod::Zscore, 1.0).unwrap();
//! let clean = cleaner.into_data();
//! assert_eq!(clean.row_count(), 3);
//! assert_eq!(clean.total_null_count(), 0);
//!
//! let analyzer = Analyzer::new(&clean);
//! let by_dept = analyzer.group_analysis("dept", "salary", AggFunc::Count).unwrap();
//! assert_eq!(by_dept.len(), 2);
//! ```

pub mod analyzer;
pub mod cleaner;
pub mod correlation;
pub mod csv_parser;
pub mod dataframe;
pub mod error;
pub mod logging;
pub mod outlier;
