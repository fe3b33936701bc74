//! Error types for u-tidy.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TidyError>;

/// All errors produced by u-tidy operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TidyError {
    /// Column not found in DataFrame.
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },
    /// Unknown strategy/method name, or a required companion parameter is missing.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Column is not numeric where numeric data is required.
    #[error("column '{column}' is not numeric")]
    NonNumericColumn { column: String },
    /// A statistic is undefined for the given data.
    #[error("computation undefined: {0}")]
    Computation(String),
    /// Column length differs from the DataFrame's row count.
    #[error("expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// A column with this name already exists.
    #[error("duplicate column name '{name}'")]
    DuplicateColumn { name: String },
    /// CSV parsing failed.
    #[error("CSV parse error at line {line}: {message}")]
    CsvParse { line: usize, message: String },
    /// I/O error during file reading.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Coarse classification of [`TidyError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced column does not exist.
    NotFound,
    /// A parameter is unrecognized or incomplete.
    Configuration,
    /// A numeric operation was given non-numeric data.
    Type,
    /// A statistic is undefined for the data.
    Computation,
    /// A DataFrame could not be assembled.
    Construction,
    /// Input could not be read or parsed.
    Input,
}

impl TidyError {
    /// Creates an [`InvalidConfiguration`](Self::InvalidConfiguration) error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a [`Computation`](Self::Computation) error.
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }

    pub(crate) fn not_found(name: &str) -> Self {
        Self::ColumnNotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn non_numeric(column: &str) -> Self {
        Self::NonNumericColumn {
            column: column.to_string(),
        }
    }

    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ColumnNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidConfiguration(_) => ErrorKind::Configuration,
            Self::NonNumericColumn { .. } => ErrorKind::Type,
            Self::Computation(_) => ErrorKind::Computation,
            Self::DimensionMismatch { .. } | Self::DuplicateColumn { .. } => {
                ErrorKind::Construction
            }
            Self::CsvParse { .. } | Self::Io(_) => ErrorKind::Input,
        }
    }
}

impl From<std::io::Error> for TidyError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            TidyError::not_found("age").to_string(),
            "column 'age' not found"
        );
        assert_eq!(
            TidyError::non_numeric("name").to_string(),
            "column 'name' is not numeric"
        );
        assert_eq!(
            TidyError::config("unknown method 'foo'").to_string(),
            "invalid configuration: unknown method 'foo'"
        );
    }

    #[test]
    fn kinds() {
        assert_eq!(TidyError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(TidyError::config("x").kind(), ErrorKind::Configuration);
        assert_eq!(TidyError::non_numeric("x").kind(), ErrorKind::Type);
        assert_eq!(TidyError::computation("x").kind(), ErrorKind::Computation);
        assert_eq!(
            TidyError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
            .kind(),
            ErrorKind::Construction
        );
    }

    #[test]
    fn io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: TidyError = io.into();
        assert_eq!(err.kind(), ErrorKind::Input);
    }
}
