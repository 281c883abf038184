//! Error types for hbvcal-io.

use std::path::PathBuf;

use hbvcal_model::ModelError;

/// Error type for all fallible operations in the hbvcal-io crate.
///
/// Covers missing files, malformed tables, and model-side validation of the
/// values read from them.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error from the `csv` reader or writer.
    #[error("table error in {}: {reason}", path.display())]
    Table {
        /// File being read or written.
        path: PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },

    /// Returned when a required column is absent from the header.
    #[error("column '{name}' not found in {}", path.display())]
    MissingColumn {
        /// Name of the missing column.
        name: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when a cell cannot be parsed as a number.
    #[error("invalid value '{value}' in column '{column}' at line {line} of {}", path.display())]
    InvalidValue {
        /// Path to the file.
        path: PathBuf,
        /// One-based line number.
        line: u64,
        /// Column name.
        column: String,
        /// Raw cell content.
        value: String,
    },

    /// Returned when a table is structurally unusable.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Errors from model-side validation of the values read.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl IoError {
    pub(crate) fn table(path: impl Into<PathBuf>, err: csv::Error) -> Self {
        Self::Table {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
