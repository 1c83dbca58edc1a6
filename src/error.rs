//! Structural errors that abort a preparation run.
//!
//! Data-quality problems (unparseable dates, unmatched joins, empty groups)
//! are not represented here; they are recovered locally and counted.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepareError {
    /// A required key or feature column is absent from an input table.
    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// An input or output file could not be opened.
    #[error("failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The CSV framing itself is broken (not a single bad value).
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PrepareError {
    pub fn missing_column(table: &str, column: &str) -> Self {
        PrepareError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        PrepareError::Io {
            path: path.into(),
            source,
        }
    }
}
