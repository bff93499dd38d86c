use chrono::NaiveDate;
use thiserror::Error;

/// Failure while loading the transactions dataset. Fatal at startup.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Line {line}: empty value in required column '{column}'")]
    MissingValue { line: usize, column: String },

    #[error("Line {line}: cannot parse '{value}' in column '{column}' as a timestamp")]
    InvalidTimestamp {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Line {line}: cannot parse '{value}' in column '{column}' as a number")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("Dataset contains no rows")]
    EmptyDataset,
}

/// A date range whose start falls after its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("start date {start} is after end date {end}")]
pub struct InvalidRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}
