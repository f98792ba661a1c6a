use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or reshaping tabular data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("sheet index {index} out of range: workbook has {count} sheet(s)")]
    SheetOutOfRange { index: usize, count: usize },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("sheet has no header row")]
    Empty,

    #[error("sheet row {row}, column '{column}': cannot parse '{value}'")]
    Parse {
        /// 1-based row as a spreadsheet shows it; the header is row 1.
        row: usize,
        column: String,
        value: String,
    },

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("reading workbook")]
    Workbook(#[from] calamine::Error),

    #[error("reading CSV")]
    Csv(#[from] csv::Error),

    #[error("reading parquet")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("converting arrow column")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parsing JSON")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
