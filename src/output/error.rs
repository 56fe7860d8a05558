/// Errors raised while writing output artifacts
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// I/O error creating or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV writing error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON writing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Arrow batch construction error
    #[cfg(feature = "parquet_output")]
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Parquet encoding error
    #[cfg(feature = "parquet_output")]
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),
}
