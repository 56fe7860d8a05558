/// Errors raised by reference store loading and queries
#[derive(Debug, thiserror::Error)]
pub enum ReferenceStoreError {
    /// The store cannot be reached; queries may succeed when retried
    #[error("reference store unavailable: {0}")]
    Unavailable(String),

    /// An entry in the library file is malformed
    #[error("invalid reference entry '{name}': {message}")]
    InvalidEntry {
        /// Entry name or row number
        name: String,
        /// Human-readable reason
        message: String,
    },

    /// Required column missing from the library header
    #[error("Missing required reference column: {0}")]
    MissingColumn(String),

    /// I/O error reading the library
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV/TSV parsing error
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),
}

impl ReferenceStoreError {
    /// True for failures worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, ReferenceStoreError::Unavailable(_))
    }
}
