/// Errors raised at the feature ingestion boundary
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// I/O error reading the feature table
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV/TSV parsing error
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// Required column missing from the header
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Malformed MS2 encoding for one row
    #[error("spectrum parse error for feature '{index}': {message}")]
    SpectrumParse {
        /// Row key
        index: String,
        /// Parser message
        message: String,
    },

    /// A scalar column could not be interpreted
    #[error("invalid value in column '{column}' for feature '{index}': {message}")]
    InvalidField {
        /// Row key
        index: String,
        /// Column name
        column: String,
        /// Human-readable reason
        message: String,
    },

    /// Row key seen twice
    #[error("duplicate feature index '{0}'")]
    DuplicateIndex(String),
}

impl IngestError {
    pub(crate) fn invalid_field(
        index: &str,
        column: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            index: index.to_string(),
            column: column.to_string(),
            message: message.into(),
        }
    }

    /// Row key the error refers to, when it is a row-level error
    pub fn row_index(&self) -> Option<&str> {
        match self {
            IngestError::SpectrumParse { index, .. } | IngestError::InvalidField { index, .. } => {
                Some(index)
            }
            IngestError::DuplicateIndex(index) => Some(index),
            _ => None,
        }
    }

    /// Short error kind label for reports
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::IoError(_) => "io",
            IngestError::CsvError(_) => "csv",
            IngestError::MissingColumn(_) => "missing_column",
            IngestError::SpectrumParse { .. } => "spectrum_parse",
            IngestError::InvalidField { .. } => "invalid_field",
            IngestError::DuplicateIndex(_) => "duplicate_index",
        }
    }
}
