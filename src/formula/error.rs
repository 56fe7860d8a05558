/// Errors raised by formula decomposition
#[derive(Debug, thiserror::Error)]
pub enum DecomposerError {
    /// Temporary failure; the call may be retried
    #[error("decomposer temporarily unavailable: {0}")]
    Transient(String),

    /// Permanent failure of the decomposer
    #[error("decomposer failed: {0}")]
    Fatal(String),

    /// The feature cannot be decomposed (unknown adduct, no precursor)
    #[error("invalid decomposition input: {0}")]
    InvalidInput(String),

    /// I/O error talking to the decomposer
    #[error("decomposer I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unreadable decomposer output
    #[error("cannot parse decomposer output: {0}")]
    CsvError(#[from] csv::Error),
}

impl DecomposerError {
    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, DecomposerError::Transient(_))
    }
}
