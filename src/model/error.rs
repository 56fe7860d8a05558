/// Errors raised by model artifacts
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The artifact is missing or inconsistent; fatal when loading
    #[error("model artifact error: {0}")]
    Artifact(String),

    /// The model failed on one input
    #[error("prediction failed: {0}")]
    Prediction(String),

    /// I/O error reading an artifact
    #[error("Failed to read model artifact: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON deserialization error
    #[error("JSON deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}
