/// Errors raised while loading a rule table
#[derive(Debug, thiserror::Error)]
pub enum RuleTableError {
    /// I/O error reading the rule file
    #[error("Failed to read rule table: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML syntax or shape error
    #[error("Failed to parse rule table: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A rule refers to an unknown class or carries invalid masses
    #[error("invalid rule #{index} ({class}): {message}")]
    InvalidRule {
        /// Position in the table, 0-based
        index: usize,
        /// Class named by the rule
        class: String,
        /// Human-readable reason
        message: String,
    },
}
