/// Errors raised while loading or validating the pipeline configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value is outside its allowed range
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// I/O error reading the config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML syntax or type error
    #[error("Failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),
}
