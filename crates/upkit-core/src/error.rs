use thiserror::Error;

/// Top-level error type for upkit.
///
/// Subsystem crates define their own error types and wrap this one with
/// `#[from]` so that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpkitError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid option `{field}`: {reason}")]
    InvalidOption { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Upload error: {0}")]
    Upload(String),
}

impl UpkitError {
    /// Shorthand for an [`UpkitError::InvalidOption`].
    pub fn invalid_option(field: impl Into<String>, reason: impl Into<String>) -> Self {
        UpkitError::InvalidOption {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for UpkitError {
    fn from(err: toml::de::Error) -> Self {
        UpkitError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for UpkitError {
    fn from(err: toml::ser::Error) -> Self {
        UpkitError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for UpkitError {
    fn from(err: serde_json::Error) -> Self {
        UpkitError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for upkit operations.
pub type Result<T> = std::result::Result<T, UpkitError>;
