use thiserror::Error;

/// A policy document that failed validation.
///
/// `field` is the path of the offending field using the raw document's names
/// (e.g. `packageRules[2].matchManagers`), or `<document>` when the document
/// could not be parsed at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ConfigError {
    pub field: String,
    pub reason: String,
}

impl ConfigError {
    /// Create a validation error for a specific field
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an error for a document that could not be parsed
    pub fn document(reason: impl Into<String>) -> Self {
        ConfigError::new("<document>", reason)
    }
}

/// Unified error type for update-policy operations
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid candidate input: {0}")]
    Candidates(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in update-policy
pub type Result<T> = std::result::Result<T, PolicyError>;

impl PolicyError {
    /// Create a candidate input error with context
    pub fn candidates(msg: impl Into<String>) -> Self {
        PolicyError::Candidates(msg.into())
    }
}
