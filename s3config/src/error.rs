use thiserror::Error;

pub type S3ConfigResult<T> = Result<T, S3ConfigError>;

/// Errors produced while fetching an object from the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Access denied: {reason}")]
    Auth { reason: String },

    #[error("Transport failure: {reason}")]
    Transport { reason: String },
}

/// Error raised by an [`ObjectParser`](crate::parser::ObjectParser) on
/// malformed payloads.
#[derive(Debug, Error)]
#[error("Failed to parse configuration payload: {reason}")]
pub struct ParseError {
    pub reason: String,
}

impl ParseError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Top-level error for building and loading a configuration source.
#[derive(Debug, Error)]
pub enum S3ConfigError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl S3ConfigError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True when the error means the object simply does not exist, as opposed
    /// to a transport or credential problem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound { .. }))
    }
}
