//! Core error types.

use thiserror::Error;

/// Errors produced by core capsule types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The input is not a well-formed `capsule://` URI.
    #[error("malformed capsule URI '{uri}': {reason}")]
    MalformedUri {
        /// The offending input.
        uri: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl CoreError {
    pub(crate) fn malformed(uri: &str, reason: impl Into<String>) -> Self {
        Self::MalformedUri {
            uri: uri.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
