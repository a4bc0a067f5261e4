//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur when decoding digests.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid hex encoding.
    #[error("invalid hex encoding")]
    InvalidHexEncoding,

    /// Decoded bytes have the wrong length for a digest.
    #[error("invalid digest length: expected {expected}, got {actual}")]
    InvalidDigestLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
