//! Ledger error types.

use thiserror::Error;

/// Errors that can occur with the credit ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A UTID was appended twice. This is a protocol violation, not a
    /// retryable condition.
    #[error("duplicate UTID rejected: {utid}")]
    DuplicateUtid {
        /// The replayed UTID.
        utid: String,
    },

    /// The UTID is not in the ledger.
    #[error("UTID not found in ledger: {utid}")]
    UnknownUtid {
        /// The UTID that was looked up.
        utid: String,
    },

    /// UTIDs must be non-empty.
    #[error("empty UTID")]
    EmptyUtid,

    /// Journal I/O failed.
    #[error("journal error: {0}")]
    Journal(#[from] std::io::Error),

    /// A journal record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The journal contents violate ledger invariants.
    #[error("corrupt journal at line {line}: {reason}")]
    CorruptJournal {
        /// 1-based line number.
        line: usize,
        /// Why the record was rejected.
        reason: String,
    },
}

impl LedgerError {
    /// Whether this error is a protocol violation that must not be retried
    /// or swallowed.
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::DuplicateUtid { .. } | Self::CorruptJournal { .. })
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
