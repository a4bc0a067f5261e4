//! Resolution status codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal outcome of a single resolution.
///
/// Codes follow HTTP conventions so they can be surfaced unchanged by an
/// outer API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    /// Capsule resolved and executed.
    Executed,
    /// Reserved for branch/fork outcomes.
    Forked,
    /// URI failed to parse.
    BadUri,
    /// Reserved.
    Unauthorized,
    /// Reserved.
    InsufficientCredits,
    /// No registry or mesh entry.
    NotFound,
    /// UTID/credit-root verification failed.
    SignatureMismatch,
    /// The sandbox failed during execution.
    ExecutionError,
    /// No sandbox collaborator configured.
    NotImplemented,
}

impl ResolutionStatus {
    /// Every status, in code order.
    pub const ALL: [Self; 9] = [
        Self::Executed,
        Self::Forked,
        Self::BadUri,
        Self::Unauthorized,
        Self::InsufficientCredits,
        Self::NotFound,
        Self::SignatureMismatch,
        Self::ExecutionError,
        Self::NotImplemented,
    ];

    /// Numeric status code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Executed => 200,
            Self::Forked => 201,
            Self::BadUri => 400,
            Self::Unauthorized => 401,
            Self::InsufficientCredits => 402,
            Self::NotFound => 404,
            Self::SignatureMismatch => 409,
            Self::ExecutionError => 500,
            Self::NotImplemented => 501,
        }
    }

    /// Upper-case status name as it appears on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Executed => "EXECUTED",
            Self::Forked => "FORKED",
            Self::BadUri => "BAD_URI",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InsufficientCredits => "INSUFFICIENT_CREDITS",
            Self::NotFound => "NOT_FOUND",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::ExecutionError => "EXECUTION_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
        }
    }

    /// Look up a status by its numeric code.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Whether the code is in the 2xx range.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Executed | Self::Forked)
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ResolutionStatus::Executed.code(), 200);
        assert_eq!(ResolutionStatus::NotFound.code(), 404);
        assert_eq!(ResolutionStatus::SignatureMismatch.code(), 409);
        assert_eq!(ResolutionStatus::NotImplemented.code(), 501);
    }

    #[test]
    fn test_from_code() {
        for status in ResolutionStatus::ALL {
            assert_eq!(ResolutionStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(ResolutionStatus::from_code(418), None);
    }

    #[test]
    fn test_serde_uses_wire_name() {
        for status in ResolutionStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.name()));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ResolutionStatus::BadUri.to_string(), "400 BAD_URI");
        assert!(ResolutionStatus::Executed.is_success());
        assert!(!ResolutionStatus::ExecutionError.is_success());
    }
}
