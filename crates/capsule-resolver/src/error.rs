//! Resolver and collaborator error types.

use std::path::PathBuf;

use capsule_core::Telemetry;
use capsule_ledger::LedgerError;
use thiserror::Error;

/// Failure reported by a registry or mesh backend.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend returned something it should not have.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors that escape [`CapsuleResolver::resolve`](crate::CapsuleResolver::resolve).
///
/// Everything else becomes a non-200 [`ResolutionResult`](crate::ResolutionResult).
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The local registry failed (as opposed to missing the capsule).
    #[error("registry lookup failed: {0}")]
    Registry(#[source] CollaboratorError),

    /// The mesh client failed (as opposed to missing the capsule).
    #[error("mesh lookup failed: {0}")]
    Mesh(#[source] CollaboratorError),

    /// The ledger refused to record an execution.
    #[error("ledger rejected execution: {0}")]
    Ledger(#[from] LedgerError),
}

impl ResolverError {
    /// Whether this error is a protocol violation that must not be retried.
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::Ledger(e) if e.is_protocol_violation())
    }
}

/// Result type for resolution.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// A sandbox execution failure.
///
/// Carries whatever telemetry the sandbox gathered before failing so it can
/// be surfaced on the `EXECUTION_ERROR` result.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SandboxError {
    /// Human-readable failure description.
    pub message: String,
    /// Partial telemetry collected before the failure.
    pub telemetry: Telemetry,
}

impl SandboxError {
    /// Create an error with no partial telemetry.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            telemetry: Telemetry::new(),
        }
    }

    /// Attach partial telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }
}

/// Errors from the sovereign capsule lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The manifest could not be read.
    #[error("failed to read manifest {path}: {source}")]
    ManifestIo {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest is not valid TOML for a sovereign capsule.
    #[error("invalid manifest {path}: {source}")]
    ManifestParse {
        /// Manifest path.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// The ignition hook failed.
    #[error("ignition failed: {0}")]
    Ignition(String),
}
