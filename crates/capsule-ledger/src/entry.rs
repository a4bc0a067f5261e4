//! Ledger entry type.
//!
//! One entry is recorded per admitted capsule execution. Entries are
//! immutable once built; the ledger is the only place that creates them.

use capsule_core::{CapsuleUri, Telemetry, TelemetryExt, keys};
use serde::{Deserialize, Serialize};

/// An execution receipt in the credit ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    utid: String,
    uri: String,
    delta_credits: f64,
    proof_hash: String,
    credit_root: String,
    timestamp: f64,
}

impl LedgerEntry {
    /// Build an entry from sandbox telemetry.
    ///
    /// Missing string fields become empty. Missing or non-finite numbers
    /// become zero.
    pub(crate) fn from_telemetry(utid: &str, uri: &CapsuleUri, telemetry: &Telemetry) -> Self {
        Self {
            utid: utid.to_string(),
            uri: uri.to_uri(),
            delta_credits: telemetry.f64_field(keys::EXECUTION_COST).unwrap_or(0.0),
            proof_hash: telemetry
                .str_field(keys::PROOF_HASH)
                .unwrap_or_default()
                .to_string(),
            credit_root: telemetry
                .str_field(keys::CREDIT_ROOT)
                .unwrap_or_default()
                .to_string(),
            timestamp: telemetry.f64_field(keys::TIMESTAMP_EPOCH).unwrap_or(0.0),
        }
    }

    /// The execution's UTID.
    #[must_use]
    pub fn utid(&self) -> &str {
        &self.utid
    }

    /// Canonical URI of the executed capsule.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Credits charged for the execution.
    #[must_use]
    pub fn delta_credits(&self) -> f64 {
        self.delta_credits
    }

    /// Proof hash reported by the sandbox.
    #[must_use]
    pub fn proof_hash(&self) -> &str {
        &self.proof_hash
    }

    /// Credit root the execution was accounted against.
    #[must_use]
    pub fn credit_root(&self) -> &str {
        &self.credit_root
    }

    /// Execution time in seconds since the Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }
}
