//! Capsule Ledger - Append-only credit ledger for capsule executions.
//!
//! This crate provides:
//! - Immutable execution receipts keyed by UTID ([`LedgerEntry`])
//! - At-most-once admission per UTID behind a single lock ([`CreditLedger`])
//! - Merkle roots and inclusion proofs derived from the entry log
//! - Optional JSON-lines journaling for restart recovery
//! - Periodic root snapshots for external reconciliation ([`Reconciler`])
//!
//! # Security Model
//!
//! A UTID may be admitted exactly once. A second append for the same UTID
//! means a replay or a lineage bug upstream, so it fails with
//! [`LedgerError::DuplicateUtid`] and leaves the ledger untouched. Callers
//! must treat that error as fatal.
//!
//! # Example
//!
//! ```
//! use capsule_core::{CapsuleUri, Telemetry};
//! use capsule_ledger::CreditLedger;
//!
//! let ledger = CreditLedger::new();
//! let uri = CapsuleUri::parse("capsule://fusion/mhd64/solve").unwrap();
//!
//! let mut telemetry = Telemetry::new();
//! telemetry.insert("execution_cost".into(), 2.5.into());
//!
//! let entry = ledger.append_execution("utid-1", &uri, &telemetry).unwrap();
//! assert_eq!(entry.delta_credits(), 2.5);
//!
//! // Replays are rejected.
//! assert!(ledger.append_execution("utid-1", &uri, &telemetry).is_err());
//!
//! // Inclusion proofs verify against the current root.
//! let proof = ledger.merkle_proof("utid-1").unwrap();
//! assert!(CreditLedger::verify_proof("utid-1", &proof.root, &proof.path));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod entry;
mod error;
mod journal;
mod ledger;
mod reconcile;

pub use entry::LedgerEntry;
pub use error::{LedgerError, LedgerResult};
pub use journal::{JsonlJournal, LedgerJournal, MemoryJournal};
pub use ledger::{CreditLedger, MerkleProof};
pub use reconcile::{ReconciliationHandle, ReconciliationSnapshot, Reconciler};

// Re-export proof types for convenience
pub use capsule_crypto::{Direction, ProofStep};
