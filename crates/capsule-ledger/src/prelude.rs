//! Prelude module - commonly used types for convenient import.
//!
//! Use `use capsule_ledger::prelude::*;` to import all essential types.

// Errors
pub use crate::{LedgerError, LedgerResult};

// Ledger
pub use crate::{CreditLedger, LedgerEntry, MerkleProof};

// Persistence
pub use crate::{JsonlJournal, LedgerJournal, MemoryJournal};

// Reconciliation
pub use crate::{ReconciliationHandle, ReconciliationSnapshot, Reconciler};
