//! Credit ledger - the main interface for recording executions.
//!
//! The ledger owns its entry log exclusively. Admission (duplicate check,
//! journal write and in-memory append) happens under a single lock, so two
//! concurrent appends of one UTID can never both succeed. Merkle roots and
//! proofs are recomputed from the entry log on demand and never stored.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use capsule_core::{CapsuleUri, Telemetry};
use capsule_crypto::{MerkleTree, ProofStep};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::entry::LedgerEntry;
use crate::error::{LedgerError, LedgerResult};
use crate::journal::{JsonlJournal, LedgerJournal};

/// An inclusion proof for one UTID against the ledger root it was taken at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The proven UTID.
    pub utid: String,
    /// Root the path reconstructs.
    pub root: String,
    /// Sibling steps from leaf to root.
    pub path: Vec<ProofStep>,
}

#[derive(Default)]
struct LedgerState {
    entries: Vec<LedgerEntry>,
    // UTID -> position in `entries`
    index: HashMap<String, usize>,
}

impl LedgerState {
    fn admit(&mut self, entry: LedgerEntry) {
        let position = self.entries.len();
        self.index.insert(entry.utid().to_string(), position);
        self.entries.push(entry);
    }

    fn tree(&self) -> MerkleTree {
        MerkleTree::from_leaves(self.entries.iter().map(LedgerEntry::utid))
    }
}

/// Append-only credit ledger keyed by UTID.
pub struct CreditLedger {
    state: Mutex<LedgerState>,
    journal: Option<Box<dyn LedgerJournal>>,
}

impl CreditLedger {
    /// Create an empty, memory-only ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            journal: None,
        }
    }

    /// Create a ledger backed by a journal, replaying its existing records.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be read or records the same
    /// UTID twice.
    pub fn with_journal(journal: Box<dyn LedgerJournal>) -> LedgerResult<Self> {
        let mut state = LedgerState::default();
        for (position, entry) in journal.load()?.into_iter().enumerate() {
            if state.index.contains_key(entry.utid()) {
                return Err(LedgerError::CorruptJournal {
                    line: position.saturating_add(1),
                    reason: format!("duplicate UTID {}", entry.utid()),
                });
            }
            state.admit(entry);
        }
        debug!(entries = state.entries.len(), "Replayed ledger journal");

        Ok(Self {
            state: Mutex::new(state),
            journal: Some(journal),
        })
    }

    /// Open a ledger persisted to a JSON-lines journal at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be opened or replayed.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        Self::with_journal(Box::new(JsonlJournal::open(path)?))
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // Admission mutates `entries` and `index` together after every
        // fallible step, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(|e| {
            warn!("CreditLedger lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Record an execution.
    ///
    /// `proof_hash`, `credit_root`, `execution_cost` and `timestamp_epoch`
    /// are read from `telemetry`, defaulting to empty or zero.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateUtid`] if `utid` was already admitted.
    /// This is a protocol violation and must not be retried. Also fails if
    /// `utid` is empty or the journal write fails; in every failure case the
    /// ledger is left unchanged.
    pub fn append_execution(
        &self,
        utid: &str,
        uri: &CapsuleUri,
        telemetry: &Telemetry,
    ) -> LedgerResult<LedgerEntry> {
        if utid.is_empty() {
            return Err(LedgerError::EmptyUtid);
        }

        let mut state = self.lock();
        if state.index.contains_key(utid) {
            error!(utid, uri = %uri, "Duplicate UTID append rejected");
            return Err(LedgerError::DuplicateUtid {
                utid: utid.to_string(),
            });
        }

        let entry = LedgerEntry::from_telemetry(utid, uri, telemetry);
        if let Some(journal) = &self.journal {
            journal.record(&entry)?;
        }
        state.admit(entry.clone());

        info!(
            utid,
            uri = %uri,
            delta_credits = entry.delta_credits(),
            entries = state.entries.len(),
            "Execution recorded"
        );
        Ok(entry)
    }

    /// Check a UTID against a credit root.
    ///
    /// True iff `utid` is non-empty and a credit root is supplied. Real
    /// signature checking belongs to a key-management layer.
    #[must_use]
    pub fn verify_utid(&self, utid: &str, credit_root: &str) -> bool {
        !utid.is_empty() && !credit_root.is_empty()
    }

    /// Current Merkle root, or the empty string for an empty ledger.
    #[must_use]
    pub fn merkle_root(&self) -> String {
        self.lock().tree().root()
    }

    /// Inclusion proof for `utid` against the current root.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownUtid`] if the UTID is not in the ledger.
    pub fn merkle_proof(&self, utid: &str) -> LedgerResult<MerkleProof> {
        let state = self.lock();
        let unknown = || LedgerError::UnknownUtid {
            utid: utid.to_string(),
        };
        let position = *state.index.get(utid).ok_or_else(unknown)?;
        let tree = state.tree();
        let path = tree.proof(position).ok_or_else(unknown)?;

        Ok(MerkleProof {
            utid: utid.to_string(),
            root: tree.root(),
            path,
        })
    }

    /// Replay `path` from the hashed `utid` and compare against `root`.
    #[must_use]
    pub fn verify_proof(utid: &str, root: &str, path: &[ProofStep]) -> bool {
        capsule_crypto::verify_proof(utid, root, path)
    }

    /// Root and entry count taken under one lock.
    pub(crate) fn root_and_count(&self) -> (String, usize) {
        let state = self.lock();
        (state.tree().root(), state.entries.len())
    }

    /// Number of admitted entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the ledger has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Look up an entry by UTID.
    #[must_use]
    pub fn get(&self, utid: &str) -> Option<LedgerEntry> {
        let state = self.lock();
        state
            .index
            .get(utid)
            .and_then(|&position| state.entries.get(position))
            .cloned()
    }

    /// Snapshot of all entries in admission order.
    #[must_use]
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.lock().entries.clone()
    }

    /// Sum of `delta_credits` across all entries.
    #[must_use]
    pub fn total_credits(&self) -> f64 {
        self.lock()
            .entries
            .iter()
            .map(LedgerEntry::delta_credits)
            .sum()
    }

    /// Flush the journal, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal flush fails.
    pub fn flush(&self) -> LedgerResult<()> {
        match &self.journal {
            Some(journal) => journal.flush(),
            None => Ok(()),
        }
    }
}

impl Default for CreditLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CreditLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditLedger")
            .field("entries", &self.len())
            .field("journaled", &self.journal.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::MemoryJournal;
    use capsule_crypto::Direction;
    use serde_json::json;
    use std::sync::Arc;

    fn uri() -> CapsuleUri {
        CapsuleUri::parse("capsule://fusion/mhd64/solve/v4.1").unwrap()
    }

    fn cost(amount: f64) -> Telemetry {
        let mut telemetry = Telemetry::new();
        telemetry.insert("execution_cost".into(), json!(amount));
        telemetry
    }

    struct BrokenJournal;

    impl LedgerJournal for BrokenJournal {
        fn record(&self, _entry: &LedgerEntry) -> LedgerResult<()> {
            Err(std::io::Error::other("disk full").into())
        }

        fn load(&self) -> LedgerResult<Vec<LedgerEntry>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = CreditLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.merkle_root(), "");
        assert!(matches!(
            ledger.merkle_proof("nope"),
            Err(LedgerError::UnknownUtid { .. })
        ));
    }

    #[test]
    fn test_append_and_lookup() {
        let ledger = CreditLedger::new();
        let entry = ledger.append_execution("a", &uri(), &cost(1.5)).unwrap();
        ledger.append_execution("b", &uri(), &cost(2.0)).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get("a"), Some(entry));
        assert!(ledger.get("c").is_none());
        assert!((ledger.total_credits() - 3.5).abs() < f64::EPSILON);
        assert_eq!(ledger.entries()[1].utid(), "b");
    }

    #[test]
    fn test_duplicate_leaves_ledger_unchanged() {
        let ledger = CreditLedger::new();
        ledger.append_execution("a", &uri(), &cost(1.0)).unwrap();
        ledger.append_execution("b", &uri(), &cost(1.0)).unwrap();
        let root_before = ledger.merkle_root();

        let err = ledger.append_execution("a", &uri(), &cost(9.0)).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateUtid { ref utid } if utid == "a"));
        assert!(err.is_protocol_violation());

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.merkle_root(), root_before);
        assert!((ledger.get("a").unwrap().delta_credits() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_utid_rejected() {
        let ledger = CreditLedger::new();
        assert!(matches!(
            ledger.append_execution("", &uri(), &cost(1.0)),
            Err(LedgerError::EmptyUtid)
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_verify_utid() {
        let ledger = CreditLedger::new();
        assert!(ledger.verify_utid("fake", "root"));
        assert!(!ledger.verify_utid("", "root"));
        assert!(!ledger.verify_utid("fake", ""));
    }

    #[test]
    fn test_root_matches_three_leaf_construction() {
        use capsule_crypto::{combine, leaf_hash};

        let ledger = CreditLedger::new();
        for utid in ["a", "b", "c"] {
            ledger.append_execution(utid, &uri(), &cost(1.0)).unwrap();
        }

        let (a, b, c) = (leaf_hash("a"), leaf_hash("b"), leaf_hash("c"));
        assert_eq!(
            ledger.merkle_root(),
            combine(&combine(&a, &b), &combine(&c, &c))
        );
    }

    #[test]
    fn test_proofs_verify_for_every_member() {
        let ledger = CreditLedger::new();
        let utids: Vec<String> = (0..7).map(|i| format!("utid-{i}")).collect();
        for utid in &utids {
            ledger.append_execution(utid, &uri(), &cost(1.0)).unwrap();
        }

        let root = ledger.merkle_root();
        for utid in &utids {
            let proof = ledger.merkle_proof(utid).unwrap();
            assert_eq!(proof.root, root);
            assert!(CreditLedger::verify_proof(utid, &proof.root, &proof.path));
        }

        let mut proof = ledger.merkle_proof("utid-2").unwrap();
        proof.path[0].direction = match proof.path[0].direction {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        };
        assert!(!CreditLedger::verify_proof("utid-2", &proof.root, &proof.path));
    }

    #[test]
    fn test_concurrent_duplicate_admitted_once() {
        let ledger = Arc::new(CreditLedger::new());
        let uri = uri();

        let successes = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let ledger = Arc::clone(&ledger);
                    let uri = uri.clone();
                    scope.spawn(move || ledger.append_execution("same", &uri, &cost(1.0)).is_ok())
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(successes, 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_journal_failure_rejects_append() {
        let ledger = CreditLedger::with_journal(Box::new(BrokenJournal)).unwrap();
        let err = ledger.append_execution("a", &uri(), &cost(1.0)).unwrap_err();

        assert!(matches!(err, LedgerError::Journal(_)));
        assert!(ledger.is_empty());
        assert!(ledger.get("a").is_none());
    }

    #[test]
    fn test_replay_rejects_duplicate_records() {
        let seed = CreditLedger::new();
        let entry = seed.append_execution("a", &uri(), &cost(1.0)).unwrap();
        let journal = MemoryJournal::with_entries(vec![entry.clone(), entry]);

        let err = CreditLedger::with_journal(Box::new(journal)).unwrap_err();
        assert!(matches!(err, LedgerError::CorruptJournal { line: 2, .. }));
    }

    #[test]
    fn test_non_finite_telemetry_keeps_journal_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        let mut telemetry = Telemetry::new();
        telemetry.insert("execution_cost".into(), json!("NaN"));
        telemetry.insert("timestamp_epoch".into(), json!("1e400"));
        {
            let ledger = CreditLedger::open(&path).unwrap();
            let entry = ledger.append_execution("a", &uri(), &telemetry).unwrap();
            assert!(entry.delta_credits().abs() < f64::EPSILON);
            assert!(entry.timestamp().abs() < f64::EPSILON);
            ledger.flush().unwrap();
        }

        let reopened = CreditLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert!(reopened.get("a").unwrap().delta_credits().is_finite());
    }

    #[test]
    fn test_open_replays_jsonl_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        let root = {
            let ledger = CreditLedger::open(&path).unwrap();
            ledger.append_execution("a", &uri(), &cost(1.0)).unwrap();
            ledger.append_execution("b", &uri(), &cost(2.0)).unwrap();
            ledger.flush().unwrap();
            ledger.merkle_root()
        };

        let reopened = CreditLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.merkle_root(), root);
        assert!(matches!(
            reopened.append_execution("a", &uri(), &cost(1.0)),
            Err(LedgerError::DuplicateUtid { .. })
        ));
    }
}
