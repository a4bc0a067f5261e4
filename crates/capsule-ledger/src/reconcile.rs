//! Reconciliation daemon.
//!
//! Takes point-in-time snapshots of the ledger root for handoff to an
//! external federation process. Snapshots are neither persisted nor signed
//! here.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::ledger::CreditLedger;

/// A point-in-time view of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSnapshot {
    /// Merkle root at snapshot time (empty for an empty ledger).
    pub merkle_root: String,
    /// Number of entries covered by the root.
    pub entry_count: usize,
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
}

/// Produces ledger snapshots on demand or on a timer.
#[derive(Debug, Clone)]
pub struct Reconciler {
    ledger: Arc<CreditLedger>,
}

impl Reconciler {
    /// Create a reconciler over a shared ledger.
    #[must_use]
    pub fn new(ledger: Arc<CreditLedger>) -> Self {
        Self { ledger }
    }

    /// Snapshot the ledger now.
    ///
    /// Root and count are read under the same lock, so they always agree.
    #[must_use]
    pub fn reconcile(&self) -> ReconciliationSnapshot {
        let (merkle_root, entry_count) = self.ledger.root_and_count();
        ReconciliationSnapshot {
            merkle_root,
            entry_count,
            taken_at: Utc::now(),
        }
    }

    /// Spawn a background loop that snapshots the ledger every `interval`.
    ///
    /// The returned handle holds the latest snapshot; dropping it stops the
    /// loop. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(self, interval: Duration) -> ReconciliationHandle {
        let (tx, rx) = watch::channel(self.reconcile());

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately and the channel already
            // holds that snapshot.
            ticker.tick().await;
            loop {
                ticker.tick().await;

                let snapshot = self.reconcile();
                let changed = tx.borrow().merkle_root != snapshot.merkle_root;
                if changed {
                    info!(
                        merkle_root = %snapshot.merkle_root,
                        entry_count = snapshot.entry_count,
                        "Ledger reconciled"
                    );
                } else {
                    debug!(entry_count = snapshot.entry_count, "Ledger unchanged");
                }
                tx.send_replace(snapshot);

                if tx.is_closed() {
                    break;
                }
            }
        });

        ReconciliationHandle {
            snapshots: rx,
            _task: AbortOnDrop(task),
        }
    }
}

/// Aborts the wrapped task when dropped.
#[derive(Debug)]
struct AbortOnDrop(tokio::task::JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Handle to a running reconciliation loop.
#[derive(Debug)]
pub struct ReconciliationHandle {
    snapshots: watch::Receiver<ReconciliationSnapshot>,
    _task: AbortOnDrop,
}

impl ReconciliationHandle {
    /// The most recent snapshot.
    #[must_use]
    pub fn latest(&self) -> ReconciliationSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified on every new snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ReconciliationSnapshot> {
        self.snapshots.clone()
    }
}
