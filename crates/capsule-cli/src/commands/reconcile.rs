//! Reconcile command - snapshot a journaled ledger for federation handoff.

use std::sync::Arc;

use capsule_ledger::{CreditLedger, ReconciliationSnapshot, Reconciler};

use crate::output::{OutputFormat, print_json};
use crate::theme::Theme;

/// Print one snapshot.
pub(crate) fn print_snapshot(
    snapshot: &ReconciliationSnapshot,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(snapshot),
        OutputFormat::Pretty => {
            let taken_at = snapshot.taken_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
            if snapshot.entry_count == 0 {
                println!("{} empty ledger", Theme::dimmed(&taken_at));
            } else {
                println!(
                    "{} root {} over {} entries",
                    Theme::dimmed(&taken_at),
                    Theme::digest(&snapshot.merkle_root),
                    snapshot.entry_count
                );
            }
            Ok(())
        },
    }
}

/// Take and print a single snapshot of `ledger`.
pub(crate) fn reconcile_once(
    ledger: CreditLedger,
    format: OutputFormat,
) -> anyhow::Result<ReconciliationSnapshot> {
    let snapshot = Reconciler::new(Arc::new(ledger)).reconcile();
    print_snapshot(&snapshot, format)?;
    Ok(snapshot)
}
