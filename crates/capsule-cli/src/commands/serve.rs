//! Serve command - resolve URIs read line by line while the reconciliation
//! daemon snapshots the ledger in the background.
//!
//! Blank lines and lines starting with `#` are skipped. Serving stops at end
//! of input, on Ctrl+C, or at the first error that escapes the resolver. A
//! duplicate UTID is such an error.

use std::time::Duration;

use capsule_ledger::{ReconciliationSnapshot, Reconciler};
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use crate::commands::reconcile::print_snapshot;
use crate::commands::resolve::{Pipeline, ResolveReport};
use crate::output::OutputFormat;
use crate::theme::Theme;

/// Serve URIs from `input` until it ends. Returns the final snapshot.
pub(crate) async fn serve<R>(
    pipeline: Pipeline,
    input: R,
    interval: Duration,
    format: OutputFormat,
) -> anyhow::Result<ReconciliationSnapshot>
where
    R: AsyncBufRead + Unpin,
{
    let mut events = pipeline.bus.subscribe();
    let handle = Reconciler::new(pipeline.ledger.clone()).spawn(interval);
    let mut snapshots = handle.subscribe();
    let mut last_root = handle.latest().merkle_root;
    let mut lines = input.lines();

    info!(
        interval_secs = interval.as_secs(),
        entries = pipeline.ledger.len(),
        "Serving capsule resolutions"
    );

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let uri = line.trim();
                if uri.is_empty() || uri.starts_with('#') {
                    continue;
                }
                let report = pipeline.run(uri, &mut events)?;
                print_resolution(&report, format)?;
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.merkle_root != last_root {
                    last_root.clone_from(&snapshot.merkle_root);
                    print_snapshot(&snapshot, format)?;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let snapshot = Reconciler::new(pipeline.ledger.clone()).reconcile();
    info!(
        merkle_root = %snapshot.merkle_root,
        entry_count = snapshot.entry_count,
        "Stopped serving"
    );
    Ok(snapshot)
}

fn print_resolution(report: &ResolveReport, format: OutputFormat) -> anyhow::Result<()> {
    let result = &report.result;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&json!({ "resolution": report }))?);
        },
        OutputFormat::Pretty => {
            let uri = result
                .uri
                .as_ref()
                .map_or_else(|| result.message.clone(), |u| u.to_uri());
            let utid = result.utid.as_deref().map(Theme::digest).unwrap_or_default();
            println!("{} {uri} {utid}", Theme::status(result.status));
        },
    }
    Ok(())
}
