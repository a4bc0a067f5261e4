//! Ledger command - inspect and audit a journaled credit ledger.

use std::path::Path;

use anyhow::{Context, bail};
use capsule_config::Config;
use capsule_ledger::{CreditLedger, MerkleProof};
use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use crate::config_bridge;
use crate::output::{OutputFormat, print_json};
use crate::theme::Theme;

/// Open the journal named on the command line or in config.
///
/// Fails if no journal is configured or the file does not exist, so an
/// audit never silently runs against a fresh, empty ledger.
pub(crate) fn open_journal(
    config: &Config,
    cli_override: Option<&Path>,
) -> anyhow::Result<CreditLedger> {
    let Some(path) = config_bridge::journal_path(config, cli_override) else {
        bail!("no ledger journal configured; pass --journal or set ledger.journal_path");
    };
    if !path.is_file() {
        bail!("ledger journal not found: {}", path.display());
    }
    CreditLedger::open(&path).with_context(|| format!("failed to open {}", path.display()))
}

/// Print the current Merkle root.
pub(crate) fn show_root(ledger: &CreditLedger, format: OutputFormat) -> anyhow::Result<()> {
    let root = ledger.merkle_root();
    match format {
        OutputFormat::Json => print_json(&json!({
            "merkle_root": root,
            "entry_count": ledger.len(),
            "total_credits": ledger.total_credits(),
        })),
        OutputFormat::Pretty => {
            if ledger.is_empty() {
                println!("{}", Theme::info("Ledger is empty"));
            } else {
                println!("{root}");
            }
            Ok(())
        },
    }
}

/// List every entry in insertion order.
pub(crate) fn list_entries(ledger: &CreditLedger, format: OutputFormat) -> anyhow::Result<()> {
    let entries = ledger.entries();
    if format == OutputFormat::Json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("{}", Theme::info("No ledger entries"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Ledger Entries"));
    println!(
        "{:<18} {:>10} {}",
        "UTID".dimmed(),
        "CREDITS".dimmed(),
        "URI".dimmed()
    );
    println!("{}", Theme::separator());
    for entry in &entries {
        println!(
            "{:<18} {:>10.4} {}",
            Theme::digest(entry.utid()),
            entry.delta_credits(),
            entry.uri()
        );
    }
    println!("{}", Theme::separator());
    println!(
        "{} entries, {:.4} credits",
        entries.len(),
        ledger.total_credits()
    );
    println!();
    Ok(())
}

/// Print the inclusion proof for `utid`.
pub(crate) fn show_proof(
    ledger: &CreditLedger,
    utid: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let proof = ledger.merkle_proof(utid)?;
    if format == OutputFormat::Json {
        return print_json(&proof);
    }

    println!("\n{}", Theme::header("Inclusion Proof"));
    println!("{}", Theme::kv("UTID", &Theme::digest(&proof.utid)));
    println!("{}", Theme::kv("Root", &Theme::digest(&proof.root)));
    println!("{}", Theme::kv("Depth", &proof.path.len().to_string()));
    for (level, step) in proof.path.iter().enumerate() {
        println!(
            "  {level:>3} {:<6} {}",
            format!("{:?}", step.direction),
            Theme::digest(&step.sibling)
        );
    }
    println!();
    Ok(())
}

/// Outcome of checking a UTID's inclusion against a root.
#[derive(Debug, Serialize)]
pub(crate) struct Verification {
    pub(crate) utid: String,
    pub(crate) root: String,
    pub(crate) valid: bool,
}

/// Check `utid` against the ledger's root, or against `expected_root`
/// if given (e.g. a root recorded by an earlier reconciliation).
pub(crate) fn check_inclusion(
    ledger: &CreditLedger,
    utid: &str,
    expected_root: Option<&str>,
) -> anyhow::Result<Verification> {
    let MerkleProof { root, path, .. } = ledger.merkle_proof(utid)?;
    let root = expected_root.map_or(root, str::to_owned);
    let valid = CreditLedger::verify_proof(utid, &root, &path);
    Ok(Verification {
        utid: utid.to_owned(),
        root,
        valid,
    })
}

/// Verify `utid`'s inclusion and print the verdict.
pub(crate) fn verify_entry(
    ledger: &CreditLedger,
    utid: &str,
    expected_root: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let verification = check_inclusion(ledger, utid, expected_root)?;
    if format == OutputFormat::Json {
        print_json(&verification)?;
    } else if verification.valid {
        println!(
            "{}",
            Theme::success(&format!(
                "UTID {} is included under root {}",
                Theme::digest(utid),
                Theme::digest(&verification.root)
            ))
        );
    } else {
        println!(
            "{}",
            Theme::error(&format!(
                "UTID {} does not verify against root {}",
                Theme::digest(utid),
                Theme::digest(&verification.root)
            ))
        );
    }

    if !verification.valid {
        bail!("inclusion proof failed");
    }
    Ok(())
}
