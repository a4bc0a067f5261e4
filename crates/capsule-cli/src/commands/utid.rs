//! UTID command - compute a traceable execution ID.

use capsule_crypto::compute_utid;
use serde::Serialize;

use crate::output::{OutputFormat, print_json};
use crate::theme::Theme;

#[derive(Debug, Serialize)]
struct UtidReport<'a> {
    utid: String,
    capsule_hash: &'a str,
    parent_utid: &'a str,
    credit_root: &'a str,
}

/// Compute and print the UTID for an execution.
pub(crate) fn show_utid(
    capsule_hash: &str,
    parent_utid: &str,
    credit_root: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let report = UtidReport {
        utid: compute_utid(capsule_hash, parent_utid, credit_root),
        capsule_hash,
        parent_utid,
        credit_root,
    };

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Pretty => {
            if parent_utid.is_empty() {
                println!("{}", Theme::dimmed("root execution (no parent)"));
            }
            println!("{}", report.utid);
            Ok(())
        },
    }
}
