//! Output format selection for command results.

use clap::ValueEnum;
use serde::Serialize;

/// How commands print their results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable, colored text.
    #[default]
    Pretty,
    /// One JSON document on stdout.
    Json,
}

/// Print `value` as pretty-printed JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
