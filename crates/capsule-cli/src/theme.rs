//! CLI theme and styling.

use capsule_core::ResolutionStatus;
use colored::Colorize;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// Format a key-value pair, padding the key to a fixed column.
    pub(crate) fn kv(key: &str, value: &str) -> String {
        format!("  {:<14} {}", format!("{key}:").bold(), value)
    }

    /// Format a resolution status as `CODE NAME`, colored by outcome.
    pub(crate) fn status(status: ResolutionStatus) -> String {
        let text = format!("{} {}", status.code(), status.name());
        match status {
            ResolutionStatus::Executed | ResolutionStatus::Forked => text.green().to_string(),
            ResolutionStatus::NotImplemented | ResolutionStatus::NotFound => {
                text.yellow().to_string()
            },
            _ => text.red().to_string(),
        }
    }

    /// Shorten a 128-hex-digit digest for tables.
    pub(crate) fn digest(hex: &str) -> String {
        let short = hex.get(..16).unwrap_or(hex);
        if short.len() < hex.len() {
            format!("{}…", short.cyan())
        } else {
            format!("{}", short.cyan())
        }
    }
}
