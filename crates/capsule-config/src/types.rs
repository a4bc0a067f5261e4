//! Configuration struct definitions.
//!
//! Every section implements `Default` with the same values as the embedded
//! `defaults.toml`, so a partially specified file deserializes cleanly.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolver settings.
    pub resolver: ResolverSection,
    /// Credit ledger persistence.
    pub ledger: LedgerSection,
    /// Reconciliation daemon schedule.
    pub reconciliation: ReconciliationSection,
    /// Credit flow shares.
    pub credits: CreditsSection,
    /// Telemetry event dispatch.
    pub events: EventsSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ResolverSection
// ---------------------------------------------------------------------------

/// Resolver settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    /// Directory holding sovereign capsules. `None` uses
    /// `{capsule home}/sovereign`.
    pub sovereign_root: Option<String>,
}

// ---------------------------------------------------------------------------
// LedgerSection
// ---------------------------------------------------------------------------

/// Credit ledger persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// JSON-lines journal path. `None` keeps the ledger in memory only.
    pub journal_path: Option<String>,
}

// ---------------------------------------------------------------------------
// ReconciliationSection
// ---------------------------------------------------------------------------

/// Reconciliation daemon schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationSection {
    /// Seconds between ledger snapshots.
    pub interval_secs: u64,
}

impl Default for ReconciliationSection {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

// ---------------------------------------------------------------------------
// CreditsSection
// ---------------------------------------------------------------------------

/// How execution cost is split in `capsule.credit_flow` events.
///
/// The three shares must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditsSection {
    /// Share paid to the capsule author.
    pub author_share: f64,
    /// Share paid to the executing node.
    pub executor_share: f64,
    /// Share paid to the mesh.
    pub mesh_share: f64,
}

impl Default for CreditsSection {
    fn default() -> Self {
        Self {
            author_share: 0.7,
            executor_share: 0.2,
            mesh_share: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// EventsSection
// ---------------------------------------------------------------------------

/// Telemetry event dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsSection {
    /// Broadcast channel capacity. Slow receivers lag past this many events.
    pub channel_capacity: usize,
    /// Also write every event to the log.
    pub log_events: bool,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            log_events: true,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["capsule_ledger=debug"]`).
    pub directives: Vec<String>,
    /// Write logs to daily-rotated files in this directory instead of stderr.
    pub directory: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
