//! Bridge from `capsule_config::Config` to domain types.
//!
//! `capsule-config` has no dependencies on the domain crates, so every
//! conversion from config sections to resolver, ledger, and event types
//! lives here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use capsule_config::{Config, CreditsSection, EventsSection, ResolvedConfig};
use capsule_events::{EventBus, FanoutEmitter, TelemetryEmitter, TracingEmitter};
use capsule_ledger::{CreditLedger, LedgerResult};
use capsule_resolver::CreditSplit;
use capsule_telemetry::{LogConfig, LogFormat, TelemetryResult};

/// Directory under the capsule home that holds sovereign capsules by
/// default.
pub(crate) const SOVEREIGN_DIR: &str = "sovereign";

/// Logging config for the CLI: the `[logging]` section, with `--verbose`
/// forcing the `debug` level.
pub(crate) fn to_log_config(config: &Config, verbose: bool) -> TelemetryResult<LogConfig> {
    let mut log_config = LogConfig::try_from(&config.logging)?;
    if verbose {
        "debug".clone_into(&mut log_config.level);
    }
    Ok(log_config)
}

/// Logging config used when the configuration itself failed to load.
pub(crate) fn fallback_log_config(verbose: bool) -> LogConfig {
    let level = if verbose { "debug" } else { "info" };
    LogConfig::new(level).with_format(LogFormat::Compact)
}

/// Credit split for `capsule.credit_flow` events.
pub(crate) fn credit_split(credits: &CreditsSection) -> CreditSplit {
    CreditSplit {
        author: credits.author_share,
        executor: credits.executor_share,
        mesh: credits.mesh_share,
    }
}

/// Sovereign capsule root: the configured directory, else
/// `{capsule home}/sovereign`.
pub(crate) fn sovereign_root(resolved: &ResolvedConfig) -> PathBuf {
    resolved
        .config
        .resolver
        .sovereign_root
        .as_ref()
        .map_or_else(|| resolved.home.join(SOVEREIGN_DIR), PathBuf::from)
}

/// Journal path: the command-line override, else `[ledger] journal_path`.
pub(crate) fn journal_path(config: &Config, cli_override: Option<&Path>) -> Option<PathBuf> {
    cli_override
        .map(Path::to_path_buf)
        .or_else(|| config.ledger.journal_path.as_ref().map(PathBuf::from))
}

/// Open the ledger at `journal`, or a memory-only ledger if there is none.
pub(crate) fn open_ledger(journal: Option<&Path>) -> LedgerResult<CreditLedger> {
    match journal {
        Some(path) => CreditLedger::open(path),
        None => Ok(CreditLedger::new()),
    }
}

/// Event bus sized from the `[events]` section.
pub(crate) fn event_bus(events: &EventsSection) -> EventBus {
    EventBus::with_capacity(events.channel_capacity)
}

/// Emitter that publishes to `bus` and, if `log_events` is set, also to the
/// log.
pub(crate) fn emitter(events: &EventsSection, bus: &EventBus) -> Arc<dyn TelemetryEmitter> {
    let mut fanout = FanoutEmitter::new().with_sink(Arc::new(bus.clone()));
    if events.log_events {
        fanout = fanout.with_sink(Arc::new(TracingEmitter));
    }
    Arc::new(fanout)
}
