//! Resolve command - run one URI through the resolution pipeline.
//!
//! Registry and mesh entries come from JSON catalog files mapping URIs to
//! capsule metadata. Execution is replayed from each entry's recorded
//! `telemetry` object.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use capsule_config::ResolvedConfig;
use capsule_events::{EventBus, EventReceiver, TelemetryEvent};
use capsule_ledger::CreditLedger;
use capsule_resolver::{
    CapsuleMetadata, CapsuleResolver, InMemoryCatalog, ReplaySandbox, ResolutionResult,
};
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use crate::config_bridge;
use crate::output::{OutputFormat, print_json};
use crate::theme::Theme;

/// Inputs to one resolution.
#[derive(Debug, Default)]
pub(crate) struct ResolveOptions {
    /// Registry catalog file.
    pub(crate) catalog: Option<PathBuf>,
    /// Mesh replica catalog file.
    pub(crate) mesh: Option<PathBuf>,
    /// Journal override.
    pub(crate) journal: Option<PathBuf>,
    /// Sovereign root override.
    pub(crate) sovereign_root: Option<PathBuf>,
}

/// The result plus everything the pipeline emitted.
#[derive(Debug, Serialize)]
pub(crate) struct ResolveReport {
    pub(crate) result: ResolutionResult,
    pub(crate) events: Vec<TelemetryEvent>,
    pub(crate) ledger_root: String,
    pub(crate) ledger_entries: usize,
}

/// Load a JSON catalog file (`{"capsule://...": {metadata}, ...}`).
pub(crate) fn load_catalog(path: &Path) -> anyhow::Result<InMemoryCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    let entries: HashMap<String, CapsuleMetadata> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse catalog {}", path.display()))?;
    let catalog = InMemoryCatalog::from_entries(entries)
        .with_context(|| format!("invalid capsule URI in catalog {}", path.display()))?;
    debug!(path = %path.display(), capsules = catalog.len(), "Loaded catalog");
    Ok(catalog)
}

/// A resolver wired to a ledger and an event bus, built from config.
pub(crate) struct Pipeline {
    pub(crate) resolver: CapsuleResolver,
    pub(crate) ledger: Arc<CreditLedger>,
    pub(crate) bus: EventBus,
}

impl Pipeline {
    /// Build the collaborators named by `resolved` and `options`.
    pub(crate) fn build(
        resolved: &ResolvedConfig,
        options: &ResolveOptions,
    ) -> anyhow::Result<Self> {
        let config = &resolved.config;

        let registry = match &options.catalog {
            Some(path) => load_catalog(path)?,
            None => InMemoryCatalog::new(),
        };
        let journal = config_bridge::journal_path(config, options.journal.as_deref());
        let ledger = Arc::new(
            config_bridge::open_ledger(journal.as_deref())
                .context("failed to open credit ledger")?,
        );
        let bus = config_bridge::event_bus(&config.events);

        let sovereign_root = options
            .sovereign_root
            .clone()
            .unwrap_or_else(|| config_bridge::sovereign_root(resolved));

        let mut resolver = CapsuleResolver::new(Arc::new(registry))
            .with_ledger(ledger.clone())
            .with_sandbox(Arc::new(ReplaySandbox))
            .with_emitter(config_bridge::emitter(&config.events, &bus))
            .with_sovereign_root(sovereign_root)
            .with_credit_split(config_bridge::credit_split(&config.credits));
        if let Some(path) = &options.mesh {
            resolver = resolver.with_mesh(Arc::new(load_catalog(path)?));
        }

        Ok(Self {
            resolver,
            ledger,
            bus,
        })
    }

    /// Resolve one URI, flush the ledger, and collect the events it emitted
    /// on `receiver`.
    ///
    /// A duplicate UTID is returned as an error, and nothing is written to
    /// the ledger.
    pub(crate) fn run(
        &self,
        uri: &str,
        receiver: &mut EventReceiver,
    ) -> anyhow::Result<ResolveReport> {
        let result = self.resolver.resolve(uri)?;
        self.ledger.flush().context("failed to flush credit ledger")?;

        let mut events = Vec::new();
        while let Some(event) = receiver.try_recv() {
            events.push((*event).clone());
        }

        Ok(ResolveReport {
            result,
            events,
            ledger_root: self.ledger.merkle_root(),
            ledger_entries: self.ledger.len(),
        })
    }
}

/// Resolve `uri` with collaborators built from `resolved` and `options`.
pub(crate) fn run_resolution(
    resolved: &ResolvedConfig,
    uri: &str,
    options: &ResolveOptions,
) -> anyhow::Result<ResolveReport> {
    let pipeline = Pipeline::build(resolved, options)?;
    let mut receiver = pipeline.bus.subscribe();
    pipeline.run(uri, &mut receiver)
}

/// Resolve `uri` and print the outcome.
pub(crate) fn resolve_capsule(
    resolved: &ResolvedConfig,
    uri: &str,
    options: &ResolveOptions,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let report = run_resolution(resolved, uri, options)?;
    if format == OutputFormat::Json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

/// Print a report as human-readable text.
pub(crate) fn print_report(report: &ResolveReport) {
    let result = &report.result;
    println!("\n{}", Theme::header("Resolution"));
    println!("{}", Theme::kv("Status", &Theme::status(result.status)));
    if let Some(uri) = &result.uri {
        println!("{}", Theme::kv("URI", &uri.to_uri()));
    }
    if let Some(utid) = &result.utid {
        println!("{}", Theme::kv("UTID", &Theme::digest(utid)));
    }
    if let Some(location) = &result.payload_location {
        println!("{}", Theme::kv("Payload", location));
    }
    println!("{}", Theme::kv("Message", &result.message));

    if !result.telemetry.is_empty() {
        println!("\n{}", Theme::header("Telemetry"));
        for (key, value) in &result.telemetry {
            println!("{}", Theme::kv(key, &value.to_string()));
        }
    }

    if !report.events.is_empty() {
        println!("\n{}", Theme::header("Events"));
        println!("{}", Theme::separator());
        for event in &report.events {
            println!("  {:<20} {}", event.topic.bold(), event.payload);
        }
    }

    println!();
    if report.ledger_entries == 0 {
        println!("{}", Theme::dimmed("Ledger is empty"));
    } else {
        println!(
            "{}",
            Theme::info(&format!(
                "Ledger root {} over {} entries",
                Theme::digest(&report.ledger_root),
                report.ledger_entries
            ))
        );
    }
    if !result.is_success() {
        println!("{}", Theme::warning("Capsule did not execute"));
    }
    println!();
}
