//! Capsule CLI - resolve `capsule://` URIs and audit the credit ledger.
//!
//! Every command loads the layered configuration first (defaults, user,
//! workspace, `CAPSULE_*` environment) and sets up logging from its
//! `[logging]` section. Logs go to stderr so `--output json` keeps stdout
//! machine-readable.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use capsule_config::{ConfigError, ResolvedConfig};
use clap::{Parser, Subcommand};

mod commands;
mod config_bridge;
mod output;
mod theme;

use commands::resolve::{Pipeline, ResolveOptions};
use commands::{config, ledger, parse, reconcile, resolve, serve, utid};
use output::OutputFormat;

/// Capsule - content-addressed capsule resolution with a Merkle credit ledger
#[derive(Parser)]
#[command(name = "capsule")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format for command results
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a capsule URI and show its components
    Parse {
        /// The `capsule://` URI
        uri: String,
    },

    /// Compute the UTID of an execution
    Utid {
        /// Content hash of the capsule payload
        capsule_hash: String,
        /// Credit root the execution is charged against
        credit_root: String,
        /// UTID of the parent execution (omit for a root execution)
        #[arg(short, long, default_value = "")]
        parent: String,
    },

    /// Resolve and execute one capsule URI
    Resolve {
        /// The `capsule://` URI
        uri: String,
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Resolve URIs from stdin while reconciling the ledger in the background
    Serve {
        #[command(flatten)]
        sources: SourceArgs,
        /// Seconds between reconciliation snapshots (default from config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Inspect and audit the credit ledger
    Ledger {
        /// Ledger journal (default: `ledger.journal_path` from config)
        #[arg(short, long, global = true)]
        journal: Option<PathBuf>,
        #[command(subcommand)]
        command: LedgerCommands,
    },

    /// Take a reconciliation snapshot of the ledger
    Reconcile {
        /// Ledger journal (default: `ledger.journal_path` from config)
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },

    /// View and validate configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Where capsule metadata and the ledger come from.
#[derive(clap::Args)]
struct SourceArgs {
    /// JSON registry catalog (`{"capsule://...": {metadata}}`)
    #[arg(short, long)]
    catalog: Option<PathBuf>,
    /// JSON catalog of mesh replicas, consulted when the registry misses
    #[arg(short, long)]
    mesh: Option<PathBuf>,
    /// Ledger journal (default: `ledger.journal_path` from config)
    #[arg(short, long)]
    journal: Option<PathBuf>,
    /// Directory holding sovereign capsules
    #[arg(long)]
    sovereign_root: Option<PathBuf>,
}

impl From<SourceArgs> for ResolveOptions {
    fn from(args: SourceArgs) -> Self {
        Self {
            catalog: args.catalog,
            mesh: args.mesh,
            journal: args.journal,
            sovereign_root: args.sovereign_root,
        }
    }
}

#[derive(Subcommand)]
enum LedgerCommands {
    /// Print the current Merkle root
    Root,
    /// List every recorded execution
    List,
    /// Print the inclusion proof for a UTID
    Proof {
        /// The UTID to prove
        utid: String,
    },
    /// Verify a UTID's inclusion proof
    Verify {
        /// The UTID to verify
        utid: String,
        /// Verify against this root instead of the current one
        #[arg(long)]
        root: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show resolved configuration with source annotations
    Show {
        /// Output format (toml or json)
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Validate the current configuration
    Validate,
    /// Show config file paths being checked
    Paths,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let workspace_root = std::env::current_dir().ok();
    let loaded = capsule_config::Config::load(workspace_root.as_deref());

    // Set up logging from config, with --verbose override.
    let log_config = match &loaded {
        Ok(resolved) => config_bridge::to_log_config(&resolved.config, cli.verbose)
            .unwrap_or_else(|e| {
                eprintln!("Invalid logging config, using defaults: {e}");
                config_bridge::fallback_log_config(cli.verbose)
            }),
        Err(_) => config_bridge::fallback_log_config(cli.verbose),
    };
    if let Err(e) = capsule_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let format = cli.output;
    match cli.command {
        Commands::Parse { uri } => parse::parse_uri(&uri, format),
        Commands::Utid {
            capsule_hash,
            credit_root,
            parent,
        } => utid::show_utid(&capsule_hash, &parent, &credit_root, format),
        Commands::Resolve { uri, sources } => {
            let resolved = require_config(&loaded)?;
            resolve::resolve_capsule(resolved, &uri, &sources.into(), format)
        },
        Commands::Serve { sources, interval } => {
            let resolved = require_config(&loaded)?;
            let secs = interval.unwrap_or(resolved.config.reconciliation.interval_secs);
            let pipeline = Pipeline::build(resolved, &sources.into())?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let snapshot =
                serve::serve(pipeline, stdin, Duration::from_secs(secs), format).await?;
            reconcile::print_snapshot(&snapshot, format)
        },
        Commands::Ledger { journal, command } => {
            let resolved = require_config(&loaded)?;
            handle_ledger(resolved, journal, command, format)
        },
        Commands::Reconcile { journal } => {
            let resolved = require_config(&loaded)?;
            let ledger = ledger::open_journal(&resolved.config, journal.as_deref())?;
            reconcile::reconcile_once(ledger, format).map(|_| ())
        },
        Commands::Config { command } => handle_config(&loaded, workspace_root, command),
    }
}

/// The loaded config, or the load error for commands that cannot run
/// without it.
fn require_config(loaded: &Result<ResolvedConfig, ConfigError>) -> Result<&ResolvedConfig> {
    loaded
        .as_ref()
        .map_err(|e| anyhow!("failed to load configuration: {e}"))
}

fn handle_ledger(
    resolved: &ResolvedConfig,
    journal: Option<PathBuf>,
    command: LedgerCommands,
    format: OutputFormat,
) -> Result<()> {
    let log = ledger::open_journal(&resolved.config, journal.as_deref())?;
    match command {
        LedgerCommands::Root => ledger::show_root(&log, format),
        LedgerCommands::List => ledger::list_entries(&log, format),
        LedgerCommands::Proof { utid } => ledger::show_proof(&log, &utid, format),
        LedgerCommands::Verify { utid, root } => {
            ledger::verify_entry(&log, &utid, root.as_deref(), format)
        },
    }
}

fn handle_config(
    loaded: &Result<ResolvedConfig, ConfigError>,
    workspace_root: Option<PathBuf>,
    command: ConfigCommands,
) -> Result<()> {
    match command {
        ConfigCommands::Show { format } => config::show_config(require_config(loaded)?, &format),
        ConfigCommands::Validate => config::validate_config(loaded.as_ref()),
        ConfigCommands::Paths => {
            let home = match loaded {
                Ok(resolved) => resolved.home.clone(),
                Err(_) => capsule_config::loader::capsule_home(
                    &capsule_config::env::collect_env_vars(),
                )?,
            };
            config::show_paths(&home, workspace_root.as_deref());
            Ok(())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve_args() {
        let cli = Cli::try_parse_from([
            "capsule",
            "--output",
            "json",
            "resolve",
            "capsule://fusion/mhd64/v4.1",
            "--catalog",
            "registry.json",
            "--journal",
            "ledger.jsonl",
        ])
        .unwrap();

        assert_eq!(cli.output, OutputFormat::Json);
        let Commands::Resolve { uri, sources } = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(uri, "capsule://fusion/mhd64/v4.1");
        let options = ResolveOptions::from(sources);
        assert_eq!(options.catalog, Some(PathBuf::from("registry.json")));
        assert_eq!(options.journal, Some(PathBuf::from("ledger.jsonl")));
        assert!(options.mesh.is_none());
    }

    #[test]
    fn test_parse_ledger_verify_with_root() {
        let cli = Cli::try_parse_from([
            "capsule", "ledger", "verify", "abc", "--root", "def", "--journal", "l.jsonl",
        ])
        .unwrap();
        let Commands::Ledger { journal, command } = cli.command else {
            panic!("expected ledger");
        };
        assert_eq!(journal, Some(PathBuf::from("l.jsonl")));
        assert!(matches!(
            command,
            LedgerCommands::Verify { ref utid, root: Some(ref r) } if utid == "abc" && r == "def"
        ));
    }

    #[test]
    fn test_utid_parent_defaults_to_root() {
        let cli = Cli::try_parse_from(["capsule", "utid", "hash", "root"]).unwrap();
        let Commands::Utid { parent, .. } = cli.command else {
            panic!("expected utid");
        };
        assert!(parent.is_empty());
    }
}
