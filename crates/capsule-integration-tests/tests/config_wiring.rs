//! Layered configuration driving the resolver and logging setup.

use std::sync::Arc;

use capsule_config::{Config, ConfigError, ConfigLayer};
use capsule_events::topics;
use capsule_ledger::CreditLedger;
use capsule_resolver::{CapsuleResolver, CreditSplit};
use capsule_telemetry::{LogConfig, LogFormat, LogTarget};
use capsule_test::{DeterministicSandbox, FUSION_URI, RecordingEmitter, fusion_catalog};

fn write(path: &std::path::Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn workspace_credit_shares_reach_credit_flow_events() {
    let home = tempfile::tempdir().unwrap();
    let workspace = tempfile::tempdir().unwrap();
    write(
        &workspace.path().join(".capsule").join("config.toml"),
        "[credits]\nauthor_share = 0.5\nexecutor_share = 0.25\nmesh_share = 0.25\n",
    );

    let resolved = Config::load_with_home(Some(workspace.path()), home.path()).unwrap();
    assert_eq!(
        resolved.field_sources.get("credits.author_share"),
        Some(&ConfigLayer::Workspace)
    );

    let credits = &resolved.config.credits;
    let emitter = RecordingEmitter::new();
    let resolver = CapsuleResolver::new(Arc::new(fusion_catalog()))
        .with_ledger(Arc::new(CreditLedger::new()))
        .with_sandbox(Arc::new(DeterministicSandbox::new()))
        .with_emitter(Arc::new(emitter.clone()))
        .with_credit_split(CreditSplit {
            author: credits.author_share,
            executor: credits.executor_share,
            mesh: credits.mesh_share,
        });

    assert!(resolver.resolve(FUSION_URI).unwrap().is_success());
    let flow = &emitter.payloads(topics::CREDIT_FLOW)[0];
    assert_eq!(flow["author_split"], 0.5);
    assert_eq!(flow["executor_split"], 0.25);
    assert_eq!(flow["mesh_split"], 0.25);
}

#[test]
fn unbalanced_shares_fail_to_load() {
    let home = tempfile::tempdir().unwrap();
    write(
        &home.path().join("config.toml"),
        "[credits]\nmesh_share = 0.5\n",
    );

    let err = Config::load_with_home(None, home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "credits"));
}

#[test]
fn logging_section_becomes_log_config() {
    let home = tempfile::tempdir().unwrap();
    let logs = home.path().join("logs");
    write(
        &home.path().join("config.toml"),
        &format!(
            "[logging]\nlevel = \"debug\"\nformat = \"json\"\ndirectory = \"{}\"\n",
            logs.display()
        ),
    );

    let resolved = Config::load_with_home(None, home.path()).unwrap();
    let log_config = LogConfig::try_from(&resolved.config.logging).unwrap();
    assert_eq!(log_config.level, "debug");
    assert_eq!(log_config.format, LogFormat::Json);
    assert_eq!(log_config.target, LogTarget::File(logs));
}
