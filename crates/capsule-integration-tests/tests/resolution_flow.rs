//! End-to-end resolution through registry, mesh, sandbox, ledger and
//! telemetry.

#![allow(clippy::arithmetic_side_effects)]

use std::sync::Arc;

use capsule_core::{Params, ResolutionStatus, Telemetry, keys};
use capsule_events::{EventBus, topics};
use capsule_ledger::{CreditLedger, LedgerError};
use capsule_resolver::{CapsuleMetadata, CapsuleResolver, InMemoryCatalog, ResolverError};
use capsule_test::{
    DeterministicSandbox, FUSION_URI, FailingEmitter, FailingRegistry, FailingSandbox,
    RecordingEmitter, ResolverHarness, ScriptedLifecycle, fusion_catalog, fusion_metadata,
    install_sovereign, test_uri,
};
use serde_json::json;

#[test]
fn malformed_uri_is_bad_uri_without_events() {
    let harness = ResolverHarness::fusion();

    let result = harness.resolver.resolve("not-a-capsule-uri").unwrap();
    assert_eq!(result.status, ResolutionStatus::BadUri);
    assert!(result.uri.is_none());
    assert!(!result.message.is_empty());
    assert!(harness.emitter.events().is_empty());
}

#[test]
fn empty_registry_and_mesh_is_not_found() {
    let harness = ResolverHarness::new();

    let result = harness.resolver.resolve(FUSION_URI).unwrap();
    assert_eq!(result.status, ResolutionStatus::NotFound);
    assert_eq!(harness.sandbox.runs(), 0);

    let status = harness.emitter.payloads(topics::STATUS);
    assert_eq!(status.len(), 1);
    assert_eq!(status[0]["status"], 404);
}

#[test]
fn registered_capsule_executes_and_is_recorded() {
    capsule_test::init_test_logging();
    let harness = ResolverHarness::fusion();

    let result = harness.resolver.resolve(FUSION_URI).unwrap();
    assert_eq!(result.status, ResolutionStatus::Executed);
    assert_eq!(result.utid.as_deref(), Some("fake"));
    assert!(result.telemetry.contains_key(keys::LATENCY_MS));

    // Recorded once, with the sandbox's proof.
    let entry = harness.ledger.get("fake").unwrap();
    assert_eq!(entry.uri(), FUSION_URI);
    assert!((entry.delta_credits() - 1.0).abs() < f64::EPSILON);
    assert_eq!(entry.credit_root(), "root");
    assert_eq!(
        entry.proof_hash(),
        DeterministicSandbox::proof_for(&fusion_metadata(), &Params::new())
    );

    // Proof and credit flow are emitted before the closing status.
    assert_eq!(
        harness.emitter.topics(),
        vec![topics::PROOF, topics::CREDIT_FLOW, topics::STATUS]
    );

    let flow = &harness.emitter.payloads(topics::CREDIT_FLOW)[0];
    assert_eq!(flow["utid"], "fake");
    assert_eq!(flow["execution_cost"], 1.0);
    assert_eq!(flow["author_split"], 0.7);
    assert!(flow["balance_after"].is_null());

    let status = &harness.emitter.payloads(topics::STATUS)[0];
    assert_eq!(status["status"], 200);
    assert_eq!(status["uri"], FUSION_URI);
}

#[test]
fn query_params_reach_the_sandbox() {
    let harness = ResolverHarness::fusion();
    let uri = format!("{FUSION_URI}?steps=3&mode=fast");

    let result = harness.resolver.resolve(&uri).unwrap();
    assert!(result.is_success());

    let params: Params = [
        ("mode".to_owned(), "fast".to_owned()),
        ("steps".to_owned(), "3".to_owned()),
    ]
    .into();
    assert_eq!(
        result.telemetry.get(keys::PROOF_HASH),
        Some(&json!(DeterministicSandbox::proof_for(
            &fusion_metadata(),
            &params
        )))
    );
}

#[test]
fn mesh_serves_registry_misses() {
    let mesh = InMemoryCatalog::new();
    mesh.insert(
        &test_uri(FUSION_URI),
        CapsuleMetadata::new()
            .with_utid("mesh-utid")
            .with_credit_root("mesh-root")
            .with_execution_cost(0.5),
    );
    let harness =
        ResolverHarness::with_ledger(InMemoryCatalog::new(), mesh, Arc::new(CreditLedger::new()));

    let result = harness.resolver.resolve(FUSION_URI).unwrap();
    assert_eq!(result.status, ResolutionStatus::Executed);
    assert_eq!(result.utid.as_deref(), Some("mesh-utid"));
    assert!(harness.ledger.get("mesh-utid").is_some());
}

#[test]
fn registry_wins_over_mesh() {
    let mesh = InMemoryCatalog::new();
    mesh.insert(
        &test_uri(FUSION_URI),
        CapsuleMetadata::new()
            .with_utid("mesh-utid")
            .with_credit_root("r"),
    );
    let harness =
        ResolverHarness::with_ledger(fusion_catalog(), mesh, Arc::new(CreditLedger::new()));

    let result = harness.resolver.resolve(FUSION_URI).unwrap();
    assert_eq!(result.utid.as_deref(), Some("fake"));
}

#[test]
fn missing_credit_root_is_signature_mismatch() {
    let harness = ResolverHarness::new();
    harness.registry.insert(
        &test_uri(FUSION_URI),
        CapsuleMetadata::new()
            .with_utid("unsigned")
            .with_execution_cost(1.0),
    );

    let result = harness.resolver.resolve(FUSION_URI).unwrap();
    assert_eq!(result.status, ResolutionStatus::SignatureMismatch);
    assert_eq!(result.utid.as_deref(), Some("unsigned"));
    assert_eq!(harness.sandbox.runs(), 0);
    assert!(harness.ledger.is_empty());
    assert_eq!(harness.emitter.topics(), vec![topics::STATUS]);
}

#[test]
fn replayed_utid_is_a_fatal_protocol_violation() {
    let harness = ResolverHarness::fusion();
    harness.resolver.resolve(FUSION_URI).unwrap();
    let root = harness.ledger.merkle_root();
    let events = harness.emitter.events().len();

    let err = harness.resolver.resolve(FUSION_URI).unwrap_err();
    assert!(err.is_protocol_violation());
    assert!(matches!(
        err,
        ResolverError::Ledger(LedgerError::DuplicateUtid { ref utid }) if utid == "fake"
    ));

    // Nothing recorded or emitted for the rejected run.
    assert_eq!(harness.ledger.len(), 1);
    assert_eq!(harness.ledger.merkle_root(), root);
    assert_eq!(harness.emitter.events().len(), events);
}

#[test]
fn sandbox_failure_keeps_partial_telemetry() {
    let emitter = RecordingEmitter::new();
    let ledger = Arc::new(CreditLedger::new());
    let resolver = CapsuleResolver::new(Arc::new(fusion_catalog()))
        .with_ledger(ledger.clone())
        .with_sandbox(Arc::new(
            FailingSandbox::new("solver diverged").with_partial(keys::ENTROPY_DELTA, json!(0.3)),
        ))
        .with_emitter(Arc::new(emitter.clone()));

    let result = resolver.resolve(FUSION_URI).unwrap();
    assert_eq!(result.status, ResolutionStatus::ExecutionError);
    assert_eq!(result.utid.as_deref(), Some("fake"));
    assert_eq!(result.telemetry[keys::ENTROPY_DELTA], 0.3);
    assert!(result.message.contains("solver diverged"));
    assert!(ledger.is_empty());

    let status = &emitter.payloads(topics::STATUS)[0];
    assert_eq!(status["status"], 500);
    assert_eq!(status["error"], "solver diverged");
}

#[test]
fn emitter_failure_never_changes_the_outcome() {
    let ledger = Arc::new(CreditLedger::new());
    let resolver = CapsuleResolver::new(Arc::new(fusion_catalog()))
        .with_ledger(ledger.clone())
        .with_sandbox(Arc::new(DeterministicSandbox::new()))
        .with_emitter(Arc::new(FailingEmitter));

    let result = resolver.resolve(FUSION_URI).unwrap();
    assert_eq!(result.status, ResolutionStatus::Executed);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn unreachable_registry_propagates() {
    let resolver = CapsuleResolver::new(Arc::new(FailingRegistry))
        .with_sandbox(Arc::new(DeterministicSandbox::new()));

    let err = resolver.resolve(FUSION_URI).unwrap_err();
    assert!(matches!(err, ResolverError::Registry(_)));
    assert!(!err.is_protocol_violation());

    // A malformed URI never reaches the registry.
    let result = resolver.resolve("capsule://").unwrap();
    assert_eq!(result.status, ResolutionStatus::BadUri);
}

#[test]
fn unreachable_mesh_propagates_after_registry_miss() {
    let resolver = CapsuleResolver::new(Arc::new(InMemoryCatalog::new()))
        .with_mesh(Arc::new(FailingRegistry));

    let err = resolver.resolve(FUSION_URI).unwrap_err();
    assert!(matches!(err, ResolverError::Mesh(_)));
}

#[test]
fn sovereign_capsules_bypass_the_registry() {
    let root = tempfile::tempdir().unwrap();
    let uri = "capsule://local/sovereign/agent/boot/v2";
    let dir = install_sovereign(root.path(), uri, "boot");

    let mut ignited = Telemetry::new();
    ignited.insert("ignited".into(), json!(true));
    let lifecycle = Arc::new(ScriptedLifecycle::succeeding(ignited));

    let resolver = CapsuleResolver::new(Arc::new(FailingRegistry))
        .with_lifecycle(lifecycle.clone())
        .with_sovereign_root(root.path());

    let result = resolver.resolve(uri).unwrap();
    assert_eq!(result.status, ResolutionStatus::Executed);
    assert_eq!(result.telemetry["ignited"], true);
    assert_eq!(
        result.payload_location.as_deref(),
        Some(dir.display().to_string().as_str())
    );
    assert_eq!(lifecycle.ignited(), vec!["boot"]);

    // Not installed.
    let missing = resolver
        .resolve("capsule://local/sovereign/agent/halt")
        .unwrap();
    assert_eq!(missing.status, ResolutionStatus::NotFound);
}

#[test]
fn sovereign_without_lifecycle_is_not_implemented() {
    let root = tempfile::tempdir().unwrap();
    let uri = "capsule://local/sovereign/agent/boot";
    install_sovereign(root.path(), uri, "boot");

    let harness = ResolverHarness::new().with_sovereign_root(root.path());
    let result = harness.resolver.resolve(uri).unwrap();
    assert_eq!(result.status, ResolutionStatus::NotImplemented);
    assert!(result.payload_location.is_some());
}

#[test]
fn sovereign_ignition_failure_is_execution_error() {
    let root = tempfile::tempdir().unwrap();
    let uri = "capsule://local/sovereign/agent/boot";
    install_sovereign(root.path(), uri, "boot");

    let emitter = RecordingEmitter::new();
    let resolver = CapsuleResolver::new(Arc::new(InMemoryCatalog::new()))
        .with_lifecycle(Arc::new(ScriptedLifecycle::failing("no fuel")))
        .with_emitter(Arc::new(emitter.clone()))
        .with_sovereign_root(root.path());

    let result = resolver.resolve(uri).unwrap();
    assert_eq!(result.status, ResolutionStatus::ExecutionError);
    assert_eq!(emitter.payloads(topics::STATUS)[0]["status"], 500);
}

#[tokio::test]
async fn event_bus_delivers_resolution_events() {
    let bus = EventBus::with_capacity(16);
    let mut proofs = bus.subscribe_topic(topics::PROOF);
    let mut everything = bus.subscribe_topic("capsule.*");

    let resolver = CapsuleResolver::new(Arc::new(fusion_catalog()))
        .with_ledger(Arc::new(CreditLedger::new()))
        .with_sandbox(Arc::new(DeterministicSandbox::new()))
        .with_emitter(Arc::new(bus.clone()));

    let result = resolver.resolve(FUSION_URI).unwrap();
    assert!(result.is_success());

    let proof = proofs.recv().await.unwrap();
    assert_eq!(proof.topic, topics::PROOF);
    assert_eq!(proof.payload["utid"], "fake");

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(everything.recv().await.unwrap().topic.clone());
    }
    assert_eq!(seen, vec![topics::PROOF, topics::CREDIT_FLOW, topics::STATUS]);
}
