//! Mock collaborators for testing.
//!
//! All mocks use `std::sync::Mutex` or atomics so they work from plain
//! threads and async tasks alike.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use capsule_core::{CapsuleUri, Params, Telemetry, keys};
use capsule_crypto::Sha3Digest;
use capsule_events::{EmitError, EmitResult, TelemetryEmitter, TelemetryEvent};
use capsule_resolver::{
    CapsuleLifecycle, CapsuleMetadata, CollaboratorError, LifecycleError, MeshClient, Registry,
    Sandbox, SandboxError, SandboxOutput, SovereignManifest,
};
use serde_json::{Value, json};

/// Epoch seconds [`DeterministicSandbox`] reports unless overridden.
pub const DETERMINISTIC_EPOCH: f64 = 1_700_000_000.0;

/// Sandbox whose output depends only on its inputs.
///
/// `proof_hash` is the SHA3-512 of the capsule hash, UTID and sorted params.
/// `execution_cost` is the metadata's cost, or the configured default.
#[derive(Debug)]
pub struct DeterministicSandbox {
    default_cost: Option<f64>,
    balance_after: Option<f64>,
    emit_proof: bool,
    runs: AtomicUsize,
}

impl DeterministicSandbox {
    /// Sandbox that reports a proof hash and the metadata's cost.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_cost: None,
            balance_after: None,
            emit_proof: true,
            runs: AtomicUsize::new(0),
        }
    }

    /// Report this cost when the metadata has none.
    #[must_use]
    pub fn with_default_cost(mut self, cost: f64) -> Self {
        self.default_cost = Some(cost);
        self
    }

    /// Report `balance_after` in telemetry.
    #[must_use]
    pub fn with_balance_after(mut self, balance: f64) -> Self {
        self.balance_after = Some(balance);
        self
    }

    /// Omit `proof_hash`.
    #[must_use]
    pub fn without_proof(mut self) -> Self {
        self.emit_proof = false;
        self
    }

    /// Number of completed runs.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// The proof hash a run with these inputs produces.
    #[must_use]
    pub fn proof_for(metadata: &CapsuleMetadata, params: &Params) -> String {
        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let joined = rendered.join("&");
        Sha3Digest::hash_multi(&[
            metadata.capsule_hash.as_deref().unwrap_or_default().as_bytes(),
            b"|",
            metadata.utid.as_deref().unwrap_or_default().as_bytes(),
            b"|",
            joined.as_bytes(),
        ])
        .to_hex()
    }
}

impl Default for DeterministicSandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox for DeterministicSandbox {
    fn run(
        &self,
        metadata: &CapsuleMetadata,
        params: &Params,
    ) -> Result<SandboxOutput, SandboxError> {
        let mut telemetry = Telemetry::new();
        if self.emit_proof {
            telemetry.insert(
                keys::PROOF_HASH.into(),
                json!(Self::proof_for(metadata, params)),
            );
        }
        if let Some(cost) = metadata.execution_cost.or(self.default_cost) {
            telemetry.insert(keys::EXECUTION_COST.into(), json!(cost));
        }
        if let Some(balance) = self.balance_after {
            telemetry.insert(keys::BALANCE_AFTER.into(), json!(balance));
        }
        telemetry.insert(keys::TIMESTAMP_EPOCH.into(), json!(DETERMINISTIC_EPOCH));

        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(SandboxOutput::new(telemetry))
    }
}

/// Sandbox that always fails.
#[derive(Debug, Clone)]
pub struct FailingSandbox {
    message: String,
    partial: Telemetry,
}

impl FailingSandbox {
    /// Fail with `message` and no partial telemetry.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            partial: Telemetry::new(),
        }
    }

    /// Report this telemetry alongside the failure.
    #[must_use]
    pub fn with_partial(mut self, key: impl Into<String>, value: Value) -> Self {
        self.partial.insert(key.into(), value);
        self
    }
}

impl Sandbox for FailingSandbox {
    fn run(
        &self,
        _metadata: &CapsuleMetadata,
        _params: &Params,
    ) -> Result<SandboxOutput, SandboxError> {
        Err(SandboxError::new(self.message.clone()).with_telemetry(self.partial.clone()))
    }
}

/// Emitter that captures every event.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl RecordingEmitter {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Topics of all captured events, in emission order.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.topic).collect()
    }

    /// Payloads of events on `topic`.
    #[must_use]
    pub fn payloads(&self, topic: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|e| e.topic == topic)
            .map(|e| e.payload)
            .collect()
    }

    /// Clear all captured events.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }
}

impl TelemetryEmitter for RecordingEmitter {
    fn emit(&self, event: TelemetryEvent) -> EmitResult<()> {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
        Ok(())
    }
}

/// Emitter that rejects every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEmitter;

impl TelemetryEmitter for FailingEmitter {
    fn emit(&self, event: TelemetryEvent) -> EmitResult<()> {
        Err(EmitError::Rejected {
            topic: event.topic,
            reason: "emitter offline".to_owned(),
        })
    }
}

/// Registry and mesh that are unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRegistry;

impl Registry for FailingRegistry {
    fn get_capsule(
        &self,
        _uri: &CapsuleUri,
    ) -> Result<Option<CapsuleMetadata>, CollaboratorError> {
        Err(CollaboratorError::Unavailable("registry offline".to_owned()))
    }
}

impl MeshClient for FailingRegistry {
    fn find_replica(
        &self,
        _uri: &CapsuleUri,
    ) -> Result<Option<CapsuleMetadata>, CollaboratorError> {
        Err(CollaboratorError::Unavailable("mesh offline".to_owned()))
    }
}

/// Lifecycle whose ignition result is fixed up front.
#[derive(Debug)]
pub struct ScriptedLifecycle {
    outcome: Result<Telemetry, String>,
    ignited: Mutex<Vec<String>>,
}

impl ScriptedLifecycle {
    /// Ignition succeeds with `telemetry`.
    #[must_use]
    pub fn succeeding(telemetry: Telemetry) -> Self {
        Self {
            outcome: Ok(telemetry),
            ignited: Mutex::new(Vec::new()),
        }
    }

    /// Ignition fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            ignited: Mutex::new(Vec::new()),
        }
    }

    /// Names of manifests ignited so far.
    #[must_use]
    pub fn ignited(&self) -> Vec<String> {
        self.ignited.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl CapsuleLifecycle for ScriptedLifecycle {
    fn ignite(
        &self,
        manifest: &SovereignManifest,
        _params: &Params,
    ) -> Result<Telemetry, LifecycleError> {
        if let Ok(mut guard) = self.ignited.lock() {
            guard.push(manifest.name.clone());
        }
        self.outcome.clone().map_err(LifecycleError::Ignition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_events::topics;

    #[test]
    fn test_deterministic_sandbox_is_deterministic() {
        let sandbox = DeterministicSandbox::new();
        let metadata = CapsuleMetadata::new()
            .with_utid("u")
            .with_capsule_hash("h")
            .with_execution_cost(2.5);
        let params: Params = [("b".to_owned(), "2".to_owned()), ("a".to_owned(), "1".to_owned())]
            .into();

        let first = sandbox.run(&metadata, &params).unwrap();
        let second = sandbox.run(&metadata, &params).unwrap();
        assert_eq!(first, second);
        assert_eq!(sandbox.runs(), 2);
        assert_eq!(first.telemetry[keys::EXECUTION_COST], 2.5);

        let proof = first.telemetry[keys::PROOF_HASH].as_str().unwrap();
        assert_eq!(proof.len(), 128);
        assert_eq!(proof, DeterministicSandbox::proof_for(&metadata, &params));

        let other = sandbox.run(&metadata, &Params::new()).unwrap();
        assert_ne!(other.telemetry[keys::PROOF_HASH], first.telemetry[keys::PROOF_HASH]);
    }

    #[test]
    fn test_deterministic_sandbox_options() {
        let sandbox = DeterministicSandbox::new()
            .with_default_cost(1.0)
            .with_balance_after(9.0)
            .without_proof();
        let out = sandbox.run(&CapsuleMetadata::new(), &Params::new()).unwrap();

        assert!(!out.telemetry.contains_key(keys::PROOF_HASH));
        assert_eq!(out.telemetry[keys::EXECUTION_COST], 1.0);
        assert_eq!(out.telemetry[keys::BALANCE_AFTER], 9.0);
    }

    #[test]
    fn test_failing_sandbox_carries_partial() {
        let err = FailingSandbox::new("boom")
            .with_partial("entropy_delta", json!(0.25))
            .run(&CapsuleMetadata::new(), &Params::new())
            .unwrap_err();
        assert_eq!(err.message, "boom");
        assert_eq!(err.telemetry["entropy_delta"], 0.25);
    }

    #[test]
    fn test_recording_emitter() {
        let emitter = RecordingEmitter::new();
        emitter
            .emit(TelemetryEvent::new(topics::STATUS, json!({"status": 200})))
            .unwrap();
        emitter
            .emit(TelemetryEvent::new(topics::PROOF, json!({})))
            .unwrap();

        assert_eq!(emitter.topics(), vec![topics::STATUS, topics::PROOF]);
        assert_eq!(emitter.payloads(topics::STATUS)[0]["status"], 200);

        emitter.clear();
        assert!(emitter.events().is_empty());
    }

    #[test]
    fn test_failing_collaborators() {
        assert!(FailingEmitter
            .emit(TelemetryEvent::new(topics::STATUS, json!({})))
            .is_err());

        let uri = CapsuleUri::parse("capsule://fusion/mhd64/v4.1").unwrap();
        assert!(FailingRegistry.get_capsule(&uri).is_err());
        assert!(FailingRegistry.find_replica(&uri).is_err());
    }

    #[test]
    fn test_scripted_lifecycle() {
        let manifest: SovereignManifest = toml::from_str("name = \"boot\"").unwrap();

        let ok = ScriptedLifecycle::succeeding(Telemetry::new());
        assert!(ok.ignite(&manifest, &Params::new()).is_ok());
        assert_eq!(ok.ignited(), vec!["boot"]);

        let bad = ScriptedLifecycle::failing("no fuel");
        assert!(matches!(
            bad.ignite(&manifest, &Params::new()),
            Err(LifecycleError::Ignition(ref m)) if m == "no fuel"
        ));
    }
}
