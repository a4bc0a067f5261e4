//! The resolution pipeline.
//!
//! `resolve` runs one pass of a small state machine and stops at the first
//! terminal outcome:
//!
//! ```text
//! START -> PARSED -> SOVEREIGN ------------------------------------> TERMINAL
//!                 \-> REGISTRY -> MESH? -> VERIFIED? -> EXECUTED
//!                                                    | NOT_IMPLEMENTED
//!                                                    | EXECUTION_ERROR
//! ```
//!
//! There are no retries. Telemetry emission is best-effort and can never
//! change the outcome.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use capsule_core::{CapsuleUri, ResolutionStatus, Telemetry, TelemetryExt, keys};
use capsule_events::{TelemetryEmitter, TelemetryEvent, topics};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::{ResolverError, ResolverResult};
use crate::metadata::CapsuleMetadata;
use crate::sovereign::sovereign_path;
use crate::traits::{CapsuleLifecycle, Ledger, MeshClient, Registry, Sandbox};

/// How an execution's cost is divided for `capsule.credit_flow`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditSplit {
    /// Share paid to the capsule author.
    pub author: f64,
    /// Share paid to the executing node.
    pub executor: f64,
    /// Share paid to the mesh.
    pub mesh: f64,
}

impl CreditSplit {
    /// Split `cost` into `(author, executor, mesh)` amounts.
    #[must_use]
    pub fn split(&self, cost: f64) -> (f64, f64, f64) {
        (cost * self.author, cost * self.executor, cost * self.mesh)
    }
}

impl Default for CreditSplit {
    fn default() -> Self {
        Self {
            author: 0.7,
            executor: 0.2,
            mesh: 0.1,
        }
    }
}

/// The outcome of one `resolve` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    /// Terminal status.
    pub status: ResolutionStatus,
    /// Human-readable description of the outcome.
    pub message: String,
    /// Parsed URI. `None` only for [`ResolutionStatus::BadUri`].
    pub uri: Option<CapsuleUri>,
    /// UTID from the resolved metadata.
    pub utid: Option<String>,
    /// Payload location from the resolved metadata.
    pub payload_location: Option<String>,
    /// Telemetry accumulated during the call.
    pub telemetry: Telemetry,
}

impl ResolutionResult {
    fn new(status: ResolutionStatus, message: impl Into<String>, uri: Option<CapsuleUri>) -> Self {
        Self {
            status,
            message: message.into(),
            uri,
            utid: None,
            payload_location: None,
            telemetry: Telemetry::new(),
        }
    }

    fn with_metadata(mut self, metadata: &CapsuleMetadata) -> Self {
        self.utid.clone_from(&metadata.utid);
        self.payload_location.clone_from(&metadata.payload_location);
        self
    }

    /// Whether the capsule executed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// A terminal result plus the error text for `capsule.status`, if any.
struct Outcome {
    result: ResolutionResult,
    error: Option<String>,
}

impl From<ResolutionResult> for Outcome {
    fn from(result: ResolutionResult) -> Self {
        Self {
            result,
            error: None,
        }
    }
}

/// Resolves `capsule://` URIs to executions.
///
/// Collaborators are injected at construction. Only the registry is
/// required; every other collaborator is optional and its absence has a
/// defined outcome.
#[derive(Clone)]
pub struct CapsuleResolver {
    registry: Arc<dyn Registry>,
    mesh: Option<Arc<dyn MeshClient>>,
    ledger: Option<Arc<dyn Ledger>>,
    sandbox: Option<Arc<dyn Sandbox>>,
    emitter: Option<Arc<dyn TelemetryEmitter>>,
    lifecycle: Option<Arc<dyn CapsuleLifecycle>>,
    sovereign_root: PathBuf,
    credit_split: CreditSplit,
}

impl CapsuleResolver {
    /// Create a resolver over a registry, with no other collaborators.
    #[must_use]
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry,
            mesh: None,
            ledger: None,
            sandbox: None,
            emitter: None,
            lifecycle: None,
            sovereign_root: PathBuf::from("."),
            credit_split: CreditSplit::default(),
        }
    }

    /// Fall back to a mesh client on registry misses.
    #[must_use]
    pub fn with_mesh(mut self, mesh: Arc<dyn MeshClient>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Verify UTIDs against and record executions in a ledger.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Execute resolved capsules in a sandbox.
    #[must_use]
    pub fn with_sandbox(mut self, sandbox: Arc<dyn Sandbox>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Emit telemetry events.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn TelemetryEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Ignite sovereign capsules through a lifecycle hook.
    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn CapsuleLifecycle>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Directory sovereign capsules are installed under.
    #[must_use]
    pub fn with_sovereign_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sovereign_root = root.into();
        self
    }

    /// Shares used for `capsule.credit_flow`.
    #[must_use]
    pub fn with_credit_split(mut self, split: CreditSplit) -> Self {
        self.credit_split = split;
        self
    }

    /// Directory sovereign capsules are installed under.
    #[must_use]
    pub fn sovereign_root(&self) -> &Path {
        &self.sovereign_root
    }

    /// Resolve and, if possible, execute a capsule.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry or mesh backend fails, or if the
    /// ledger rejects the execution record (a duplicate UTID is a protocol
    /// violation and must not be retried). Every other outcome, including
    /// sandbox failures, is an `Ok` result with a non-200 status.
    pub fn resolve(&self, uri_text: &str) -> ResolverResult<ResolutionResult> {
        let started = Instant::now();

        let uri = match CapsuleUri::parse(uri_text) {
            Ok(uri) => uri,
            Err(e) => {
                debug!(uri = uri_text, error = %e, "Rejected malformed capsule URI");
                return Ok(ResolutionResult::new(
                    ResolutionStatus::BadUri,
                    e.to_string(),
                    None,
                ));
            },
        };

        let outcome = if uri.is_sovereign() {
            self.resolve_sovereign(uri)
        } else {
            self.resolve_registered(uri, started)?
        };

        let latency_ms = elapsed_ms(started);
        self.emit_status(&outcome, latency_ms);

        let result = outcome.result;
        match result.status {
            ResolutionStatus::Executed => info!(
                uri = %uri_text,
                utid = result.utid.as_deref().unwrap_or_default(),
                latency_ms,
                "Capsule executed"
            ),
            ResolutionStatus::SignatureMismatch | ResolutionStatus::ExecutionError => warn!(
                uri = %uri_text,
                status = %result.status,
                message = %result.message,
                "Capsule resolution failed"
            ),
            _ => debug!(
                uri = %uri_text,
                status = %result.status,
                message = %result.message,
                "Capsule resolution finished"
            ),
        }
        Ok(result)
    }

    fn resolve_sovereign(&self, uri: CapsuleUri) -> Outcome {
        let path = sovereign_path(&self.sovereign_root, &uri);
        if !path.exists() {
            let message = format!("sovereign capsule not installed at {}", path.display());
            return ResolutionResult::new(ResolutionStatus::NotFound, message, Some(uri)).into();
        }
        let location = Some(path.display().to_string());

        let Some(lifecycle) = &self.lifecycle else {
            let mut result = ResolutionResult::new(
                ResolutionStatus::NotImplemented,
                "no capsule lifecycle configured for sovereign capsules",
                Some(uri),
            );
            result.payload_location = location;
            return result.into();
        };

        let ignition = lifecycle
            .load_manifest(&path)
            .and_then(|manifest| lifecycle.ignite(&manifest, uri.params()));

        match ignition {
            Ok(telemetry) => {
                let mut result = ResolutionResult::new(
                    ResolutionStatus::Executed,
                    "sovereign capsule ignited",
                    Some(uri),
                );
                result.payload_location = location;
                result.telemetry = telemetry;
                result.into()
            },
            Err(e) => {
                let mut result = ResolutionResult::new(
                    ResolutionStatus::ExecutionError,
                    format!("sovereign capsule failed: {e}"),
                    Some(uri),
                );
                result.payload_location = location;
                Outcome {
                    result,
                    error: Some(e.to_string()),
                }
            },
        }
    }

    fn resolve_registered(&self, uri: CapsuleUri, started: Instant) -> ResolverResult<Outcome> {
        let Some((metadata, source)) = self.lookup(&uri)? else {
            let message = format!("capsule not found in registry or mesh: {}", uri.address());
            return Ok(ResolutionResult::new(ResolutionStatus::NotFound, message, Some(uri)).into());
        };
        debug!(uri = %uri, source, "Capsule metadata resolved");

        if let (Some(utid), Some(ledger)) = (metadata.utid.as_deref(), &self.ledger) {
            let credit_root = metadata.credit_root.as_deref().unwrap_or_default();
            if !ledger.verify_utid(utid, credit_root) {
                let message = format!("UTID {utid} failed verification against its credit root");
                let result = ResolutionResult::new(
                    ResolutionStatus::SignatureMismatch,
                    message,
                    Some(uri),
                )
                .with_metadata(&metadata);
                return Ok(result.into());
            }
        }

        let Some(sandbox) = &self.sandbox else {
            let message = format!("resolved from {source}, but no sandbox is configured");
            let result =
                ResolutionResult::new(ResolutionStatus::NotImplemented, message, Some(uri))
                    .with_metadata(&metadata);
            return Ok(result.into());
        };

        match sandbox.run(&metadata, uri.params()) {
            Ok(output) => self.record_execution(uri, &metadata, output.telemetry, started),
            Err(e) => {
                let mut telemetry = e.telemetry;
                telemetry.insert(keys::LATENCY_MS.into(), json!(elapsed_ms(started)));
                let mut result = ResolutionResult::new(
                    ResolutionStatus::ExecutionError,
                    format!("sandbox execution failed: {}", e.message),
                    Some(uri),
                )
                .with_metadata(&metadata);
                result.telemetry = telemetry;
                Ok(Outcome {
                    result,
                    error: Some(e.message),
                })
            },
        }
    }

    fn lookup(
        &self,
        uri: &CapsuleUri,
    ) -> ResolverResult<Option<(CapsuleMetadata, &'static str)>> {
        if let Some(metadata) = self
            .registry
            .get_capsule(uri)
            .map_err(ResolverError::Registry)?
        {
            return Ok(Some((metadata, "registry")));
        }
        let Some(mesh) = &self.mesh else {
            return Ok(None);
        };
        Ok(mesh
            .find_replica(uri)
            .map_err(ResolverError::Mesh)?
            .map(|metadata| (metadata, "mesh")))
    }

    fn record_execution(
        &self,
        uri: CapsuleUri,
        metadata: &CapsuleMetadata,
        mut telemetry: Telemetry,
        started: Instant,
    ) -> ResolverResult<Outcome> {
        // Sandboxes may leave accounting fields to the registry.
        if !telemetry.contains_key(keys::EXECUTION_COST)
            && let Some(cost) = metadata.execution_cost
        {
            telemetry.insert(keys::EXECUTION_COST.into(), json!(cost));
        }
        if !telemetry.contains_key(keys::CREDIT_ROOT)
            && let Some(root) = &metadata.credit_root
        {
            telemetry.insert(keys::CREDIT_ROOT.into(), json!(root));
        }
        telemetry.insert(keys::LATENCY_MS.into(), json!(elapsed_ms(started)));

        let utid = metadata.utid.as_deref();
        let cost = telemetry.f64_field(keys::EXECUTION_COST);

        if cost.is_some()
            && let Some(ledger) = &self.ledger
        {
            match utid {
                Some(utid) => {
                    ledger.append_execution(utid, &uri, &telemetry)?;
                },
                None => warn!(uri = %uri, "Execution cost reported without a UTID; not recorded"),
            }
        }

        if let Some(proof_hash) = telemetry.str_field(keys::PROOF_HASH) {
            self.emit(
                topics::PROOF,
                json!({
                    "uri": uri.to_uri(),
                    "utid": utid,
                    "proof_hash": proof_hash,
                    "entropy_delta": telemetry.f64_field(keys::ENTROPY_DELTA).unwrap_or(0.0),
                    "timestamp": telemetry.get(keys::TIMESTAMP_EPOCH).cloned().unwrap_or(Value::Null),
                }),
            );
        }

        if let Some(cost) = cost {
            let (author, executor, mesh) = self.credit_split.split(cost);
            self.emit(
                topics::CREDIT_FLOW,
                json!({
                    "uri": uri.to_uri(),
                    "utid": utid,
                    "execution_cost": cost,
                    "author_split": author,
                    "executor_split": executor,
                    "mesh_split": mesh,
                    "balance_after": telemetry.get(keys::BALANCE_AFTER).cloned().unwrap_or(Value::Null),
                }),
            );
        }

        let mut result =
            ResolutionResult::new(ResolutionStatus::Executed, "capsule executed", Some(uri))
                .with_metadata(metadata);
        result.telemetry = telemetry;
        Ok(result.into())
    }

    fn emit_status(&self, outcome: &Outcome, latency_ms: f64) {
        let result = &outcome.result;
        let mut payload = serde_json::Map::new();
        if let Some(uri) = &result.uri {
            payload.insert("uri".into(), json!(uri.to_uri()));
        }
        if let Some(utid) = &result.utid {
            payload.insert("utid".into(), json!(utid));
        }
        payload.insert("status".into(), json!(result.status.code()));
        payload.insert(keys::LATENCY_MS.into(), json!(latency_ms));
        if let Some(error) = &outcome.error {
            payload.insert("error".into(), json!(error));
        }
        self.emit(topics::STATUS, Value::Object(payload));
    }

    fn emit(&self, topic: &str, payload: Value) {
        let Some(emitter) = &self.emitter else {
            return;
        };
        if let Err(e) = emitter.emit(TelemetryEvent::new(topic, payload)) {
            debug!(topic, error = %e, "Telemetry emission failed");
        }
    }
}

impl fmt::Debug for CapsuleResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapsuleResolver")
            .field("mesh", &self.mesh.is_some())
            .field("ledger", &self.ledger.is_some())
            .field("sandbox", &self.sandbox.is_some())
            .field("emitter", &self.emitter.is_some())
            .field("lifecycle", &self.lifecycle.is_some())
            .field("sovereign_root", &self.sovereign_root)
            .field("credit_split", &self.credit_split)
            .finish_non_exhaustive()
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
