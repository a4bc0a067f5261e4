//! In-memory collaborators: a capsule catalog usable as a registry or a
//! mesh, and a sandbox that replays telemetry recorded in the metadata.

use std::collections::HashMap;

use capsule_core::{CapsuleUri, CoreResult, Params, Telemetry};
use dashmap::DashMap;
use serde_json::Value;
use tracing::trace;

use crate::error::{CollaboratorError, SandboxError};
use crate::metadata::CapsuleMetadata;
use crate::traits::{MeshClient, Registry, Sandbox, SandboxOutput};

/// Metadata key holding the telemetry object [`ReplaySandbox`] returns.
pub const REPLAY_TELEMETRY_KEY: &str = "telemetry";

/// Metadata key holding a failure message [`ReplaySandbox`] raises.
pub const REPLAY_ERROR_KEY: &str = "sandbox_error";

/// Concurrent map from capsule address to metadata.
///
/// Lookups ignore the query string: `capsule://a/b/c?x=1` finds the entry
/// registered for `capsule://a/b/c`.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    capsules: DashMap<String, CapsuleMetadata>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from `uri -> metadata` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if any key is not a valid capsule URI.
    pub fn from_entries<I, S>(entries: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (S, CapsuleMetadata)>,
        S: AsRef<str>,
    {
        let catalog = Self::new();
        for (uri, metadata) in entries {
            catalog.insert(&CapsuleUri::parse(uri.as_ref())?, metadata);
        }
        Ok(catalog)
    }

    /// Register metadata for a capsule, replacing any previous entry.
    pub fn insert(&self, uri: &CapsuleUri, metadata: CapsuleMetadata) -> Option<CapsuleMetadata> {
        self.capsules.insert(uri.address(), metadata)
    }

    /// Remove a capsule.
    pub fn remove(&self, uri: &CapsuleUri) -> Option<CapsuleMetadata> {
        self.capsules.remove(&uri.address()).map(|(_, metadata)| metadata)
    }

    /// Look up a capsule.
    #[must_use]
    pub fn get(&self, uri: &CapsuleUri) -> Option<CapsuleMetadata> {
        let found = self
            .capsules
            .get(&uri.address())
            .map(|entry| entry.value().clone());
        trace!(uri = %uri, hit = found.is_some(), "Catalog lookup");
        found
    }

    /// Number of registered capsules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.capsules.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capsules.is_empty()
    }

    /// Snapshot of all entries keyed by address.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, CapsuleMetadata> {
        self.capsules
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl Registry for InMemoryCatalog {
    fn get_capsule(&self, uri: &CapsuleUri) -> Result<Option<CapsuleMetadata>, CollaboratorError> {
        Ok(self.get(uri))
    }
}

impl MeshClient for InMemoryCatalog {
    fn find_replica(
        &self,
        uri: &CapsuleUri,
    ) -> Result<Option<CapsuleMetadata>, CollaboratorError> {
        Ok(self.get(uri))
    }
}

/// Deterministic sandbox that replays what the catalog says a run produces.
///
/// The run's telemetry is the metadata's `telemetry` object. If the
/// metadata also carries a `sandbox_error` string, the run fails with that
/// message and the same telemetry as partial output. Params are echoed
/// under `params` so callers can see what was passed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaySandbox;

impl Sandbox for ReplaySandbox {
    fn run(
        &self,
        metadata: &CapsuleMetadata,
        params: &Params,
    ) -> Result<SandboxOutput, SandboxError> {
        let mut telemetry = match metadata.extra.get(REPLAY_TELEMETRY_KEY) {
            Some(Value::Object(recorded)) => recorded.clone(),
            _ => Telemetry::new(),
        };
        if !params.is_empty() {
            let echoed = params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            telemetry.insert("params".to_owned(), Value::Object(echoed));
        }

        if let Some(message) = metadata.extra.get(REPLAY_ERROR_KEY).and_then(Value::as_str) {
            return Err(SandboxError::new(message).with_telemetry(telemetry));
        }
        Ok(SandboxOutput::new(telemetry))
    }
}
