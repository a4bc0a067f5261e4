//! Collaborator interfaces injected into the resolver.
//!
//! All collaborators are shared across concurrent resolutions and must be
//! thread-safe.

use std::path::Path;

use capsule_core::{CapsuleUri, Params, Telemetry};
use capsule_ledger::{CreditLedger, LedgerEntry, LedgerResult};

use crate::error::{CollaboratorError, LifecycleError, SandboxError};
use crate::metadata::CapsuleMetadata;
use crate::sovereign::SovereignManifest;

/// Local, synchronous capsule lookup.
pub trait Registry: Send + Sync {
    /// Look up metadata for `uri`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend failed. A miss is `Ok(None)`.
    fn get_capsule(&self, uri: &CapsuleUri) -> Result<Option<CapsuleMetadata>, CollaboratorError>;
}

/// Remote fallback lookup used when the registry misses.
pub trait MeshClient: Send + Sync {
    /// Find a replica of `uri` on the mesh.
    ///
    /// # Errors
    ///
    /// Returns an error only if the mesh failed. A miss is `Ok(None)`.
    fn find_replica(&self, uri: &CapsuleUri)
    -> Result<Option<CapsuleMetadata>, CollaboratorError>;
}

/// The ledger operations the resolver needs.
pub trait Ledger: Send + Sync {
    /// Check a UTID against its credit root.
    fn verify_utid(&self, utid: &str, credit_root: &str) -> bool;

    /// Record an execution.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate UTID or a storage failure.
    fn append_execution(
        &self,
        utid: &str,
        uri: &CapsuleUri,
        telemetry: &Telemetry,
    ) -> LedgerResult<LedgerEntry>;
}

impl Ledger for CreditLedger {
    fn verify_utid(&self, utid: &str, credit_root: &str) -> bool {
        CreditLedger::verify_utid(self, utid, credit_root)
    }

    fn append_execution(
        &self,
        utid: &str,
        uri: &CapsuleUri,
        telemetry: &Telemetry,
    ) -> LedgerResult<LedgerEntry> {
        CreditLedger::append_execution(self, utid, uri, telemetry)
    }
}

/// What a sandbox returns from a successful run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SandboxOutput {
    /// Execution telemetry (`proof_hash`, `execution_cost`, ...).
    pub telemetry: Telemetry,
}

impl SandboxOutput {
    /// Wrap telemetry.
    #[must_use]
    pub fn new(telemetry: Telemetry) -> Self {
        Self { telemetry }
    }
}

/// Executes a resolved capsule.
///
/// May block for an arbitrary time. Timeouts are the caller's concern.
pub trait Sandbox: Send + Sync {
    /// Run the capsule.
    ///
    /// # Errors
    ///
    /// Returns a [`SandboxError`] carrying any partial telemetry if the
    /// execution fails.
    fn run(&self, metadata: &CapsuleMetadata, params: &Params) -> Result<SandboxOutput, SandboxError>;
}

/// Loads and ignites sovereign capsules.
pub trait CapsuleLifecycle: Send + Sync {
    /// Load the manifest from a sovereign capsule directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is missing or invalid.
    fn load_manifest(&self, dir: &Path) -> Result<SovereignManifest, LifecycleError> {
        SovereignManifest::load(dir)
    }

    /// Run the capsule's ignition hook.
    ///
    /// # Errors
    ///
    /// Returns an error if ignition fails.
    fn ignite(
        &self,
        manifest: &SovereignManifest,
        params: &Params,
    ) -> Result<Telemetry, LifecycleError>;
}
