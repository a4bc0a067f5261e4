//! Prelude module - commonly used types for convenient import.
//!
//! Use `use capsule_resolver::prelude::*;` to import all essential types.

// Errors
pub use crate::{CollaboratorError, LifecycleError, ResolverError, ResolverResult, SandboxError};

// Collaborators
pub use crate::{CapsuleLifecycle, Ledger, MeshClient, Registry, Sandbox, SandboxOutput};

// Pipeline
pub use crate::{
    CapsuleMetadata, CapsuleResolver, CreditSplit, InMemoryCatalog, ReplaySandbox, ResolutionResult,
};

// Sovereign capsules
pub use crate::SovereignManifest;
