//! Capsule Resolver - From `capsule://` URIs to recorded executions.
//!
//! This crate provides:
//! - Collaborator traits: [`Registry`], [`MeshClient`], [`Ledger`],
//!   [`Sandbox`] and [`CapsuleLifecycle`]
//! - An in-memory catalog usable as registry or mesh ([`InMemoryCatalog`])
//!   and a sandbox that replays recorded telemetry ([`ReplaySandbox`])
//! - Sovereign capsule manifests ([`SovereignManifest`])
//! - The resolution pipeline ([`CapsuleResolver`])
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use capsule_core::ResolutionStatus;
//! use capsule_resolver::{CapsuleMetadata, CapsuleResolver, InMemoryCatalog};
//!
//! let registry = InMemoryCatalog::from_entries([(
//!     "capsule://fusion/mhd64/v4.1",
//!     CapsuleMetadata::new().with_utid("fake").with_credit_root("root"),
//! )])
//! .unwrap();
//!
//! let resolver = CapsuleResolver::new(Arc::new(registry));
//!
//! // Found, but there is no sandbox to run it in.
//! let result = resolver.resolve("capsule://fusion/mhd64/v4.1").unwrap();
//! assert_eq!(result.status, ResolutionStatus::NotImplemented);
//! assert_eq!(result.utid.as_deref(), Some("fake"));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod memory;
mod metadata;
mod resolver;
mod sovereign;
mod traits;

pub use error::{CollaboratorError, LifecycleError, ResolverError, ResolverResult, SandboxError};
pub use memory::{InMemoryCatalog, REPLAY_ERROR_KEY, REPLAY_TELEMETRY_KEY, ReplaySandbox};
pub use metadata::CapsuleMetadata;
pub use resolver::{CapsuleResolver, CreditSplit, ResolutionResult};
pub use sovereign::{DEFAULT_SOVEREIGN_VERSION, MANIFEST_FILE, SovereignManifest, sovereign_path};
pub use traits::{CapsuleLifecycle, Ledger, MeshClient, Registry, Sandbox, SandboxOutput};
