//! Prelude module - commonly used test utilities.
//!
//! Use `use capsule_test::prelude::*;` to import all essential types.

// Mocks
pub use crate::{
    DeterministicSandbox, FailingEmitter, FailingRegistry, FailingSandbox, RecordingEmitter,
    ScriptedLifecycle,
};

// Fixtures
pub use crate::{FUSION_URI, fusion_catalog, fusion_metadata, install_sovereign, test_uri};

// Harness
pub use crate::ResolverHarness;
