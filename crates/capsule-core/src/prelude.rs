//! Prelude module - commonly used types for convenient import.
//!
//! Use `use capsule_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// URI grammar
pub use crate::{CapsuleUri, SCHEME, SOVEREIGN_DOMAIN};

// Status and telemetry
pub use crate::{Params, ResolutionStatus, Telemetry, TelemetryExt};
