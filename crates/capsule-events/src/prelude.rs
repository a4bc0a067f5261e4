//! Prelude module - commonly used types for convenient import.
//!
//! Use `use capsule_events::prelude::*;` to import all essential types.

// Events
pub use crate::{EventMetadata, TelemetryEvent, topics};

// Emitters
pub use crate::{EmitError, EmitResult, FanoutEmitter, TelemetryEmitter, TracingEmitter};

// Bus
pub use crate::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
