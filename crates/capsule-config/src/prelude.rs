//! Prelude module - commonly used types for convenient import.
//!
//! Use `use capsule_config::prelude::*;` to import all essential types.

// Errors
pub use crate::{ConfigError, ConfigResult};

// Configuration
pub use crate::{
    Config, CreditsSection, EventsSection, LedgerSection, LoggingSection, ReconciliationSection,
    ResolverSection,
};

// Provenance
pub use crate::{ConfigLayer, ResolvedConfig, ShowFormat};
