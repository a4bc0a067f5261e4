//! Capsule Telemetry - logging setup for the capsule resolver.
//!
//! Installs a `tracing-subscriber` stack: an `EnvFilter` built from a base
//! level plus per-crate directives, and one `fmt` layer in pretty, compact,
//! JSON or full format writing to stdout, stderr or rolling files.
//!
//! With the `config` feature, a [`LogConfig`] can be built from the
//! `[logging]` section of `capsule-config`.
//!
//! # Example
//!
//! ```rust,no_run
//! use capsule_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), capsule_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("capsule_ledger=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!(utid = "abc", "Capsule executed");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

#[cfg(feature = "config")]
mod config_bridge;
mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    DEFAULT_FILE_PREFIX, FileRotation, LogConfig, LogFormat, LogTarget, build_subscriber,
    setup_default_logging, setup_logging,
};
