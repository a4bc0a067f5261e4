//! Capsule Core - Foundation types for capsule resolution.
//!
//! This crate provides:
//! - The `capsule://` URI grammar ([`CapsuleUri`])
//! - Resolution status codes ([`ResolutionStatus`])
//! - Telemetry and parameter aliases shared by the resolver and the ledger
//!
//! # Example
//!
//! ```
//! use capsule_core::CapsuleUri;
//!
//! let uri = CapsuleUri::parse("capsule://fusion/plasma/mhd/solve/v4.1?steps=10").unwrap();
//! assert_eq!(uri.domain(), "plasma");
//! assert_eq!(uri.subdomains(), ["mhd".to_string()]);
//! assert_eq!(uri.operation(), "solve");
//! assert_eq!(uri.version(), Some("v4.1"));
//! assert_eq!(uri.param("steps"), Some("10"));
//!
//! // Serialization is a left inverse of parsing.
//! assert_eq!(CapsuleUri::parse(&uri.to_uri()).unwrap(), uri);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod keys;
pub mod prelude;

mod error;
mod status;
mod types;
mod uri;

pub use error::{CoreError, CoreResult};
pub use status::ResolutionStatus;
pub use types::{Params, Telemetry, TelemetryExt};
pub use uri::{CapsuleUri, SCHEME, SOVEREIGN_DOMAIN};
