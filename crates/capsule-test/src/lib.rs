//! Capsule Test - Shared test utilities for the capsule crates.
//!
//! Mock collaborators, fixtures and a pre-wired resolver harness for use as
//! a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! capsule-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use capsule_test::{FUSION_URI, ResolverHarness};
//!
//! #[test]
//! fn test_fusion_executes() {
//!     let harness = ResolverHarness::fusion();
//!     let result = harness.resolver.resolve(FUSION_URI).unwrap();
//!     assert!(result.is_success());
//!     assert_eq!(harness.ledger.len(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
