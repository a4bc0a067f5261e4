//! Well-known telemetry keys.
//!
//! Sandboxes report execution results under these keys; the ledger and the
//! resolver read them back.

/// Hash committing to the execution's output.
pub const PROOF_HASH: &str = "proof_hash";
/// Credit root the execution is accounted against.
pub const CREDIT_ROOT: &str = "credit_root";
/// Credits consumed by the execution.
pub const EXECUTION_COST: &str = "execution_cost";
/// Execution time as seconds since the Unix epoch.
pub const TIMESTAMP_EPOCH: &str = "timestamp_epoch";
/// Entropy change reported by the sandbox.
pub const ENTROPY_DELTA: &str = "entropy_delta";
/// Caller balance after the execution was charged.
pub const BALANCE_AFTER: &str = "balance_after";
/// Wall-clock resolution latency in milliseconds.
pub const LATENCY_MS: &str = "latency_ms";
