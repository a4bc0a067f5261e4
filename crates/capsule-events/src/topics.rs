//! Well-known telemetry topics.

/// Outcome of every resolution: `{uri, utid?, status, latency_ms?, error?}`.
pub const STATUS: &str = "capsule.status";

/// Execution proof: `{uri, utid, proof_hash, entropy_delta, timestamp}`.
pub const PROOF: &str = "capsule.proof";

/// Credit distribution:
/// `{uri, utid, execution_cost, author_split, executor_split, mesh_split, balance_after}`.
pub const CREDIT_FLOW: &str = "capsule.credit_flow";

/// All topics published by the resolver.
pub const ALL: [&str; 3] = [STATUS, PROOF, CREDIT_FLOW];
