//! Universal Traceable IDs.
//!
//! A UTID is the SHA3-512 of `capsule_hash|parent_utid|credit_root`. Child
//! executions pass their parent's UTID, so lineage is carried in the ID itself
//! and needs no separate custody table.

use crate::digest::Sha3Digest;

/// Separator placed between the three UTID components.
pub const UTID_SEPARATOR: &str = "|";

/// Compute a UTID. Pass an empty `parent_utid` for a root execution.
#[must_use]
pub fn compute_utid(capsule_hash: &str, parent_utid: &str, credit_root: &str) -> String {
    Sha3Digest::hash_multi(&[
        capsule_hash.as_bytes(),
        UTID_SEPARATOR.as_bytes(),
        parent_utid.as_bytes(),
        UTID_SEPARATOR.as_bytes(),
        credit_root.as_bytes(),
    ])
    .to_hex()
}
