//! Prelude module - commonly used types for convenient import.
//!
//! Use `use capsule_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Hashing
pub use crate::{DIGEST_LEN, Sha3Digest};

// UTIDs
pub use crate::compute_utid;

// Merkle proofs
pub use crate::{Direction, MerkleTree, ProofStep, verify_proof};
