//! Capsule Crypto - Hashing primitives for the credit ledger.
//!
//! This crate provides:
//! - SHA3-512 content digests ([`Sha3Digest`])
//! - Lineage-chained Universal Traceable IDs ([`compute_utid`])
//! - Merkle construction over UTIDs with inclusion proofs ([`MerkleTree`])
//!
//! All hashes cross API boundaries as lowercase hex strings.
//!
//! # Example
//!
//! ```
//! use capsule_crypto::{MerkleTree, compute_utid, verify_proof};
//!
//! let parent = compute_utid("capsule-hash", "", "credit-root");
//! let child = compute_utid("capsule-hash", &parent, "credit-root");
//!
//! let tree = MerkleTree::from_leaves([parent.as_str(), child.as_str()]);
//! let proof = tree.proof(1).unwrap();
//! assert!(verify_proof(&child, &tree.root(), &proof));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod digest;
mod error;
mod merkle;
mod utid;

pub use digest::{DIGEST_LEN, Sha3Digest};
pub use error::{CryptoError, CryptoResult};
pub use merkle::{Direction, MerkleTree, ProofStep, combine, leaf_hash, verify_proof};
pub use utid::{UTID_SEPARATOR, compute_utid};
