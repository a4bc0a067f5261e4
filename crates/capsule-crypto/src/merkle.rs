//! Merkle construction over UTIDs.
//!
//! Leaves are `SHA3-512(utid)`. Interior nodes hash the concatenation of the
//! two child hex strings. A level with an odd node count pairs its last node
//! with itself. An empty tree has the empty string as its root.

use serde::{Deserialize, Serialize};

use crate::digest::Sha3Digest;

/// Which side of the running hash a sibling goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Sibling is prepended: `H(sibling ‖ running)`.
    #[serde(rename = "L")]
    Left,
    /// Sibling is appended: `H(running ‖ sibling)`.
    #[serde(rename = "R")]
    Right,
}

/// One step of an inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Side the sibling is placed on.
    pub direction: Direction,
    /// Sibling hash (hex).
    pub sibling: String,
}

/// Hash a UTID into a leaf.
#[must_use]
pub fn leaf_hash(utid: &str) -> String {
    Sha3Digest::hash(utid.as_bytes()).to_hex()
}

/// Hash two nodes into their parent.
#[must_use]
pub fn combine(left: &str, right: &str) -> String {
    Sha3Digest::hash_multi(&[left.as_bytes(), right.as_bytes()]).to_hex()
}

/// A fully materialized Merkle tree.
///
/// `levels[0]` holds the leaf hashes and the last level holds the root.
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    levels: Vec<Vec<String>>,
}

impl MerkleTree {
    /// Build a tree over UTIDs in insertion order.
    pub fn from_leaves<I, S>(utids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let leaves: Vec<String> = utids.into_iter().map(|u| leaf_hash(u.as_ref())).collect();
        if leaves.is_empty() {
            return Self::default();
        }

        let mut levels = vec![leaves];
        while let Some(level) = levels.last().filter(|l| l.len() > 1) {
            let next = level
                .chunks(2)
                .filter_map(|pair| Some(combine(pair.first()?, pair.last()?)))
                .collect();
            levels.push(next);
        }
        Self { levels }
    }

    /// Number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Root hash, or the empty string for an empty tree.
    #[must_use]
    pub fn root(&self) -> String {
        self.levels
            .last()
            .and_then(|level| level.first())
            .cloned()
            .unwrap_or_default()
    }

    /// Inclusion proof for the leaf at `index`, ordered from leaf to root.
    ///
    /// Returns `None` if `index` is out of range.
    #[must_use]
    pub fn proof(&self, index: usize) -> Option<Vec<ProofStep>> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut path = Vec::new();
        let mut index = index;
        let below_root = self.levels.len().saturating_sub(1);
        for level in self.levels.iter().take(below_root) {
            let step = if index.is_multiple_of(2) {
                // Odd tail pairs with itself.
                let sibling = level
                    .get(index.saturating_add(1))
                    .or_else(|| level.get(index))?;
                ProofStep {
                    direction: Direction::Right,
                    sibling: sibling.clone(),
                }
            } else {
                ProofStep {
                    direction: Direction::Left,
                    sibling: level.get(index.saturating_sub(1))?.clone(),
                }
            };
            path.push(step);
            index /= 2;
        }
        Some(path)
    }
}

/// Replay `path` from a freshly hashed leaf and compare against `root`.
///
/// An empty root never verifies.
#[must_use]
pub fn verify_proof(utid: &str, root: &str, path: &[ProofStep]) -> bool {
    if root.is_empty() {
        return false;
    }
    let computed = path.iter().fold(leaf_hash(utid), |running, step| {
        match step.direction {
            Direction::Right => combine(&running, &step.sibling),
            Direction::Left => combine(&step.sibling, &running),
        }
    });
    computed == root
}
