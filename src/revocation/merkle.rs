// src/revocation/merkle.rs
//! Commutative keccak Merkle tree.
//!
//! Pair hashing sorts the two children before hashing, so a verifier
//! recomputing the root from a proof does not need position bits. Leaves
//! are sorted before the tree is built, which makes the root a pure
//! function of the leaf set regardless of insertion order. An odd node at
//! any level is promoted unhashed.

use ethers::utils::keccak256;

/// A 32-byte node or leaf hash.
pub type Hash32 = [u8; 32];

/// Hashes a revocation key into its leaf.
pub fn hash_leaf(key: &str) -> Hash32 {
    keccak256(key.as_bytes())
}

/// Order-independent pair hash: children are sorted before concatenation.
fn hash_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo);
    buf[32..].copy_from_slice(hi);
    keccak256(buf)
}

/// Membership proof: the leaf plus its sibling path to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: Hash32,
    /// Sibling hashes from the leaf level up. A level where the node was
    /// promoted contributes no sibling.
    pub siblings: Vec<Hash32>,
}

/// A Merkle tree over a set of leaves.
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    /// Levels from leaves (index 0) up to the root.
    levels: Vec<Vec<Hash32>>,
}

impl MerkleTree {
    /// Builds a tree over `leaves`.
    ///
    /// The leaf set is sorted first, so two trees over the same set are
    /// identical regardless of the order leaves were supplied in.
    pub fn build(mut leaves: Vec<Hash32>) -> Self {
        if leaves.is_empty() {
            return MerkleTree { levels: Vec::new() };
        }
        leaves.sort_unstable();
        let mut levels = vec![leaves];
        while levels.last().map_or(false, |l| l.len() > 1) {
            let current = levels.last().unwrap();
            let mut next = Vec::with_capacity((current.len() + 1) / 2);
            for pair in current.chunks(2) {
                match pair {
                    [a, b] => next.push(hash_pair(a, b)),
                    // Odd node, promoted unchanged.
                    [a] => next.push(*a),
                    _ => unreachable!("chunks(2) yields one or two elements"),
                }
            }
            levels.push(next);
        }
        MerkleTree { levels }
    }

    /// The root hash. The empty tree's root is all zeroes.
    pub fn root(&self) -> Hash32 {
        self.levels
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    /// Builds a membership proof for `leaf`, or `None` when absent.
    pub fn proof_for(&self, leaf: &Hash32) -> Option<MerkleProof> {
        let base = self.levels.first()?;
        let mut index = base.iter().position(|l| l == leaf)?;
        let mut siblings = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = index ^ 1;
            if let Some(sibling) = level.get(sibling_index) {
                siblings.push(*sibling);
            }
            // Promoted odd nodes keep their hash, so the parent index still
            // halves.
            index /= 2;
        }
        Some(MerkleProof {
            leaf: *leaf,
            siblings,
        })
    }
}

/// Recomputes the root from a proof and compares it against `root`.
pub fn verify_proof(root: &Hash32, proof: &MerkleProof) -> bool {
    let mut acc = proof.leaf;
    for sibling in &proof.siblings {
        acc = hash_pair(&acc, sibling);
    }
    acc == *root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(keys: &[&str]) -> Vec<Hash32> {
        keys.iter().map(|k| hash_leaf(k)).collect()
    }

    #[test]
    fn test_empty_tree_has_zero_root() {
        let tree = MerkleTree::build(vec![]);
        assert_eq!(tree.root(), [0u8; 32]);
        assert!(tree.proof_for(&hash_leaf("missing")).is_none());
    }

    #[test]
    fn test_root_is_order_independent() {
        let a = MerkleTree::build(leaves(&["one", "two", "three"]));
        let b = MerkleTree::build(leaves(&["three", "one", "two"]));
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_proofs_verify_for_all_members() {
        for n in 1..=7 {
            let keys: Vec<String> = (0..n).map(|i| format!("cred-{}", i)).collect();
            let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            let tree = MerkleTree::build(leaves(&key_refs));
            for key in &keys {
                let leaf = hash_leaf(key);
                let proof = tree.proof_for(&leaf).expect("member must have a proof");
                assert!(verify_proof(&tree.root(), &proof), "n={} key={}", n, key);
            }
        }
    }

    #[test]
    fn test_proof_fails_against_wrong_root() {
        let tree = MerkleTree::build(leaves(&["one", "two", "three"]));
        let other = MerkleTree::build(leaves(&["one", "two"]));
        let proof = tree.proof_for(&hash_leaf("one")).unwrap();
        assert!(!verify_proof(&other.root(), &proof));
    }

    #[test]
    fn test_non_member_has_no_proof() {
        let tree = MerkleTree::build(leaves(&["one", "two"]));
        assert!(tree.proof_for(&hash_leaf("three")).is_none());
    }
}
