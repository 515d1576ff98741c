// src/revocation/registry.rs
//! Revocation registry.
//!
//! Holds the set of revoked credential keys and maintains a Merkle tree
//! over them. The tree is rebuilt from scratch on every mutation; roots
//! depend only on the current key set, so a registry reconstructed from
//! the same keys produces the same root.

use crate::revocation::merkle::{hash_leaf, verify_proof, Hash32, MerkleProof, MerkleTree};
use log::info;

/// Set of revoked credentials with Merkle-provable membership.
#[derive(Debug, Default)]
pub struct RevocationMerkleRegistry {
    keys: Vec<String>,
    tree: MerkleTree,
}

impl RevocationMerkleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        RevocationMerkleRegistry::default()
    }

    /// Creates a registry pre-populated with `keys`. Duplicates collapse.
    pub fn with_keys(keys: Vec<String>) -> Self {
        let mut registry = RevocationMerkleRegistry::new();
        for key in keys {
            registry.add(&key);
        }
        registry
    }

    /// Number of revoked keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when nothing is revoked.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Revokes `key`. Returns `true` when the set changed.
    pub fn add(&mut self, key: &str) -> bool {
        if self.keys.iter().any(|k| k == key) {
            return false;
        }
        self.keys.push(key.to_string());
        self.rebuild();
        info!("revoked credential key {}", key);
        true
    }

    /// Un-revokes `key`. Returns `true` when the set changed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        if self.keys.len() == before {
            return false;
        }
        self.rebuild();
        info!("restored credential key {}", key);
        true
    }

    fn rebuild(&mut self) {
        self.tree = MerkleTree::build(self.keys.iter().map(|k| hash_leaf(k)).collect());
    }

    /// Current Merkle root over the revoked set.
    pub fn root(&self) -> Hash32 {
        self.tree.root()
    }

    /// Membership proof for `key`, or `None` when it is not revoked.
    pub fn prove_membership(&self, key: &str) -> Option<MerkleProof> {
        self.tree.proof_for(&hash_leaf(key))
    }

    /// Whether `key` is revoked.
    ///
    /// A fresh membership proof is generated when none is supplied. Both
    /// the proof and current raw membership must hold; a stale proof
    /// against a rotated root answers `false`.
    pub fn is_revoked(&self, key: &str, proof: Option<&MerkleProof>) -> bool {
        let member = self.keys.iter().any(|k| k == key);
        let proven = match proof {
            Some(proof) => {
                proof.leaf == hash_leaf(key) && verify_proof(&self.root(), proof)
            }
            None => self
                .prove_membership(key)
                .map_or(false, |p| verify_proof(&self.root(), &p)),
        };
        member && proven
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_then_revoked() {
        let mut registry = RevocationMerkleRegistry::new();
        assert!(!registry.is_revoked("cred-1", None));

        assert!(registry.add("cred-1"));
        assert!(registry.is_revoked("cred-1", None));

        // Re-adding is a no-op.
        assert!(!registry.add("cred-1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_restores() {
        let mut registry = RevocationMerkleRegistry::with_keys(vec![
            "cred-1".to_string(),
            "cred-2".to_string(),
        ]);
        assert!(registry.remove("cred-1"));
        assert!(!registry.is_revoked("cred-1", None));
        assert!(registry.is_revoked("cred-2", None));
        assert!(!registry.remove("cred-1"));
    }

    #[test]
    fn test_root_changes_on_mutation() {
        let mut registry = RevocationMerkleRegistry::new();
        let empty_root = registry.root();

        registry.add("cred-1");
        let after_add = registry.root();
        assert_ne!(empty_root, after_add);

        registry.add("cred-2");
        assert_ne!(after_add, registry.root());

        registry.remove("cred-2");
        assert_eq!(after_add, registry.root());
    }

    #[test]
    fn test_root_is_stable_across_reconstruction() {
        let mut a = RevocationMerkleRegistry::new();
        a.add("cred-1");
        a.add("cred-2");
        a.add("cred-3");

        let b = RevocationMerkleRegistry::with_keys(vec![
            "cred-3".to_string(),
            "cred-1".to_string(),
            "cred-2".to_string(),
        ]);
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_proof_checked_against_current_root() {
        let mut registry = RevocationMerkleRegistry::new();
        registry.add("cred-1");
        registry.add("cred-2");

        let proof = registry.prove_membership("cred-1").unwrap();
        assert!(registry.is_revoked("cred-1", Some(&proof)));

        // Root rotation invalidates the old proof.
        registry.add("cred-3");
        assert!(!registry.is_revoked("cred-1", Some(&proof)));
        assert!(registry.is_revoked("cred-1", None));

        // A fresh proof verifies again.
        let fresh = registry.prove_membership("cred-1").unwrap();
        assert!(registry.is_revoked("cred-1", Some(&fresh)));
    }

    #[test]
    fn test_no_proof_for_unrevoked_key() {
        let mut registry = RevocationMerkleRegistry::new();
        registry.add("cred-1");
        assert!(registry.prove_membership("cred-2").is_none());
    }
}
