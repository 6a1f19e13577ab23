//! Deterministic binary Merkle tree over domain-separated SHA-256.
//!
//! Leaves are hashed with [`crate::hash::leaf_hash`], interior nodes with
//! [`crate::hash::interior_hash`]; the two never collide. A level of odd
//! length is balanced by promoting its trailing node unchanged to the next
//! level rather than duplicating it — this is the "left-perfect" rule:
//! nodes pair left-to-right, and an unpaired trailing node passes straight
//! through.

use crate::error::{Error, ProofError, Result};
use crate::hash::{self, Hash};

/// A complete Merkle tree, stored layer by layer with layer 0 holding the
/// leaves and the last layer holding a single root hash.
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    layers: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree from already-hashed leaves.
    pub fn from_leaf_hashes(leaves: Vec<Hash>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(Error::WireFormat(
                "cannot build a Merkle tree with zero leaves".into(),
            ));
        }

        let mut layers = vec![leaves];
        while layers.last().expect("layers is never empty").len() > 1 {
            let prev = layers.last().expect("layers is never empty");
            let mut next = Vec::with_capacity(prev.len().div_ceil(2));
            let mut i = 0;
            while i < prev.len() {
                if i + 1 < prev.len() {
                    next.push(hash::interior_hash(&prev[i], &prev[i + 1]));
                } else {
                    next.push(prev[i]);
                }
                i += 2;
            }
            layers.push(next);
        }

        Ok(Self { layers })
    }

    /// Build a tree from raw leaf content, hashing each with [`hash::leaf_hash`].
    pub fn from_leaves<I, B>(contents: I) -> Result<Self>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self::from_leaf_hashes(contents.into_iter().map(|c| hash::leaf_hash(c.as_ref())).collect())
    }

    /// The tree's root hash.
    pub fn root(&self) -> Hash {
        *self
            .layers
            .last()
            .expect("layers is never empty")
            .first()
            .expect("top layer always has exactly one entry")
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Height of the tree (number of layers above the leaves).
    pub fn height(&self) -> usize {
        self.layers.len() - 1
    }

    /// Produce an inclusion proof for the leaf at `index`.
    pub fn proof_for(&self, index: usize) -> Result<Proof> {
        let num_leaves = self.leaf_count();
        if index >= num_leaves {
            return Err(Error::Integrity(ProofError::WrongFormat(format!(
                "leaf index {index} out of bounds for {num_leaves} leaves"
            ))));
        }

        let mut lemma = vec![self.layers[0][index]];
        let mut path = Vec::new();
        let mut idx = index;

        for layer in &self.layers[..self.layers.len() - 1] {
            let len = layer.len();
            if idx % 2 == 1 {
                lemma.push(layer[idx - 1]);
                path.push(false);
            } else if idx + 1 < len {
                lemma.push(layer[idx + 1]);
                path.push(true);
            }
            idx /= 2;
        }

        // A single-leaf tree has no siblings to walk past; its root is the
        // leaf hash itself, already the lemma's only entry, so no distinct
        // root entry is appended.
        if !path.is_empty() {
            lemma.push(self.root());
        }
        Ok(Proof { lemma, path })
    }
}

/// A Merkle inclusion proof: the proved leaf's hash, the sibling hashes
/// encountered walking up to the root, and the root itself, plus a `path`
/// boolean per sibling (`true` means the proved node was the left child at
/// that level).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Proof {
    pub lemma: Vec<Hash>,
    pub path: Vec<bool>,
}

impl Proof {
    /// Validate this proof against `leaf_content` at the claimed `index`
    /// within a tree of `num_leaves` leaves and the given `expected_root`.
    ///
    /// Walks the same level-length sequence (`len`, then `ceil(len/2)`, ...,
    /// down to `1`) that tree construction used, matching each `path` bit
    /// against the parity of the recomputed index at that level. This
    /// catches proofs that are internally consistent (a correct hash chain)
    /// but were issued for a different leaf position than claimed.
    pub fn validate(
        &self,
        leaf_content: &[u8],
        index: usize,
        num_leaves: usize,
        expected_root: &Hash,
    ) -> std::result::Result<(), ProofError> {
        self.validate_leaf_hash(hash::leaf_hash(leaf_content), index, num_leaves, expected_root)
    }

    /// Like [`Self::validate`], but for trees built over already-hashed
    /// leaves (e.g. a file tree whose leaves are segment roots) where the
    /// caller has already produced the leaf hash rather than raw content.
    pub fn validate_leaf_hash(
        &self,
        leaf: Hash,
        index: usize,
        num_leaves: usize,
        expected_root: &Hash,
    ) -> std::result::Result<(), ProofError> {
        if self.lemma.is_empty() {
            return Err(ProofError::WrongFormat("empty lemma".into()));
        }
        if index >= num_leaves {
            return Err(ProofError::PositionMismatch);
        }

        if leaf != self.lemma[0] {
            return Err(ProofError::ContentMismatch);
        }

        let mut computed = leaf;
        let mut idx = index;
        let mut level_len = num_leaves;
        let mut sib_cursor = 1usize;
        let mut path_cursor = 0usize;

        while level_len > 1 {
            let sibling_exists = !(idx % 2 == 0 && idx + 1 >= level_len);
            if sibling_exists {
                let bit = *self.path.get(path_cursor).ok_or_else(|| {
                    ProofError::RootRecomputationFailure("path exhausted before root".into())
                })?;
                let expected_bit = idx % 2 == 0;
                if bit != expected_bit {
                    return Err(ProofError::PositionMismatch);
                }
                let sibling = *self.lemma.get(sib_cursor).ok_or_else(|| {
                    ProofError::RootRecomputationFailure("lemma exhausted before root".into())
                })?;
                computed = if bit {
                    hash::interior_hash(&computed, &sibling)
                } else {
                    hash::interior_hash(&sibling, &computed)
                };
                sib_cursor += 1;
                path_cursor += 1;
            }
            idx /= 2;
            level_len = level_len.div_ceil(2);
        }

        if path_cursor != self.path.len() {
            return Err(ProofError::WrongFormat(
                "proof carries entries unused by this tree shape".into(),
            ));
        }

        // A single-leaf tree has no siblings: its root is the leaf hash
        // itself, and the lemma carries no separate root entry.
        let num_siblings = sib_cursor - 1;
        let claimed_root = if num_siblings == 0 {
            if self.lemma.len() != 1 {
                return Err(ProofError::WrongFormat(
                    "single-leaf proof must carry exactly the leaf hash".into(),
                ));
            }
            self.lemma[0]
        } else {
            if self.lemma.len() != num_siblings + 2 {
                return Err(ProofError::WrongFormat(
                    "proof carries entries unused by this tree shape".into(),
                ));
            }
            self.lemma[self.lemma.len() - 1]
        };

        if computed != claimed_root {
            return Err(ProofError::RootMismatch);
        }
        if claimed_root != *expected_root {
            return Err(ProofError::RootMismatch);
        }

        Ok(())
    }
}

/// Incrementally build a [`MerkleTree`] by appending leaf content or
/// already-computed leaf hashes.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    leaves: Vec<Hash>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, content: &[u8]) -> &mut Self {
        self.leaves.push(hash::leaf_hash(content));
        self
    }

    pub fn append_hash(&mut self, leaf_hash: Hash) -> &mut Self {
        self.leaves.push(leaf_hash);
        self
    }

    pub fn build(self) -> Result<MerkleTree> {
        MerkleTree::from_leaf_hashes(self.leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| vec![i as u8; 4]).collect()
    }

    #[test]
    fn single_leaf_tree_roots_to_its_own_leaf_hash() {
        let tree = MerkleTree::from_leaves(leaves(1)).unwrap();
        assert_eq!(tree.root(), hash::leaf_hash(&[0u8; 4]));
        assert_eq!(tree.height(), 0);
    }

    #[test]
    fn power_of_two_leaf_counts_produce_full_binary_tree() {
        let tree = MerkleTree::from_leaves(leaves(8)).unwrap();
        assert_eq!(tree.height(), 3);
    }

    #[test]
    fn odd_leaf_count_promotes_trailing_node_unchanged() {
        // 3 leaves: level0 len 3 -> pair(0,1), promote(2) -> level1 len 2 -> pair -> root.
        let data = leaves(3);
        let tree = MerkleTree::from_leaves(data.clone()).unwrap();
        let h0 = hash::leaf_hash(&data[0]);
        let h1 = hash::leaf_hash(&data[1]);
        let h2 = hash::leaf_hash(&data[2]);
        let combined01 = hash::interior_hash(&h0, &h1);
        let expected_root = hash::interior_hash(&combined01, &h2);
        assert_eq!(tree.root(), expected_root);
    }

    #[test]
    fn single_leaf_proof_has_a_one_entry_lemma_and_no_path() {
        let tree = MerkleTree::from_leaves(leaves(1)).unwrap();
        let proof = tree.proof_for(0).unwrap();
        assert_eq!(proof.lemma, vec![hash::leaf_hash(&[0u8; 4])]);
        assert!(proof.path.is_empty());
        proof.validate(&[0u8; 4], 0, 1, &tree.root()).unwrap();
    }

    #[test]
    fn proof_validates_for_every_leaf_across_several_sizes() {
        for n in [1usize, 2, 3, 4, 5, 7, 8, 9, 16, 17] {
            let data = leaves(n);
            let tree = MerkleTree::from_leaves(data.clone()).unwrap();
            let root = tree.root();
            for i in 0..n {
                let proof = tree.proof_for(i).unwrap();
                proof.validate(&data[i], i, n, &root).unwrap_or_else(|e| {
                    panic!("proof for leaf {i} of {n} failed to validate: {e}")
                });
            }
        }
    }

    #[test]
    fn tampered_content_is_rejected_as_content_mismatch() {
        let data = leaves(5);
        let tree = MerkleTree::from_leaves(data.clone()).unwrap();
        let root = tree.root();
        let proof = tree.proof_for(2).unwrap();
        let err = proof.validate(b"not the real content", 2, 5, &root).unwrap_err();
        assert!(matches!(err, ProofError::ContentMismatch));
    }

    #[test]
    fn wrong_claimed_index_is_rejected_as_position_mismatch() {
        let data = leaves(8);
        let tree = MerkleTree::from_leaves(data.clone()).unwrap();
        let root = tree.root();
        let proof = tree.proof_for(3).unwrap();
        // Same proof, but claimed against a different index with the same parity class.
        let err = proof.validate(&data[3], 1, 8, &root).unwrap_err();
        assert!(matches!(err, ProofError::PositionMismatch));
    }

    #[test]
    fn tampered_sibling_hash_is_rejected_as_root_mismatch() {
        let data = leaves(4);
        let tree = MerkleTree::from_leaves(data.clone()).unwrap();
        let root = tree.root();
        let mut proof = tree.proof_for(0).unwrap();
        proof.lemma[1] = hash::leaf_hash(b"tampered sibling");
        let err = proof.validate(&data[0], 0, 4, &root).unwrap_err();
        assert!(matches!(err, ProofError::RootMismatch));
    }

    #[test]
    fn empty_tree_is_rejected() {
        let result = MerkleTree::from_leaf_hashes(vec![]);
        assert!(result.is_err());
    }
}
