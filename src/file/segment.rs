//! Segment-root and file-root layering: segments are their own small Merkle
//! tree over chunk leaves, and a file's root is the Merkle tree over its
//! segments' roots. Because `SEG_CHUNKS` is a power of two, this two-level
//! construction re-associates into the same root as a single flat tree over
//! every chunk directly (the segmentation-invariance property).

use crate::config::CHUNK;
use crate::error::Result;
use crate::hash::Hash;
use crate::merkle::{MerkleTree, Proof};

use super::File;

/// Root of the small Merkle tree over one segment's `CHUNK`-sized leaves.
/// `content` must be a whole number of chunks (callers zero-pad via
/// [`File::read_chunks`]/[`super::SegmentIterator`]).
pub fn segment_root(content: &[u8]) -> Hash {
    MerkleTree::from_leaves(content.chunks(CHUNK))
        .expect("a segment always has at least one chunk")
        .root()
}

/// Root of the Merkle tree over a sequence of segment roots.
pub fn file_root_from_segments(roots: impl IntoIterator<Item = Hash>) -> Result<Hash> {
    Ok(MerkleTree::from_leaf_hashes(roots.into_iter().collect())?.root())
}

/// The two-level tree (chunk -> segment root -> file root) for a whole file.
pub struct FileTree {
    tree: MerkleTree,
}

impl FileTree {
    pub fn build(file: &File) -> Result<Self> {
        let mut roots = Vec::with_capacity(file.num_segments() as usize);
        for segment in file.segments() {
            roots.push(segment_root(&segment?));
        }
        Ok(Self {
            tree: MerkleTree::from_leaf_hashes(roots)?,
        })
    }

    pub fn root(&self) -> Hash {
        self.tree.root()
    }

    pub fn num_segments(&self) -> usize {
        self.tree.leaf_count()
    }

    /// Inclusion proof that segment `index`'s root belongs under the file
    /// root; the receiving node recomputes the segment root itself from the
    /// pushed bytes and only needs this proof to place it in the file.
    pub fn proof_for_segment(&self, index: usize) -> Result<Proof> {
        self.tree.proof_for(index)
    }
}
