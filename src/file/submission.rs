//! Submission-descriptor builder: decomposes a file's chunk count into a
//! strictly decreasing sequence of perfect sub-trees (a binary
//! decomposition of the chunk count) and computes each sub-tree's root
//! independently, so the chain-anchored descriptor can be built without
//! knowing the whole file's two-level tree shape up front.

use serde::{Deserialize, Serialize};

use crate::config::SEG_CHUNKS;
use crate::error::Result;
use crate::hash::{self, Hash};
use crate::merkle::MerkleTree;

use super::segment::segment_root;
use super::File;

/// One perfect sub-tree of the submission: `2^height` chunks rooted at
/// `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionNode {
    pub root: Hash,
    pub height: u64,
}

/// The chain-anchored descriptor for a file: its byte length, an
/// application-defined tag payload, and the sub-tree decomposition of its
/// chunk count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub length: u64,
    pub tags: Vec<u8>,
    pub nodes: Vec<SubmissionNode>,
}

impl Submission {
    /// Recombine the sub-tree roots into the single root they decompose,
    /// without needing the whole file or its two-level tree. Nodes are
    /// stored in descending-height (left-to-right file order); folding them
    /// right-to-left reproduces exactly the root the file's own Merkle tree
    /// would have rooted to, by the same left-perfect balancing rule used to
    /// build it (this is what lets a chain verify a submission against a
    /// file's root without re-reading the file).
    pub fn implied_root(&self) -> Hash {
        let mut iter = self.nodes.iter().rev();
        let mut acc = iter
            .next()
            .expect("a submission always decomposes into at least one node")
            .root;
        for node in iter {
            acc = hash::interior_hash(&node.root, &acc);
        }
        acc
    }
}

/// Build the submission descriptor for `file`: decompose its chunk count
/// into the set bits of its binary representation (descending height
/// order), and compute each sub-tree's root from SEG-aligned segment-root
/// leaves where the sub-tree spans one or more full segments, or directly
/// from chunk leaves otherwise.
pub fn build_submission(file: &File) -> Result<Submission> {
    let total_chunks = file.num_chunks();
    let highest_bit = 63 - total_chunks.leading_zeros() as u64;

    let mut nodes = Vec::new();
    let mut offset_chunks = 0u64;
    for height in (0..=highest_bit).rev() {
        let size = 1u64 << height;
        if total_chunks & size != 0 {
            let root = subtree_root(file, offset_chunks, size)?;
            nodes.push(SubmissionNode { root, height });
            offset_chunks += size;
        }
    }

    debug_assert_eq!(
        nodes.iter().map(|n| 1u64 << n.height).sum::<u64>(),
        total_chunks,
        "sub-tree sizes must sum to the file's total chunk count"
    );
    debug_assert!(
        nodes.windows(2).all(|w| w[0].height > w[1].height),
        "sub-tree heights must be strictly decreasing"
    );

    Ok(Submission {
        length: file.size(),
        tags: Vec::new(),
        nodes,
    })
}

fn subtree_root(file: &File, offset_chunks: u64, size_chunks: u64) -> Result<Hash> {
    let seg_chunks = SEG_CHUNKS as u64;
    if size_chunks <= seg_chunks {
        let content = file.read_chunks(offset_chunks, size_chunks)?;
        Ok(MerkleTree::from_leaves(content.chunks(crate::config::CHUNK))?.root())
    } else {
        let num_segments = size_chunks / seg_chunks;
        let mut roots = Vec::with_capacity(num_segments as usize);
        for i in 0..num_segments {
            let seg_offset = offset_chunks + i * seg_chunks;
            let content = file.read_chunks(seg_offset, seg_chunks)?;
            roots.push(segment_root(&content));
        }
        Ok(MerkleTree::from_leaf_hashes(roots)?.root())
    }
}
