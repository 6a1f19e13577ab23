//! Storage-node RPC contract.
//!
//! This module specifies the *contract* a storage node must satisfy — the
//! JSON-RPC transport and wire encoding that a real implementation would
//! speak are explicitly out of scope for this crate (see `SPEC_FULL.md`
//! §1); [`StorageNodeClient`] is the seam a real transport plugs into, and
//! [`crate::memory`] provides an in-memory reference implementation used by
//! tests and the CLI demo.

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::hash::Hash;
use crate::merkle::Proof;

/// Liveness/capability status of a storage node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub connected_peers: u32,
    pub log_sync_height: u64,
}

/// On-chain transaction metadata for a submitted file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub root: Hash,
    pub size: u64,
    pub seq: u64,
    pub stream_ids: Vec<u64>,
    /// Inline data, present only for tiny single-chunk submissions sent
    /// directly in the submission descriptor.
    pub data: Option<Vec<u8>>,
}

/// A storage node's view of a file: its on-chain transaction plus
/// availability/upload progress as tracked by that node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub tx: TransactionInfo,
    pub finalized: bool,
    pub is_cached: bool,
    pub uploaded_seg_num: u32,
}

/// A segment payload accompanied by the proof that ties it to the file's
/// Merkle root, as pushed to a storage node during upload or returned from
/// one during download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentWithProof {
    /// The file's root — identifies which file this segment belongs to.
    /// The segment's own hash is not carried separately; it is
    /// `proof.lemma[0]`, recomputed by the receiver from `data`.
    pub root: Hash,
    pub data: Vec<u8>,
    pub index: u32,
    pub proof: Proof,
    pub file_size: u64,
}

/// The contract a storage node RPC endpoint must satisfy.
pub trait StorageNodeClient: Send + Sync {
    fn get_status(&self, cancel: &CancellationToken) -> Result<Status>;

    fn get_file_info(&self, root: Hash, cancel: &CancellationToken) -> Result<Option<FileInfo>>;

    fn upload_segment(&self, seg: &SegmentWithProof, cancel: &CancellationToken) -> Result<()>;

    fn download_segment(
        &self,
        root: Hash,
        start_chunk: u32,
        end_chunk: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>>;

    /// Request a graceful node shutdown. Administrative RPC carried over
    /// from the original implementation's admin surface.
    fn shutdown(&self, cancel: &CancellationToken) -> Result<()>;

    /// Ask the node to begin syncing a transaction it doesn't yet hold.
    fn start_sync_file(&self, tx_seq: u64, cancel: &CancellationToken) -> Result<()>;

    /// Query the node's sync progress for a transaction.
    fn get_sync_status(&self, tx_seq: u64, cancel: &CancellationToken) -> Result<String>;
}
