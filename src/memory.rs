//! In-memory reference implementation of [`crate::chain::ChainClient`] and
//! [`crate::node::StorageNodeClient`].
//!
//! Real storage nodes speak JSON-RPC and a real chain client speaks
//! contract-ABI-encoded JSON-RPC, both explicitly out of scope (see
//! `SPEC_FULL.md` §1, §6). This module exists so the rest of the crate —
//! tests and the CLI demo — has something to drive the upload/download
//! coordinators against: [`network`] wires one shared [`ChainState`] to any
//! number of independent [`MemoryNode`]s, each with its own local segment
//! store, which is the same separation a real deployment has between a
//! single chain and many independently-operated storage nodes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::cancel::CancellationToken;
use crate::chain::{ChainClient, ReceiptStatus};
use crate::config::{CHUNK, SEG_CHUNKS};
use crate::error::{Error, Result};
use crate::file::segment::segment_root;
use crate::file::submission::Submission;
use crate::hash::Hash;
use crate::node::{FileInfo, SegmentWithProof, Status, StorageNodeClient, TransactionInfo};

#[derive(Default)]
struct ChainState {
    next_seq: u64,
    transactions: HashMap<Hash, TransactionInfo>,
}

#[derive(Default)]
struct NodeStore {
    segments: HashMap<(Hash, u32), Vec<u8>>,
    finalized: HashSet<Hash>,
}

/// Build a simulated network: one chain and `num_nodes` independent storage
/// nodes sharing its transaction log.
pub fn network(num_nodes: usize) -> (MemoryChain, Vec<MemoryNode>) {
    let state = Arc::new(Mutex::new(ChainState::default()));
    let chain = MemoryChain { state: state.clone() };
    let nodes = (0..num_nodes)
        .map(|_| MemoryNode {
            chain: state.clone(),
            store: Mutex::new(NodeStore::default()),
        })
        .collect();
    (chain, nodes)
}

/// An in-memory chain: submissions are "mined" synchronously, so a receipt
/// is always available by the time `submit` returns.
pub struct MemoryChain {
    state: Arc<Mutex<ChainState>>,
}

impl ChainClient for MemoryChain {
    fn submit(&self, submission: &Submission, cancel: &CancellationToken) -> Result<Hash> {
        cancel.check()?;
        // The implied root doubles as this chain's transaction hash: it has
        // no separate opaque tx-id concept, only the file identity the
        // descriptor commits to.
        let root = submission.implied_root();
        let mut state = self.state.lock().expect("chain state lock poisoned");
        let seq = state.next_seq;
        state.next_seq += 1;
        state.transactions.entry(root).or_insert_with(|| TransactionInfo {
            root,
            size: submission.length,
            seq,
            stream_ids: vec![seq],
            data: None,
        });
        Ok(root)
    }

    fn wait_for_receipt(&self, tx_hash: Hash, cancel: &CancellationToken) -> Result<ReceiptStatus> {
        cancel.check()?;
        let state = self.state.lock().expect("chain state lock poisoned");
        if state.transactions.contains_key(&tx_hash) {
            Ok(ReceiptStatus::Successful)
        } else {
            Ok(ReceiptStatus::Unknown)
        }
    }
}

/// An in-memory storage node: segments are validated against their proof on
/// upload and served back verbatim on download.
pub struct MemoryNode {
    chain: Arc<Mutex<ChainState>>,
    store: Mutex<NodeStore>,
}

impl MemoryNode {
    fn num_segments_for(&self, size: u64) -> usize {
        let total_chunks = size.div_ceil(CHUNK as u64).max(1);
        total_chunks.div_ceil(SEG_CHUNKS as u64).max(1) as usize
    }
}

impl StorageNodeClient for MemoryNode {
    fn get_status(&self, cancel: &CancellationToken) -> Result<Status> {
        cancel.check()?;
        let state = self.chain.lock().expect("chain state lock poisoned");
        Ok(Status {
            connected_peers: 0,
            log_sync_height: state.next_seq,
        })
    }

    fn get_file_info(&self, root: Hash, cancel: &CancellationToken) -> Result<Option<FileInfo>> {
        cancel.check()?;
        let tx = {
            let state = self.chain.lock().expect("chain state lock poisoned");
            match state.transactions.get(&root) {
                Some(tx) => tx.clone(),
                None => return Ok(None),
            }
        };
        let store = self.store.lock().expect("node store lock poisoned");
        let uploaded = store.segments.keys().filter(|(r, _)| *r == root).count() as u32;
        Ok(Some(FileInfo {
            finalized: store.finalized.contains(&root),
            is_cached: uploaded > 0,
            uploaded_seg_num: uploaded,
            tx,
        }))
    }

    fn upload_segment(&self, seg: &SegmentWithProof, cancel: &CancellationToken) -> Result<()> {
        cancel.check()?;
        let tx = {
            let state = self.chain.lock().expect("chain state lock poisoned");
            state
                .transactions
                .get(&seg.root)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("{:02x?}", seg.root)))?
        };

        let num_segments = self.num_segments_for(tx.size);
        let leaf = segment_root(&seg.data);
        seg.proof
            .validate_leaf_hash(leaf, seg.index as usize, num_segments, &seg.root)?;

        let mut store = self.store.lock().expect("node store lock poisoned");
        store.segments.insert((seg.root, seg.index), seg.data.clone());
        let uploaded = store.segments.keys().filter(|(r, _)| *r == seg.root).count();
        if uploaded == num_segments {
            store.finalized.insert(seg.root);
        }
        Ok(())
    }

    fn download_segment(
        &self,
        root: Hash,
        start_chunk: u32,
        _end_chunk: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        cancel.check()?;
        let index = start_chunk / SEG_CHUNKS as u32;
        let store = self.store.lock().expect("node store lock poisoned");
        store
            .segments
            .get(&(root, index))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("segment {index} of {root:02x?}")))
    }

    fn shutdown(&self, cancel: &CancellationToken) -> Result<()> {
        cancel.check()
    }

    fn start_sync_file(&self, _tx_seq: u64, cancel: &CancellationToken) -> Result<()> {
        cancel.check()
    }

    fn get_sync_status(&self, _tx_seq: u64, cancel: &CancellationToken) -> Result<String> {
        cancel.check()?;
        Ok("synced".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::submission::build_submission;
    use crate::file::File;
    use std::io::Write;

    fn temp_file_of_size(bytes: usize) -> (tempfile::TempPath, File) {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..bytes).map(|i| (i % 251) as u8).collect();
        tmp.write_all(&data).unwrap();
        let path = tmp.into_temp_path();
        let file = File::open(&path).unwrap();
        (path, file)
    }

    #[test]
    fn file_info_is_none_before_submission() {
        let (_chain, nodes) = network(1);
        let cancel = CancellationToken::new();
        assert!(nodes[0].get_file_info([7u8; 32], &cancel).unwrap().is_none());
    }

    #[test]
    fn submit_then_wait_for_receipt_succeeds_and_file_info_appears() {
        let (chain, nodes) = network(1);
        let cancel = CancellationToken::new();
        let (_path, file) = temp_file_of_size(3 * CHUNK);
        let submission = build_submission(&file).unwrap();
        let root = submission.implied_root();

        let tx_hash = chain.submit(&submission, &cancel).unwrap();
        assert_eq!(tx_hash, root);
        assert_eq!(
            chain.wait_for_receipt(tx_hash, &cancel).unwrap(),
            ReceiptStatus::Successful
        );

        let info = nodes[0].get_file_info(root, &cancel).unwrap().unwrap();
        assert_eq!(info.tx.size, file.size());
        assert!(!info.finalized);
        assert_eq!(info.uploaded_seg_num, 0);
    }

    #[test]
    fn uploading_every_segment_finalizes_the_file() {
        use crate::file::segment::FileTree;

        let (chain, nodes) = network(1);
        let cancel = CancellationToken::new();
        let (_path, file) = temp_file_of_size(2 * SEG_CHUNKS * CHUNK + 7 * CHUNK);
        let submission = build_submission(&file).unwrap();
        let tree = FileTree::build(&file).unwrap();
        let root = submission.implied_root();
        assert_eq!(root, tree.root());

        chain.submit(&submission, &cancel).unwrap();

        for (index, content) in file.segments().enumerate() {
            let content = content.unwrap();
            let proof = tree.proof_for_segment(index).unwrap();
            let seg = SegmentWithProof {
                root,
                data: content,
                index: index as u32,
                proof,
                file_size: file.size(),
            };
            nodes[0].upload_segment(&seg, &cancel).unwrap();
        }

        let info = nodes[0].get_file_info(root, &cancel).unwrap().unwrap();
        assert!(info.finalized);
        assert_eq!(info.uploaded_seg_num, tree.num_segments() as u32);
    }

    #[test]
    fn upload_segment_rejects_a_proof_for_the_wrong_index() {
        use crate::file::segment::FileTree;

        let (chain, nodes) = network(1);
        let cancel = CancellationToken::new();
        let (_path, file) = temp_file_of_size(3 * SEG_CHUNKS * CHUNK);
        let submission = build_submission(&file).unwrap();
        let tree = FileTree::build(&file).unwrap();
        let root = submission.implied_root();
        chain.submit(&submission, &cancel).unwrap();

        let content = file.segments().next().unwrap().unwrap();
        // Proof for segment 1 presented as if it were segment 0.
        let wrong_proof = tree.proof_for_segment(1).unwrap();
        let seg = SegmentWithProof {
            root,
            data: content,
            index: 0,
            proof: wrong_proof,
            file_size: file.size(),
        };
        assert!(nodes[0].upload_segment(&seg, &cancel).is_err());
    }

    #[test]
    fn download_segment_returns_exactly_what_was_uploaded() {
        use crate::file::segment::FileTree;

        let (chain, nodes) = network(1);
        let cancel = CancellationToken::new();
        let (_path, file) = temp_file_of_size(5 * CHUNK);
        let submission = build_submission(&file).unwrap();
        let tree = FileTree::build(&file).unwrap();
        let root = submission.implied_root();
        chain.submit(&submission, &cancel).unwrap();

        let content = file.segments().next().unwrap().unwrap();
        let proof = tree.proof_for_segment(0).unwrap();
        let seg = SegmentWithProof {
            root,
            data: content.clone(),
            index: 0,
            proof,
            file_size: file.size(),
        };
        nodes[0].upload_segment(&seg, &cancel).unwrap();

        let fetched = nodes[0].download_segment(root, 0, 5, &cancel).unwrap();
        assert_eq!(fetched, content);
    }

    #[test]
    fn nodes_in_the_same_network_have_independent_stores() {
        let (chain, nodes) = network(2);
        let cancel = CancellationToken::new();
        let (_path, file) = temp_file_of_size(3 * CHUNK);
        let submission = build_submission(&file).unwrap();
        let root = submission.implied_root();
        chain.submit(&submission, &cancel).unwrap();

        use crate::file::segment::FileTree;
        let tree = FileTree::build(&file).unwrap();
        let content = file.segments().next().unwrap().unwrap();
        let proof = tree.proof_for_segment(0).unwrap();
        nodes[0]
            .upload_segment(
                &SegmentWithProof { root, data: content, index: 0, proof, file_size: file.size() },
                &cancel,
            )
            .unwrap();

        let info0 = nodes[0].get_file_info(root, &cancel).unwrap().unwrap();
        let info1 = nodes[1].get_file_info(root, &cancel).unwrap().unwrap();
        assert_eq!(info0.uploaded_seg_num, 1);
        assert_eq!(info1.uploaded_seg_num, 0);
    }
}
