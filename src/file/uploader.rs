//! Upload coordinator: drives a file from disk through chain submission and
//! segment push to a set of storage-node endpoints.
//!
//! State machine: open file -> compute two-level tree root -> query node for
//! an existing, already-finalized copy (fails with [`Error::AlreadyExists`],
//! it is not an idempotent no-op) -> submit the chain descriptor -> await
//! chain receipt -> await node availability -> push segments -> await
//! finalization. Segment push fans out across configured endpoints in
//! parallel via [`crate::parallel`] (one task per node, replicating the
//! whole file); within one node, segments are pushed sequentially in order.

use std::path::Path;

use crate::cancel::CancellationToken;
use crate::chain::{ChainClient, ReceiptStatus};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::node::{SegmentWithProof, StorageNodeClient};
use crate::parallel;

use super::segment::FileTree;
use super::submission::build_submission;
use super::File;

pub struct Uploader<'a> {
    nodes: Vec<&'a dyn StorageNodeClient>,
    chain: &'a dyn ChainClient,
    config: ClientConfig,
}

impl<'a> Uploader<'a> {
    pub fn new(
        nodes: Vec<&'a dyn StorageNodeClient>,
        chain: &'a dyn ChainClient,
        config: ClientConfig,
    ) -> Self {
        Self {
            nodes,
            chain,
            config,
        }
    }

    /// Upload `path`, returning the file's Merkle root once finalized.
    /// Segment push fans out across every configured node in parallel.
    ///
    /// Fails with [`Error::AlreadyExists`] if a finalized submission for this
    /// file's root already exists: re-uploading a finalized root is not a
    /// no-op here, unlike the download coordinator's local-existence check.
    pub fn upload(&self, path: impl AsRef<Path>, cancel: &CancellationToken) -> Result<Hash> {
        let (file, tree, root) = self.open_and_submit(path, cancel)?;

        self.await_availability(root, cancel)?;

        parallel::for_each(
            &self.nodes,
            self.nodes.len(),
            self.config.pipeline_buffer,
            cancel,
            |_idx, node| self.push_segments_to(*node, &file, &tree, cancel),
        )?;

        self.await_finalization(root, cancel)?;
        Ok(root)
    }

    /// Like [`Uploader::upload`], but pushes segments sequentially against
    /// the first configured endpoint only, instead of fanning the push out
    /// across every configured node in parallel. Kept for parity with the
    /// single-endpoint sequential push this coordinator is modeled on.
    pub fn upload_sequential(&self, path: impl AsRef<Path>, cancel: &CancellationToken) -> Result<Hash> {
        let (file, tree, root) = self.open_and_submit(path, cancel)?;

        self.await_availability(root, cancel)?;
        self.push_segments_to(self.nodes[0], &file, &tree, cancel)?;
        self.await_finalization(root, cancel)?;
        Ok(root)
    }

    /// Open `path`, compute its tree, and ensure a chain submission exists
    /// for its root.
    ///
    /// Fails with [`Error::AlreadyExists`] if the node already reports this
    /// root finalized.
    fn open_and_submit(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<(File, FileTree, Hash)> {
        let Some(&primary) = self.nodes.first() else {
            return Err(Error::WireFormat("no storage endpoints configured".into()));
        };

        let file = File::open(path)?;
        let tree = FileTree::build(&file)?;
        let root = tree.root();

        if let Some(info) = primary.get_file_info(root, cancel)? {
            if info.finalized {
                return Err(Error::AlreadyExists(format!(
                    "root {root:02x?} is already finalized"
                )));
            }
        } else {
            let submission = build_submission(&file)?;
            let tx_hash = self.chain.submit(&submission, cancel)?;
            match self.chain.wait_for_receipt(tx_hash, cancel)? {
                ReceiptStatus::Successful => {}
                ReceiptStatus::Failed(reason) => {
                    let reason = reason.unwrap_or_else(|| "no reason given".into());
                    return Err(Error::ChainExecution(format!(
                        "submission for root {root:02x?} reverted: {reason}"
                    )));
                }
                ReceiptStatus::Unknown => {
                    return Err(Error::ChainExecution(
                        "submission receipt status is unknown".into(),
                    ));
                }
            }
        }

        Ok((file, tree, root))
    }

    fn await_availability(&self, root: Hash, cancel: &CancellationToken) -> Result<()> {
        let primary = self.nodes[0];
        loop {
            if primary.get_file_info(root, cancel)?.is_some() {
                return Ok(());
            }
            cancel.sleep(self.config.poll_interval)?;
        }
    }

    fn await_finalization(&self, root: Hash, cancel: &CancellationToken) -> Result<()> {
        let primary = self.nodes[0];
        loop {
            if let Some(info) = primary.get_file_info(root, cancel)? {
                if info.finalized {
                    return Ok(());
                }
            }
            cancel.sleep(self.config.poll_interval)?;
        }
    }

    fn push_segments_to(
        &self,
        node: &dyn StorageNodeClient,
        file: &File,
        tree: &FileTree,
        cancel: &CancellationToken,
    ) -> Result<()> {
        for (index, content) in file.segments().enumerate() {
            cancel.check()?;
            let content = content?;
            let proof = tree.proof_for_segment(index)?;

            let segment = SegmentWithProof {
                root: tree.root(),
                data: content,
                index: index as u32,
                proof,
                file_size: file.size(),
            };
            node.upload_segment(&segment, cancel)?;
        }
        Ok(())
    }
}
