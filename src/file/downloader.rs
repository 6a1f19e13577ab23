//! Download coordinator: fetches a finalized file from a set of storage-node
//! endpoints and reconstructs it on disk.
//!
//! State machine: query file info -> local-existence check (succeeds
//! without re-downloading if an existing target already has the expected
//! root) -> preallocate `<target>.download` -> parallel fetch, one segment
//! per task, round-robined across endpoints -> atomic rename -> re-verify
//! (size and recomputed root).

use std::fs;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use crate::cancel::CancellationToken;
use crate::config::{ClientConfig, CHUNK, SEG_CHUNKS};
use crate::error::{Error, ProofError, Result};
use crate::hash::Hash;
use crate::node::StorageNodeClient;
use crate::parallel;

use super::segment::FileTree;
use super::File;

pub struct Downloader<'a> {
    nodes: Vec<&'a dyn StorageNodeClient>,
    config: ClientConfig,
}

impl<'a> Downloader<'a> {
    pub fn new(nodes: Vec<&'a dyn StorageNodeClient>, config: ClientConfig) -> Self {
        Self { nodes, config }
    }

    /// Download the file with the given root to `target`.
    pub fn download(
        &self,
        root: Hash,
        target: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let target = target.as_ref();
        let Some(&primary) = self.nodes.first() else {
            return Err(Error::WireFormat("no storage endpoints configured".into()));
        };

        let info = primary
            .get_file_info(root, cancel)?
            .ok_or_else(|| Error::NotFound(format!("{}", HexRoot(root))))?;
        if !info.finalized {
            return Err(Error::NotFinalized(format!("{}", HexRoot(root))));
        }

        if target.exists() {
            if let Ok(existing) = File::open(target) {
                if existing.size() == info.tx.size {
                    if let Ok(tree) = FileTree::build(&existing) {
                        if tree.root() == root {
                            tracing::info!(root = ?HexRoot(root), "target already has expected root, skipping download");
                            return Ok(());
                        }
                    }
                }
            }
            return Err(Error::AlreadyExists(target.display().to_string()));
        }

        let download_path = download_temp_path(target);
        preallocate(&download_path, info.tx.size)?;

        let total_chunks = info.tx.size.div_ceil(CHUNK as u64).max(1);
        let num_segments = total_chunks.div_ceil(SEG_CHUNKS as u64).max(1) as usize;
        let segment_indices: Vec<usize> = (0..num_segments).collect();

        {
            let download_file = fs::OpenOptions::new().write(true).open(&download_path)?;
            parallel::for_each(
                &segment_indices,
                self.nodes.len(),
                self.config.pipeline_buffer,
                cancel,
                |_, &index| {
                    let node = self.nodes[index % self.nodes.len()];
                    let start_chunk = index as u64 * SEG_CHUNKS as u64;
                    let end_chunk = ((index as u64 + 1) * SEG_CHUNKS as u64).min(total_chunks);
                    let data = node.download_segment(
                        root,
                        start_chunk as u32,
                        end_chunk as u32,
                        cancel,
                    )?;

                    let offset = start_chunk * CHUNK as u64;
                    let want = ((end_chunk - start_chunk) * CHUNK as u64) as usize;
                    let available = want.min(data.len());
                    let write_len = (info.tx.size.saturating_sub(offset) as usize).min(available);
                    download_file.write_at(&data[..write_len], offset)?;
                    Ok(())
                },
            )?;
        }

        fs::rename(&download_path, target)?;

        let final_file = File::open(target)?;
        if final_file.size() != info.tx.size {
            return Err(Error::Integrity(ProofError::RootRecomputationFailure(
                "downloaded file size does not match expected size".into(),
            )));
        }
        let tree = FileTree::build(&final_file)?;
        if tree.root() != root {
            return Err(Error::Integrity(ProofError::RootMismatch));
        }

        Ok(())
    }
}

fn download_temp_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_owned()).unwrap_or_default();
    name.push(".download");
    target.with_file_name(name)
}

fn preallocate(path: &Path, size: u64) -> Result<()> {
    let file = fs::File::create(path)?;
    file.set_len(size)?;
    Ok(())
}

struct HexRoot(Hash);

impl std::fmt::Display for HexRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}
