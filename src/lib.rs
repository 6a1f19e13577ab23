//! Ionian storage client
//!
//! This library drives a content-addressed, chain-anchored file storage
//! system: it builds a deterministic Merkle commitment for a file, submits
//! that commitment to a chain, and pushes or fetches the file's segments to
//! or from a set of storage nodes.
//!
//! ## Main Components
//!
//! - [`merkle`]: deterministic binary Merkle tree over domain-separated
//!   SHA-256, with inclusion proofs
//! - [`file`]: chunked file view, segment/file-root layering, submission
//!   builder, and the upload/download coordinators
//! - [`parallel`]: a bounded, order-preserving worker pipeline used to fan
//!   out segment pushes and fetches
//! - [`node`] / [`chain`]: the storage-node and chain contracts a real
//!   transport implements; [`memory`] supplies an in-memory reference
//!   implementation of both
//! - [`config`]: layout constants and [`config::ClientConfig`], the runtime
//!   knobs threaded through the coordinators
//! - [`cancel`]: cooperative cancellation shared across a pipeline
//!
//! ## Error Handling
//!
//! Fallible operations return [`error::Result<T>`], built on [`error::Error`];
//! Merkle proof failures carry their own [`error::ProofError`] detail.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ionian_client::cancel::CancellationToken;
//! use ionian_client::config::ClientConfig;
//! use ionian_client::file::downloader::Downloader;
//! use ionian_client::file::uploader::Uploader;
//! use ionian_client::memory;
//!
//! # fn main() -> ionian_client::error::Result<()> {
//! let (chain, nodes) = memory::network(3);
//! let node_refs: Vec<&dyn ionian_client::node::StorageNodeClient> =
//!     nodes.iter().map(|n| n as _).collect();
//! let cancel = CancellationToken::new();
//!
//! let uploader = Uploader::new(node_refs.clone(), &chain, ClientConfig::default());
//! let root = uploader.upload("data.bin", &cancel)?;
//!
//! let downloader = Downloader::new(node_refs, ClientConfig::default());
//! downloader.download(root, "data.out", &cancel)?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod chain;
pub mod config;
pub mod error;
pub mod file;
pub mod hash;
pub mod memory;
pub mod merkle;
pub mod metrics;
pub mod node;
pub mod parallel;

pub use cancel::CancellationToken;
pub use chain::{ChainClient, ReceiptStatus};
pub use config::ClientConfig;
pub use error::{Error, ProofError, Result};
pub use file::downloader::Downloader;
pub use file::uploader::Uploader;
pub use hash::Hash;
pub use merkle::{MerkleTree, Proof, TreeBuilder};
pub use node::StorageNodeClient;
