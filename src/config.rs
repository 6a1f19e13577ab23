//! Centralized configuration for the ionian storage client.
//!
//! This module contains the fixed layout constants used throughout the
//! application to ensure consistency, plus [`ClientConfig`], the set of
//! runtime knobs threaded through coordinator constructors instead of
//! process-wide mutable state.

use std::time::Duration;

/// Size in bytes of a single chunk, the atomic unit of the chunked file view
/// and the leaf granularity of a segment's Merkle tree.
pub const CHUNK: usize = 256;

/// Number of chunks packed into one segment.
pub const SEG_CHUNKS: usize = 1024;

/// Size in bytes of a full segment (`CHUNK * SEG_CHUNKS`).
pub const SEG: usize = CHUNK * SEG_CHUNKS;

/// Domain-separation prefix hashed in front of leaf content.
pub const PREFIX_LEAF: u8 = 0x00;

/// Domain-separation prefix hashed in front of an interior node's two
/// children.
pub const PREFIX_INTERIOR: u8 = 0x01;

/// Default poll interval used while waiting for chain/node state to
/// transition (availability, finalization).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Granularity at which poll loops re-check their [`crate::cancel::CancellationToken`],
/// so cancellation during a 1s wait is observed promptly rather than only
/// between whole-second sleeps.
pub const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// A fixed random seed used in tests and the CLI demo for deterministic
/// sample data generation.
pub const TEST_RANDOM_SEED: u64 = 42;

/// Runtime configuration threaded through [`crate::file::uploader::Uploader`]
/// and [`crate::file::downloader::Downloader`] constructors.
///
/// Replaces the process-wide mutable globals (custom gas price/limit
/// override, a singleton endpoint list) that the original implementation
/// kept at package scope; see `DESIGN.md` Open Question on this point.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bound on in-flight pipeline tasks. `None` selects
    /// `max(2 * workers, 8)`, per the parallel pipeline's default.
    pub pipeline_buffer: Option<usize>,
    /// Interval between availability/finalization poll attempts.
    pub poll_interval: Duration,
    /// Informational timeout a `StorageNodeClient`/`ChainClient`
    /// implementation may apply to a single RPC; the in-memory reference
    /// implementation ignores it.
    pub rpc_timeout: Duration,
    /// Informational retry count for transient `Transport` failures; the
    /// in-memory reference implementation ignores it.
    pub rpc_retries: u32,
    /// Overrides the chain client's gas price for submission transactions.
    pub gas_price_override: Option<u64>,
    /// Overrides the chain client's gas limit for submission transactions.
    pub gas_limit_override: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pipeline_buffer: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            rpc_timeout: Duration::from_secs(5),
            rpc_retries: 3,
            gas_price_override: None,
            gas_limit_override: None,
        }
    }
}

/// Default bounded lookahead for a pipeline with `workers` worker threads.
#[inline]
pub fn default_buffer(workers: usize) -> usize {
    (2 * workers).max(8)
}
