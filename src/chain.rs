//! Chain-submission contract.
//!
//! As with [`crate::node`], the smart-contract ABI encoding and JSON-RPC
//! transport a real chain client would speak are out of scope; this module
//! specifies the contract, and [`crate::memory`] supplies an in-memory
//! reference implementation.

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::file::submission::Submission;
use crate::hash::Hash;

/// Outcome of a submitted transaction once its receipt is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Successful,
    Failed(Option<String>),
    Unknown,
}

/// The contract a chain/contract client must satisfy.
pub trait ChainClient: Send + Sync {
    /// Submit a file descriptor to the chain, returning the transaction hash.
    fn submit(&self, submission: &Submission, cancel: &CancellationToken) -> Result<Hash>;

    /// Block (subject to `cancel`) until `tx_hash`'s receipt is available,
    /// then return its status.
    fn wait_for_receipt(&self, tx_hash: Hash, cancel: &CancellationToken) -> Result<ReceiptStatus>;
}
