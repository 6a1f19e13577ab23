//! Error types for the ionian storage client.

/// Error types covering Merkle validation, file I/O, and network-collaborator
/// failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Local file I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A Merkle proof or recomputed root did not match the expected value.
    #[error("integrity check failed: {0}")]
    Integrity(#[from] ProofError),

    /// A descriptor or segment payload was malformed.
    #[error("wire format error: {0}")]
    WireFormat(String),

    /// The referenced file or transaction is not known to the node/chain.
    #[error("not found: {0}")]
    NotFound(String),

    /// The referenced transaction exists but has not yet been finalized on chain.
    #[error("not finalized: {0}")]
    NotFinalized(String),

    /// The local download target already exists and does not match the
    /// expected root.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The chain rejected or reverted a submission.
    #[error("chain execution failed: {0}")]
    ChainExecution(String),

    /// The operation was cancelled via a `CancellationToken`.
    #[error("cancelled")]
    Cancelled,

    /// A transient transport-level failure (connection reset, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),
}

/// The four ways a Merkle proof can fail validation, kept distinguishable
/// from the coarser [`Error::Integrity`] for direct callers of
/// [`crate::merkle::Proof::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    /// The lemma/path lengths are inconsistent with each other.
    #[error("malformed proof: {0}")]
    WrongFormat(String),

    /// The proved leaf hash does not match `H(0x00 || content)`.
    #[error("leaf content does not hash to the proof's first lemma entry")]
    ContentMismatch,

    /// The lemma's last entry does not match the tree's known root.
    #[error("recomputed root does not match expected root")]
    RootMismatch,

    /// The path booleans, when used to recompute the leaf's position, do not
    /// match the claimed leaf index.
    #[error("proof path does not resolve to the claimed leaf position")]
    PositionMismatch,

    /// Recomputing the root from the lemma and path failed structurally
    /// (e.g. ran out of siblings before reaching a single hash).
    #[error("root recomputation failed: {0}")]
    RootRecomputationFailure(String),
}

/// Convenience Result type for ionian client operations.
pub type Result<T> = std::result::Result<T, Error>;
