use mpt_config::ConfigError;
use mpt_persistence::StoreError;
use thiserror::Error;

/// Errors raised by trie operations.
///
/// None of these are transient: each one signals either a caller mistake or a
/// data-integrity problem, and is surfaced immediately.
#[derive(Error, Debug)]
pub enum MptError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Node not found in store: {0}")]
    NodeNotFound(String),

    #[error("Corrupted node {hash}: stored bytes hash to {actual}")]
    CorruptedNode { hash: String, actual: String },

    #[error("Unknown root hash: {0}")]
    UnknownRoot(String),

    #[error("Trie has uncommitted changes")]
    Dirty,

    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<alloy_rlp::Error> for MptError {
    fn from(err: alloy_rlp::Error) -> Self {
        MptError::InvalidFormat(err.to_string())
    }
}

/// Result type for trie operations
pub type MptResult<T> = std::result::Result<T, MptError>;
