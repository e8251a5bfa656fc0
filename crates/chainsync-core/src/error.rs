//! Error types for the chainsync pipeline.

use thiserror::Error;

/// Errors that can occur during a synchronize call.
///
/// Every variant aborts the current call without advancing the cursor.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Block not found: {hash}")]
    NotFound { hash: String },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Decode error for {event}: {reason}")]
    Decode { event: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Hash chain mismatch at {hash}: {reason}")]
    ChainMismatch { hash: String, reason: String },

    #[error("Range from {from} exceeds {limit} blocks without reaching the cursor")]
    RangeTooLarge { from: String, limit: u64 },

    #[error("Target {target} is no longer canonical at block {block_number} (canonical: {canonical})")]
    Stale {
        target: String,
        block_number: u64,
        canonical: String,
    },

    #[error("A synchronize call is already in progress for '{id}'")]
    Busy { id: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    /// Returns `true` if re-running the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::Stale { .. } | Self::Busy { .. })
    }

    /// Shorthand for a [`SyncError::Storage`] built from any displayable error.
    pub fn storage<E: std::fmt::Display>(e: E) -> Self {
        Self::Storage(e.to_string())
    }

    /// Shorthand for a [`SyncError::Rpc`] built from any displayable error.
    pub fn rpc<E: std::fmt::Display>(e: E) -> Self {
        Self::Rpc(e.to_string())
    }
}
