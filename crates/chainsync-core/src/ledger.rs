//! The ledger capability consumed by the resolver and the applicator.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::types::{Block, BlockHash, RawLog};

/// Read access to a remote chain.
///
/// Transport failures are reported as [`SyncError::Rpc`]; retries and
/// backoff belong to the implementation, not to the sync core.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch a block header by hash. `Ok(None)` when the ledger does not know it.
    async fn get_block(&self, hash: &BlockHash) -> Result<Option<Block>, SyncError>;

    /// Fetch all logs emitted by `address` in the block with hash `block_hash`.
    async fn get_logs(&self, address: &str, block_hash: &BlockHash)
        -> Result<Vec<RawLog>, SyncError>;

    /// The canonical block hash at `number`, used to detect a stale target.
    ///
    /// `Ok(None)` means the ledger cannot tell, and the check is skipped.
    async fn canonical_hash(&self, _number: u64) -> Result<Option<BlockHash>, SyncError> {
        Ok(None)
    }
}
