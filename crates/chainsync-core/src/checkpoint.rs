//! Checkpoint persistence — the storage capability and the cursor manager.
//!
//! A checkpoint stores the hash of the last block whose events were fully
//! applied. It is read once at the start of a synchronize call and written
//! once at the end, after every block in the range has been applied.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::SyncError;
use crate::event::Entity;
use crate::types::{Block, BlockHash};

/// A persisted cursor for one sync instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Unique sync identifier.
    pub indexer_id: String,
    /// Hash of the last fully applied block.
    pub block_hash: BlockHash,
    /// Number of the last fully applied block.
    pub block_number: u64,
    /// Unix timestamp of when this checkpoint was saved.
    pub updated_at: i64,
}

/// Storage for cursors and entities.
///
/// Implementations include `InMemoryStorage` and `SqliteStorage`.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Load the checkpoint for a sync instance.
    async fn load_cursor(&self, indexer_id: &str) -> Result<Option<Checkpoint>, SyncError>;

    /// Save (upsert) a checkpoint.
    async fn save_cursor(&self, checkpoint: Checkpoint) -> Result<(), SyncError>;

    /// Delete a checkpoint (e.g. when resetting a sync instance).
    async fn delete_cursor(&self, indexer_id: &str) -> Result<(), SyncError>;

    /// Insert the entity if absent, else overwrite it. Keyed by `(kind, key)`.
    async fn upsert(&self, entity: Entity) -> Result<(), SyncError>;

    /// Look up an entity by `(kind, key)`.
    async fn get_entity(&self, kind: &str, key: &str) -> Result<Option<Entity>, SyncError>;

    /// Total number of stored entities.
    async fn entity_count(&self) -> Result<u64, SyncError>;
}

/// Reads and advances the cursor of one sync instance.
pub struct CheckpointManager {
    store: Arc<dyn SyncStore>,
    indexer_id: String,
}

impl CheckpointManager {
    pub fn new(store: Arc<dyn SyncStore>, indexer_id: impl Into<String>) -> Self {
        Self {
            store,
            indexer_id: indexer_id.into(),
        }
    }

    /// Load the current cursor (`Cursor::Unset` if nothing was saved).
    pub async fn load(&self) -> Result<Cursor, SyncError> {
        let checkpoint = self.store.load_cursor(&self.indexer_id).await?;
        Ok(Cursor::from(checkpoint.map(|cp| cp.block_hash)))
    }

    /// Persist `block` as the new cursor.
    pub async fn advance(&self, block: &Block) -> Result<(), SyncError> {
        let cp = Checkpoint {
            indexer_id: self.indexer_id.clone(),
            block_hash: block.hash.clone(),
            block_number: block.number,
            updated_at: chrono::Utc::now().timestamp(),
        };
        self.store.save_cursor(cp).await?;
        tracing::debug!(
            indexer_id = %self.indexer_id,
            block = block.number,
            hash = %block.hash,
            "cursor advanced"
        );
        Ok(())
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn SyncStore> {
        &self.store
    }
}
