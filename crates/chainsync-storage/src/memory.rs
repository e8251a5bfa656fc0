//! In-memory storage backend.
//!
//! Stores cursors and entities in RAM.
//! Useful for testing and short-lived processes that don't need persistence.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use chainsync_core::checkpoint::{Checkpoint, SyncStore};
use chainsync_core::error::SyncError;
use chainsync_core::event::Entity;

/// In-memory sync storage.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct InMemoryStorage {
    cursors: Mutex<HashMap<String, Checkpoint>>,
    entities: Mutex<HashMap<(String, String), Entity>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entities of one kind (e.g. `"Gravatar"`), ordered by key.
    pub fn entities_by_kind(&self, kind: &str) -> Vec<Entity> {
        let mut out: Vec<Entity> = self
            .entities
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    /// A copy of every stored entity, keyed by `(kind, key)`.
    pub fn snapshot(&self) -> HashMap<(String, String), Entity> {
        self.entities.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncStore for InMemoryStorage {
    async fn load_cursor(&self, indexer_id: &str) -> Result<Option<Checkpoint>, SyncError> {
        Ok(self.cursors.lock().unwrap().get(indexer_id).cloned())
    }

    async fn save_cursor(&self, checkpoint: Checkpoint) -> Result<(), SyncError> {
        self.cursors
            .lock()
            .unwrap()
            .insert(checkpoint.indexer_id.clone(), checkpoint);
        Ok(())
    }

    async fn delete_cursor(&self, indexer_id: &str) -> Result<(), SyncError> {
        self.cursors.lock().unwrap().remove(indexer_id);
        Ok(())
    }

    async fn upsert(&self, entity: Entity) -> Result<(), SyncError> {
        let key = (entity.kind.clone(), entity.key.clone());
        self.entities.lock().unwrap().insert(key, entity);
        Ok(())
    }

    async fn get_entity(&self, kind: &str, key: &str) -> Result<Option<Entity>, SyncError> {
        Ok(self
            .entities
            .lock()
            .unwrap()
            .get(&(kind.to_string(), key.to_string()))
            .cloned())
    }

    async fn entity_count(&self) -> Result<u64, SyncError> {
        Ok(self.entities.lock().unwrap().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainsync_core::types::BlockHash;

    fn entity(kind: &str, key: &str, name: &str, block: u64) -> Entity {
        Entity {
            kind: kind.into(),
            key: key.into(),
            fields: serde_json::json!({ "displayName": name }),
            block_number: block,
            block_hash: BlockHash::new(format!("0x{block:x}")),
            tx_hash: "0x0".into(),
            log_index: 0,
        }
    }

    #[tokio::test]
    async fn upsert_inserts_then_overwrites() {
        let store = InMemoryStorage::new();
        store.upsert(entity("Gravatar", "1", "alice", 100)).await.unwrap();
        store.upsert(entity("Gravatar", "1", "alice2", 101)).await.unwrap();

        assert_eq!(store.entity_count().await.unwrap(), 1);
        let e = store.get_entity("Gravatar", "1").await.unwrap().unwrap();
        assert_eq!(e.fields["displayName"], "alice2");
        assert_eq!(e.block_number, 101);
    }

    #[tokio::test]
    async fn same_key_different_kind_are_distinct() {
        let store = InMemoryStorage::new();
        store.upsert(entity("Gravatar", "1", "a", 1)).await.unwrap();
        store.upsert(entity("Profile", "1", "b", 1)).await.unwrap();

        assert_eq!(store.entity_count().await.unwrap(), 2);
        assert_eq!(store.entities_by_kind("Gravatar").len(), 1);
    }

    #[tokio::test]
    async fn entities_by_kind_sorted() {
        let store = InMemoryStorage::new();
        for key in ["3", "1", "2"] {
            store.upsert(entity("Gravatar", key, "x", 1)).await.unwrap();
        }
        let keys: Vec<_> = store
            .entities_by_kind("Gravatar")
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn cursor_roundtrip_and_delete() {
        let store = InMemoryStorage::new();
        let cp = Checkpoint {
            indexer_id: "gravity".into(),
            block_hash: BlockHash::new("0xabc"),
            block_number: 1000,
            updated_at: 0,
        };
        store.save_cursor(cp.clone()).await.unwrap();
        assert_eq!(store.load_cursor("gravity").await.unwrap(), Some(cp));

        store.delete_cursor("gravity").await.unwrap();
        assert!(store.load_cursor("gravity").await.unwrap().is_none());
    }
}
