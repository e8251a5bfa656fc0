//! In-crate fakes for the ledger, decoder, and store capabilities.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::checkpoint::{Checkpoint, SyncStore};
use crate::error::SyncError;
use crate::event::{DomainEvent, Entity, EventDecoder, EventKind};
use crate::ledger::LedgerClient;
use crate::types::{Block, BlockHash, RawLog};

pub const CREATED_TOPIC: &str = "0xc0";
pub const UPDATED_TOPIC: &str = "0xd0";

pub fn block(number: u64, hash: &str, parent: &str) -> Block {
    Block {
        number,
        hash: hash.into(),
        parent_hash: parent.into(),
        timestamp: (number * 12) as i64,
    }
}

/// A log whose key sits in `topics[1]` and whose payload is the plain `data` string.
pub fn log(block_hash: &str, topic0: &str, key: &str, value: &str, index: u32) -> RawLog {
    RawLog {
        address: "0xcontract".into(),
        topics: vec![topic0.into(), key.into()],
        data: value.into(),
        block_number: "0x0".into(),
        block_hash: block_hash.into(),
        tx_hash: format!("0x{index:02x}"),
        log_index: format!("0x{index:x}"),
        removed: None,
    }
}

// ─── Ledger ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLedger {
    pub blocks: HashMap<BlockHash, Block>,
    pub logs: HashMap<BlockHash, Vec<RawLog>>,
    pub canonical: HashMap<u64, BlockHash>,
    pub block_calls: AtomicUsize,
}

impl MockLedger {
    /// Builds a linear chain; the first block's parent is the zero hash.
    pub fn chain(hashes: &[&str]) -> Self {
        let mut ledger = Self::default();
        let mut parent = BlockHash::zero();
        for (i, hash) in hashes.iter().enumerate() {
            let b = Block {
                number: i as u64,
                hash: (*hash).into(),
                parent_hash: parent.clone(),
                timestamp: i as i64 * 12,
            };
            parent = b.hash.clone();
            ledger.blocks.insert(b.hash.clone(), b);
        }
        ledger
    }

    pub fn with_logs(mut self, block_hash: &str, logs: Vec<RawLog>) -> Self {
        self.logs.insert(block_hash.into(), logs);
        self
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_block(&self, hash: &BlockHash) -> Result<Option<Block>, SyncError> {
        self.block_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.blocks.get(hash).cloned())
    }

    async fn get_logs(
        &self,
        _address: &str,
        block_hash: &BlockHash,
    ) -> Result<Vec<RawLog>, SyncError> {
        Ok(self.logs.get(block_hash).cloned().unwrap_or_default())
    }

    async fn canonical_hash(&self, number: u64) -> Result<Option<BlockHash>, SyncError> {
        Ok(self.canonical.get(&number).cloned())
    }
}

// ─── Decoder ──────────────────────────────────────────────────────────────────

pub struct MockDecoder;

impl EventDecoder for MockDecoder {
    fn decode(&self, logs: &[RawLog], kind: EventKind) -> Result<Vec<DomainEvent>, SyncError> {
        let wanted = match kind {
            EventKind::Created => CREATED_TOPIC,
            EventKind::Updated => UPDATED_TOPIC,
        };
        let mut out = Vec::new();
        for log in logs.iter().filter(|l| l.topic0() == Some(wanted)) {
            let key = log.topics.get(1).ok_or_else(|| SyncError::Decode {
                event: kind.to_string(),
                reason: "missing key topic".into(),
            })?;
            out.push(DomainEvent {
                kind,
                name: kind.to_string(),
                entity: Entity {
                    kind: "Thing".into(),
                    key: key.clone(),
                    fields: serde_json::json!({ "value": log.data }),
                    block_number: log.block_number_u64(),
                    block_hash: BlockHash::new(log.block_hash.clone()),
                    tx_hash: log.tx_hash.clone(),
                    log_index: log.log_index_u32(),
                },
            });
        }
        Ok(out)
    }
}

// ─── Store ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    pub cursors: Mutex<HashMap<String, Checkpoint>>,
    pub entities: Mutex<HashMap<(String, String), Entity>>,
    /// Upserts of entities written in this block fail.
    pub fail_at_block: Mutex<Option<BlockHash>>,
}

impl MemoryStore {
    pub fn value_of(&self, key: &str) -> Option<String> {
        self.entities
            .lock()
            .unwrap()
            .get(&("Thing".to_string(), key.to_string()))
            .and_then(|e| e.fields["value"].as_str().map(str::to_string))
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
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
        if self.fail_at_block.lock().unwrap().as_ref() == Some(&entity.block_hash) {
            return Err(SyncError::Storage("injected failure".into()));
        }
        self.entities
            .lock()
            .unwrap()
            .insert((entity.kind.clone(), entity.key.clone()), entity);
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
