//! Domain events, persisted entities, and the decoder trait.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::types::{BlockHash, RawLog};

/// The closed set of event kinds a watched contract emits.
///
/// Within one block, `Created` events are applied before `Updated` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Created,
    Updated,
}

impl EventKind {
    /// All kinds in application order.
    pub const APPLY_ORDER: [EventKind; 2] = [EventKind::Created, EventKind::Updated];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

/// A persisted record, keyed by `(kind, key)`.
///
/// Provenance fields record the log that last wrote the entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type (e.g. `"Gravatar"`).
    pub kind: String,
    /// Stable domain key extracted from the event payload.
    pub key: String,
    /// Decoded field values.
    pub fields: serde_json::Value,
    pub block_number: u64,
    pub block_hash: BlockHash,
    pub tx_hash: String,
    pub log_index: u32,
}

/// A decoded contract event, ready to be upserted.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    pub kind: EventKind,
    /// Event name as declared in the contract ABI (e.g. `"NewGravatar"`).
    pub name: String,
    /// The entity state this event produces.
    pub entity: Entity,
}

impl DomainEvent {
    /// The domain key of the entity this event writes.
    pub fn key(&self) -> &str {
        &self.entity.key
    }
}

/// Decodes raw logs into domain events.
///
/// Decoding is strict: logs that are not an event of the requested kind are
/// left out of the result. A log that carries the signature of the requested
/// kind but cannot be decoded is an error.
pub trait EventDecoder: Send + Sync {
    fn decode(&self, logs: &[RawLog], kind: EventKind) -> Result<Vec<DomainEvent>, SyncError>;
}
