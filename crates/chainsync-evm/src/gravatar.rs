//! Decoder for the Gravity registry contract.
//!
//! The contract emits two events with the same non-indexed payload:
//!
//! ```text
//! NewGravatar(uint256 id, address owner, string displayName, string imageUrl)
//! UpdatedGravatar(uint256 id, address owner, string displayName, string imageUrl)
//! ```
//!
//! Both map onto one `Gravatar` entity keyed by the decimal `id`.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use serde_json::json;
use tiny_keccak::{Hasher, Keccak};

use chainsync_core::error::SyncError;
use chainsync_core::event::{DomainEvent, Entity, EventDecoder, EventKind};
use chainsync_core::types::{BlockHash, RawLog};

pub const NEW_GRAVATAR: &str = "NewGravatar(uint256,address,string,string)";
pub const UPDATED_GRAVATAR: &str = "UpdatedGravatar(uint256,address,string,string)";

/// Entity kind written by this decoder.
pub const ENTITY_KIND: &str = "Gravatar";

/// keccak256 of an event signature, as a `0x`-prefixed topic.
pub fn keccak256_signature(signature: &str) -> String {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(signature.as_bytes());
    hasher.finalize(&mut output);
    format!("0x{}", hex::encode(output))
}

/// Strict decoder for `NewGravatar` (`Created`) and `UpdatedGravatar` (`Updated`).
#[derive(Debug, Clone)]
pub struct GravatarDecoder {
    new_topic: String,
    updated_topic: String,
}

impl Default for GravatarDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GravatarDecoder {
    pub fn new() -> Self {
        Self {
            new_topic: keccak256_signature(NEW_GRAVATAR),
            updated_topic: keccak256_signature(UPDATED_GRAVATAR),
        }
    }

    /// topic0 of the event that carries `kind`.
    pub fn topic(&self, kind: EventKind) -> &str {
        match kind {
            EventKind::Created => &self.new_topic,
            EventKind::Updated => &self.updated_topic,
        }
    }

    fn event_name(kind: EventKind) -> &'static str {
        match kind {
            EventKind::Created => "NewGravatar",
            EventKind::Updated => "UpdatedGravatar",
        }
    }

    fn decode_log(&self, log: &RawLog, kind: EventKind) -> Result<DomainEvent, SyncError> {
        let name = Self::event_name(kind);
        let fail = |reason: String| SyncError::Decode {
            event: name.to_string(),
            reason: format!("{reason} (tx {}, log {})", log.tx_hash, log.log_index),
        };

        if log.topics.len() != 1 {
            return Err(fail(format!("expected 1 topic, got {}", log.topics.len())));
        }
        let hex_data = log.data.strip_prefix("0x").unwrap_or(&log.data);
        let bytes = hex::decode(hex_data).map_err(|e| fail(format!("invalid data hex: {e}")))?;

        let payload = DynSolType::Tuple(vec![
            DynSolType::Uint(256),
            DynSolType::Address,
            DynSolType::String,
            DynSolType::String,
        ]);
        let decoded = payload
            .abi_decode_params(&bytes)
            .map_err(|e| fail(e.to_string()))?;

        let DynSolValue::Tuple(values) = decoded else {
            return Err(fail("payload is not a tuple".into()));
        };
        let [DynSolValue::Uint(id, _), DynSolValue::Address(owner), DynSolValue::String(display_name), DynSolValue::String(image_url)] =
            values.as_slice()
        else {
            return Err(fail("unexpected payload layout".into()));
        };

        let key = id.to_string();
        Ok(DomainEvent {
            kind,
            name: name.to_string(),
            entity: Entity {
                kind: ENTITY_KIND.to_string(),
                key: key.clone(),
                fields: json!({
                    "id": key,
                    "owner": owner.to_checksum(None),
                    "displayName": display_name,
                    "imageUrl": image_url,
                }),
                block_number: log.block_number_u64(),
                block_hash: BlockHash::new(log.block_hash.as_str()),
                tx_hash: log.tx_hash.clone(),
                log_index: log.log_index_u32(),
            },
        })
    }
}

impl EventDecoder for GravatarDecoder {
    fn decode(&self, logs: &[RawLog], kind: EventKind) -> Result<Vec<DomainEvent>, SyncError> {
        let topic = self.topic(kind);
        logs.iter()
            .filter(|log| log.topic0().is_some_and(|t| t.eq_ignore_ascii_case(topic)))
            .map(|log| self.decode_log(log, kind))
            .collect()
    }
}
