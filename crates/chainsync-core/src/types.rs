//! Shared types for the sync pipeline.

use serde::{Deserialize, Serialize};

// ─── BlockHash ────────────────────────────────────────────────────────────────

/// A `0x`-prefixed block hash, normalized to lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BlockHash(String);

impl BlockHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into().to_ascii_lowercase())
    }

    /// The all-zero hash used as the parent of the first block of a chain.
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(64)))
    }

    /// Returns `true` for the all-zero hash (any length, with or without `0x`).
    pub fn is_zero(&self) -> bool {
        let hex = self.0.strip_prefix("0x").unwrap_or(&self.0);
        !hex.is_empty() && hex.bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BlockHash {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for BlockHash {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<BlockHash> for String {
    fn from(h: BlockHash) -> Self {
        h.0
    }
}

impl std::fmt::Display for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Block ────────────────────────────────────────────────────────────────────

/// A minimal block header — enough to walk the parent-hash chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: BlockHash,
    /// Parent block hash.
    pub parent_hash: BlockHash,
    /// Unix timestamp of the block (seconds since epoch).
    pub timestamp: i64,
}

impl Block {
    /// Returns `true` if `parent` is the direct parent of `self`.
    pub fn extends(&self, parent: &Block) -> bool {
        self.number == parent.number + 1 && self.parent_hash == parent.hash
    }
}

// ─── RawLog ───────────────────────────────────────────────────────────────────

/// A raw contract log as returned by `eth_getLogs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "blockHash")]
    pub block_hash: String,
    #[serde(rename = "transactionHash")]
    pub tx_hash: String,
    #[serde(rename = "logIndex")]
    pub log_index: String,
    #[serde(default)]
    pub removed: Option<bool>,
}

impl RawLog {
    /// Returns the block number as u64.
    pub fn block_number_u64(&self) -> u64 {
        parse_hex_u64(&self.block_number)
    }

    /// Returns the log index as u32.
    pub fn log_index_u32(&self) -> u32 {
        parse_hex_u64(&self.log_index) as u32
    }

    /// Returns `true` if this log was removed by a reorg.
    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }

    /// The event signature topic, if any.
    pub fn topic0(&self) -> Option<&str> {
        self.topics.first().map(String::as_str)
    }
}

/// Parse a hex-encoded string (with or without `0x`) to u64.
pub fn parse_hex_u64(s: &str) -> u64 {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).unwrap_or(0)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn block(number: u64, hash: &str, parent: &str) -> Block {
        Block {
            number,
            hash: hash.into(),
            parent_hash: parent.into(),
            timestamp: (number * 12) as i64,
        }
    }

    #[test]
    fn block_extends_parent() {
        let parent = block(100, "0xaaa", "0x000");
        let child = block(101, "0xbbb", "0xaaa");
        assert!(child.extends(&parent));
        assert!(!parent.extends(&child));
    }

    #[test]
    fn block_extends_false_on_gap() {
        let a = block(100, "0xaaa", "0x000");
        let b = block(102, "0xccc", "0xaaa");
        assert!(!b.extends(&a));
    }

    #[test]
    fn hash_comparison_is_case_insensitive() {
        assert_eq!(BlockHash::new("0xAbCd"), BlockHash::new("0xabcd"));
        assert_eq!(BlockHash::new("0xAbCd").as_str(), "0xabcd");
    }

    #[test]
    fn zero_hash() {
        assert!(BlockHash::zero().is_zero());
        assert!(BlockHash::new("0x0").is_zero());
        assert!(!BlockHash::new("0x").is_zero());
        assert!(!BlockHash::new("0x01").is_zero());
        assert_eq!(BlockHash::zero().as_str().len(), 66);
    }

    #[test]
    fn hash_deserialize_normalizes() {
        let h: BlockHash = serde_json::from_str("\"0xFF\"").unwrap();
        assert_eq!(h.as_str(), "0xff");
    }

    #[test]
    fn raw_log_from_rpc_json() {
        let json = serde_json::json!({
            "address": "0x6c2fba01a93ec2e7e2f4db1ea4f5e1c6a4e4f8e2",
            "topics": ["0x01"],
            "data": "0x",
            "blockNumber": "0x12a05f200",
            "blockHash": "0xabc",
            "transactionHash": "0xdef",
            "logIndex": "0x5",
            "removed": false
        });
        let log: RawLog = serde_json::from_value(json).unwrap();
        assert_eq!(log.block_number_u64(), 5_000_000_000);
        assert_eq!(log.log_index_u32(), 5);
        assert_eq!(log.topic0(), Some("0x01"));
        assert!(!log.is_removed());
    }

    #[test]
    fn parse_hex_u64_basic() {
        assert_eq!(parse_hex_u64("0x1"), 1);
        assert_eq!(parse_hex_u64("0xff"), 255);
        assert_eq!(parse_hex_u64("1234"), 0x1234);
    }
}
