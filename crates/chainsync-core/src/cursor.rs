//! Sync cursor — the hash of the last block whose events are fully applied.

use serde::{Deserialize, Serialize};

use crate::types::BlockHash;

/// The database's position in the chain.
///
/// `Unset` means nothing has been applied yet; a backward walk against it
/// terminates at the zero parent hash of the chain's first block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cursor {
    Unset,
    At(BlockHash),
}

impl Cursor {
    /// The stored hash, if any.
    pub fn block_hash(&self) -> Option<&BlockHash> {
        match self {
            Self::Unset => None,
            Self::At(hash) => Some(hash),
        }
    }

    /// Returns `true` when a backward walk arriving at `hash` has reached this cursor.
    pub fn is_reached_by(&self, hash: &BlockHash) -> bool {
        match self {
            Self::Unset => hash.is_zero(),
            Self::At(cursor) => cursor == hash,
        }
    }
}

impl From<Option<BlockHash>> for Cursor {
    fn from(hash: Option<BlockHash>) -> Self {
        hash.map_or(Self::Unset, Self::At)
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => write!(f, "none"),
            Self::At(hash) => write!(f, "{hash}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_cursor_is_reached_by_zero_hash() {
        let cursor = Cursor::Unset;
        assert!(cursor.is_reached_by(&BlockHash::zero()));
        assert!(!cursor.is_reached_by(&BlockHash::new("0xa")));
    }

    #[test]
    fn cursor_at_hash() {
        let cursor = Cursor::At(BlockHash::new("0xAA"));
        assert!(cursor.is_reached_by(&BlockHash::new("0xaa")));
        assert!(!cursor.is_reached_by(&BlockHash::zero()));
        assert_eq!(cursor.block_hash().unwrap().as_str(), "0xaa");
    }

    #[test]
    fn from_option_and_display() {
        assert_eq!(Cursor::from(None), Cursor::Unset);
        assert_eq!(Cursor::from(None).to_string(), "none");
        assert_eq!(Cursor::from(Some(BlockHash::new("0xb"))).to_string(), "0xb");
    }
}
