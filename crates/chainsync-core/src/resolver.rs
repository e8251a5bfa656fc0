//! Range resolution — discovers the blocks between the cursor and a target.
//!
//! The resolver walks the parent-hash chain backward from the target until it
//! reaches the cursor, then returns the collected blocks oldest first:
//!
//! ```text
//! cursor ← B ← C ← target        walk:   target, C, B
//!                                result: B, C, target
//! ```
//!
//! A ledger that does not know a parent hash marks the chain's origin and ends
//! the walk. The target itself must resolve.

use crate::cursor::Cursor;
use crate::error::SyncError;
use crate::ledger::LedgerClient;
use crate::types::{Block, BlockHash};

/// Walks the ledger's parent-hash chain. Read-only.
pub struct RangeResolver<'a> {
    ledger: &'a dyn LedgerClient,
    max_range: Option<u64>,
}

impl<'a> RangeResolver<'a> {
    pub fn new(ledger: &'a dyn LedgerClient) -> Self {
        Self {
            ledger,
            max_range: None,
        }
    }

    /// Fail with `RangeTooLarge` instead of walking more than `limit` blocks.
    pub fn max_range(mut self, limit: Option<u64>) -> Self {
        self.max_range = limit;
        self
    }

    /// Resolve the blocks after `to` up to and including `from`, oldest first.
    pub async fn resolve(&self, from: &BlockHash, to: &Cursor) -> Result<Vec<Block>, SyncError> {
        // The zero hash is the parent of the first block, never a block itself.
        if from.is_zero() {
            return Err(SyncError::NotFound {
                hash: from.to_string(),
            });
        }

        let mut blocks: Vec<Block> = Vec::new();
        let mut hash = from.clone();

        while !to.is_reached_by(&hash) {
            if let Some(limit) = self.max_range {
                if blocks.len() as u64 >= limit {
                    return Err(SyncError::RangeTooLarge {
                        from: from.to_string(),
                        limit,
                    });
                }
            }

            let block = match self.ledger.get_block(&hash).await? {
                Some(block) => block,
                None if blocks.is_empty() => {
                    return Err(SyncError::NotFound {
                        hash: hash.to_string(),
                    })
                }
                None => {
                    tracing::debug!(%hash, "parent not found, treating as chain origin");
                    break;
                }
            };

            if block.hash != hash {
                return Err(SyncError::ChainMismatch {
                    hash: hash.to_string(),
                    reason: format!("ledger returned block {}", block.hash),
                });
            }
            if let Some(child) = blocks.last() {
                if !child.extends(&block) {
                    return Err(SyncError::ChainMismatch {
                        hash: hash.to_string(),
                        reason: format!(
                            "block {} is not the parent of block {}",
                            block.number, child.number
                        ),
                    });
                }
            }

            hash = block.parent_hash.clone();
            blocks.push(block);
        }

        blocks.reverse();
        tracing::debug!(%from, cursor = %to, blocks = blocks.len(), "range resolved");
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{block, MockLedger};
    use std::sync::atomic::Ordering;

    fn hashes(blocks: &[Block]) -> Vec<&str> {
        blocks.iter().map(|b| b.hash.as_str()).collect()
    }

    #[tokio::test]
    async fn resolves_forward_order_excluding_cursor() {
        let ledger = MockLedger::chain(&["0xa", "0xb", "0xc"]);
        let range = RangeResolver::new(&ledger)
            .resolve(&"0xc".into(), &Cursor::At("0xa".into()))
            .await
            .unwrap();

        assert_eq!(hashes(&range), vec!["0xb", "0xc"]);
        assert_eq!(range[0].parent_hash.as_str(), "0xa");
        assert!(range.windows(2).all(|w| w[1].extends(&w[0])));
    }

    #[tokio::test]
    async fn same_hash_is_empty_without_fetching() {
        let ledger = MockLedger::chain(&["0xa", "0xb"]);
        let range = RangeResolver::new(&ledger)
            .resolve(&"0xb".into(), &Cursor::At("0xB".into()))
            .await
            .unwrap();

        assert!(range.is_empty());
        assert_eq!(ledger.block_calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn unset_cursor_walks_to_zero_parent() {
        let ledger = MockLedger::chain(&["0xa", "0xb", "0xc"]);
        let range = RangeResolver::new(&ledger)
            .resolve(&"0xc".into(), &Cursor::Unset)
            .await
            .unwrap();

        assert_eq!(hashes(&range), vec!["0xa", "0xb", "0xc"]);
        assert!(range[0].parent_hash.is_zero());
        // The zero hash itself is never requested.
        assert_eq!(ledger.block_calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn missing_parent_ends_walk() {
        let mut ledger = MockLedger::default();
        ledger.blocks.insert("0xb".into(), block(11, "0xb", "0xpruned"));
        ledger.blocks.insert("0xc".into(), block(12, "0xc", "0xb"));

        let range = RangeResolver::new(&ledger)
            .resolve(&"0xc".into(), &Cursor::At("0xa".into()))
            .await
            .unwrap();
        assert_eq!(hashes(&range), vec!["0xb", "0xc"]);
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let ledger = MockLedger::chain(&["0xa"]);
        let err = RangeResolver::new(&ledger)
            .resolve(&"0xdead".into(), &Cursor::At("0xa".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound { hash } if hash == "0xdead"));
    }

    #[tokio::test]
    async fn zero_target_is_not_found() {
        let ledger = MockLedger::chain(&["0xa"]);
        for cursor in [Cursor::Unset, Cursor::At("0xa".into())] {
            let err = RangeResolver::new(&ledger)
                .resolve(&BlockHash::zero(), &cursor)
                .await
                .unwrap_err();
            assert!(matches!(err, SyncError::NotFound { .. }));
        }
        assert_eq!(ledger.block_calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn max_range_guard() {
        let ledger = MockLedger::chain(&["0xa", "0xb", "0xc", "0xd"]);
        let resolver = RangeResolver::new(&ledger).max_range(Some(2));

        let err = resolver.resolve(&"0xd".into(), &Cursor::Unset).await.unwrap_err();
        assert!(matches!(err, SyncError::RangeTooLarge { limit: 2, .. }));

        // Exactly at the limit is fine.
        let range = resolver
            .resolve(&"0xd".into(), &Cursor::At("0xb".into()))
            .await
            .unwrap();
        assert_eq!(hashes(&range), vec!["0xc", "0xd"]);
    }

    #[tokio::test]
    async fn rejects_block_with_wrong_hash() {
        let mut ledger = MockLedger::default();
        ledger.blocks.insert("0xc".into(), block(12, "0xother", "0xb"));

        let err = RangeResolver::new(&ledger)
            .resolve(&"0xc".into(), &Cursor::At("0xa".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ChainMismatch { .. }));
    }

    #[tokio::test]
    async fn rejects_number_gap() {
        let mut ledger = MockLedger::default();
        ledger.blocks.insert("0xb".into(), block(9, "0xb", "0xa"));
        ledger.blocks.insert("0xc".into(), block(12, "0xc", "0xb"));

        let err = RangeResolver::new(&ledger)
            .resolve(&"0xc".into(), &Cursor::At("0xa".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ChainMismatch { .. }));
    }
}
