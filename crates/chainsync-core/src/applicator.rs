//! Event application — replays a resolved range into storage.
//!
//! For each block, oldest first:
//!   - fetch the watched contract's logs at that block hash
//!   - decode them by kind (`Created`, then `Updated`)
//!   - upsert every event's entity
//!
//! The cursor is written once, after the last block succeeds.

use crate::checkpoint::CheckpointManager;
use crate::error::SyncError;
use crate::event::{EventDecoder, EventKind};
use crate::ledger::LedgerClient;
use crate::types::{Block, RawLog};

/// Counts of what an apply pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Blocks fully applied.
    pub blocks: usize,
    /// `Created` events upserted.
    pub created: usize,
    /// `Updated` events upserted.
    pub updated: usize,
    /// Logs that decoded to no event (other events, or removed logs).
    pub skipped_logs: usize,
}

impl ApplySummary {
    fn merge(&mut self, other: ApplySummary) {
        self.blocks += other.blocks;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped_logs += other.skipped_logs;
    }
}

/// Applies decoded contract events to storage in block order.
pub struct EventApplicator<'a> {
    ledger: &'a dyn LedgerClient,
    decoder: &'a dyn EventDecoder,
    checkpoint: &'a CheckpointManager,
}

impl<'a> EventApplicator<'a> {
    pub fn new(
        ledger: &'a dyn LedgerClient,
        decoder: &'a dyn EventDecoder,
        checkpoint: &'a CheckpointManager,
    ) -> Self {
        Self {
            ledger,
            decoder,
            checkpoint,
        }
    }

    /// Apply every block, then advance the cursor to the last one.
    ///
    /// On error, blocks applied before the failing one stay applied and the
    /// cursor is left untouched, so the same call can be repeated.
    pub async fn apply(&self, address: &str, blocks: &[Block]) -> Result<ApplySummary, SyncError> {
        let summary = self.apply_blocks(address, blocks).await?;
        if let Some(last) = blocks.last() {
            self.advance_cursor(last).await?;
        }
        Ok(summary)
    }

    /// Apply every block in order without touching the cursor.
    pub async fn apply_blocks(
        &self,
        address: &str,
        blocks: &[Block],
    ) -> Result<ApplySummary, SyncError> {
        let mut summary = ApplySummary::default();
        for block in blocks {
            summary.merge(self.apply_block(address, block).await?);
        }
        Ok(summary)
    }

    /// Fetch, decode, and upsert the events of a single block.
    pub async fn apply_block(&self, address: &str, block: &Block) -> Result<ApplySummary, SyncError> {
        let fetched = self.ledger.get_logs(address, &block.hash).await?;
        let total = fetched.len();
        let logs: Vec<RawLog> = fetched.into_iter().filter(|l| !l.is_removed()).collect();
        if logs.len() < total {
            tracing::warn!(
                block = block.number,
                removed = total - logs.len(),
                "skipping logs flagged as removed"
            );
        }

        let mut summary = ApplySummary {
            blocks: 1,
            ..Default::default()
        };
        // Decode every kind before the first write so a bad log stores nothing.
        let decoded = EventKind::APPLY_ORDER
            .into_iter()
            .map(|kind| Ok((kind, self.decoder.decode(&logs, kind)?)))
            .collect::<Result<Vec<_>, SyncError>>()?;

        for (kind, events) in decoded {
            let count = events.len();
            for event in events {
                tracing::trace!(kind = %event.kind, key = event.key(), "upsert");
                self.checkpoint.store().upsert(event.entity).await?;
            }
            match kind {
                EventKind::Created => summary.created = count,
                EventKind::Updated => summary.updated = count,
            }
        }
        summary.skipped_logs = total.saturating_sub(summary.created + summary.updated);

        tracing::debug!(
            block = block.number,
            hash = %block.hash,
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped_logs,
            "block applied"
        );
        Ok(summary)
    }

    /// The single terminal cursor write.
    pub async fn advance_cursor(&self, last: &Block) -> Result<(), SyncError> {
        self.checkpoint.advance(last).await
    }
}
