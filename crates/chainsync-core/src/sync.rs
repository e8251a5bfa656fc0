//! The synchronize entry point.
//!
//! One call reads the cursor, resolves the missing range, applies it, and
//! advances the cursor. Calls on the same `Synchronizer` are serialized; the
//! store and contract it points at must not be shared with another instance.

use std::sync::{Arc, Mutex};

use crate::applicator::EventApplicator;
use crate::checkpoint::{CheckpointManager, SyncStore};
use crate::config::{SyncConfig, SyncState};
use crate::cursor::Cursor;
use crate::error::SyncError;
use crate::event::EventDecoder;
use crate::ledger::LedgerClient;
use crate::resolver::RangeResolver;
use crate::types::{Block, BlockHash};

/// Outcome of a successful synchronize call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Cursor read at the start of the call.
    pub previous_cursor: Cursor,
    /// Cursor after the call.
    pub cursor: Cursor,
    /// Blocks applied.
    pub blocks: usize,
    /// `Created` events applied.
    pub created: usize,
    /// `Updated` events applied.
    pub updated: usize,
    /// Logs that produced no event.
    pub skipped_logs: usize,
}

/// Keeps a store in step with one contract's events.
pub struct Synchronizer {
    config: SyncConfig,
    ledger: Arc<dyn LedgerClient>,
    decoder: Arc<dyn EventDecoder>,
    checkpoint: CheckpointManager,
    state: Mutex<SyncState>,
    flight: tokio::sync::Mutex<()>,
}

impl Synchronizer {
    pub fn new(
        config: SyncConfig,
        ledger: Arc<dyn LedgerClient>,
        decoder: Arc<dyn EventDecoder>,
        store: Arc<dyn SyncStore>,
    ) -> Result<Self, SyncError> {
        config.validate()?;
        let checkpoint = CheckpointManager::new(store, config.id.clone());
        Ok(Self {
            config,
            ledger,
            decoder,
            checkpoint,
            state: Mutex::new(SyncState::Idle),
            flight: tokio::sync::Mutex::new(()),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The phase of the call in progress, or `Idle`.
    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The stored cursor.
    pub async fn cursor(&self) -> Result<Cursor, SyncError> {
        self.checkpoint.load().await
    }

    /// Bring the store up to `target`, waiting for any call already in progress.
    pub async fn synchronize(&self, target: &BlockHash) -> Result<SyncReport, SyncError> {
        let _guard = self.flight.lock().await;
        self.run(target).await
    }

    /// Like [`synchronize`](Self::synchronize), but fails with `Busy` instead of waiting.
    pub async fn try_synchronize(&self, target: &BlockHash) -> Result<SyncReport, SyncError> {
        let _guard = self.flight.try_lock().map_err(|_| SyncError::Busy {
            id: self.config.id.clone(),
        })?;
        self.run(target).await
    }

    async fn run(&self, target: &BlockHash) -> Result<SyncReport, SyncError> {
        let _reset = StateReset(&self.state);
        let result = self.run_phases(target).await;
        match &result {
            Ok(report) => tracing::info!(
                id = %self.config.id,
                chain = %self.config.chain,
                from = %report.previous_cursor,
                to = %report.cursor,
                blocks = report.blocks,
                created = report.created,
                updated = report.updated,
                "synchronize complete"
            ),
            Err(e) => tracing::warn!(
                id = %self.config.id,
                %target,
                error = %e,
                retryable = e.is_retryable(),
                "synchronize failed"
            ),
        }
        result
    }

    async fn run_phases(&self, target: &BlockHash) -> Result<SyncReport, SyncError> {
        let previous_cursor = self.checkpoint.load().await?;
        tracing::info!(id = %self.config.id, %target, cursor = %previous_cursor, "synchronizing");

        self.set_state(SyncState::Resolving);
        let blocks = RangeResolver::new(self.ledger.as_ref())
            .max_range(self.config.max_range)
            .resolve(target, &previous_cursor)
            .await?;

        let Some(last) = blocks.last() else {
            return Ok(SyncReport {
                cursor: previous_cursor.clone(),
                previous_cursor,
                blocks: 0,
                created: 0,
                updated: 0,
                skipped_logs: 0,
            });
        };

        self.set_state(SyncState::Applying);
        let applicator =
            EventApplicator::new(self.ledger.as_ref(), self.decoder.as_ref(), &self.checkpoint);
        let summary = applicator
            .apply_blocks(&self.config.contract_address, &blocks)
            .await?;

        self.set_state(SyncState::AdvancingCursor);
        if self.config.verify_canonical {
            self.ensure_canonical(last).await?;
        }
        applicator.advance_cursor(last).await?;

        Ok(SyncReport {
            previous_cursor,
            cursor: Cursor::At(last.hash.clone()),
            blocks: summary.blocks,
            created: summary.created,
            updated: summary.updated,
            skipped_logs: summary.skipped_logs,
        })
    }

    async fn ensure_canonical(&self, last: &Block) -> Result<(), SyncError> {
        match self.ledger.canonical_hash(last.number).await? {
            Some(canonical) if canonical != last.hash => {
                tracing::warn!(
                    block = last.number,
                    target = %last.hash,
                    %canonical,
                    "target left the canonical chain during apply"
                );
                Err(SyncError::Stale {
                    target: last.hash.to_string(),
                    block_number: last.number,
                    canonical: canonical.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn set_state(&self, state: SyncState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

/// Returns the state to `Idle` when a call ends, including when its future is dropped.
struct StateReset<'a>(&'a Mutex<SyncState>);

impl Drop for StateReset<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = SyncState::Idle;
    }
}
