//! chainsync-core — incremental, cursor-based contract event synchronization.
//!
//! # Architecture
//!
//! ```text
//! Synchronizer::synchronize(target)
//!     ├── CheckpointManager  (read cursor)
//!     ├── RangeResolver      (walk parent hashes target → cursor, reverse)
//!     ├── EventApplicator    (per block: logs → decode by kind → upsert)
//!     └── CheckpointManager  (single terminal cursor write)
//! ```
//!
//! The ledger, decoder, and store are capabilities supplied by the caller
//! ([`LedgerClient`], [`EventDecoder`], [`SyncStore`]).

pub mod applicator;
pub mod checkpoint;
pub mod config;
pub mod cursor;
pub mod error;
pub mod event;
pub mod ledger;
pub mod resolver;
pub mod sync;
pub mod types;

#[cfg(test)]
mod testing;

pub use applicator::{ApplySummary, EventApplicator};
pub use checkpoint::{Checkpoint, CheckpointManager, SyncStore};
pub use config::{SyncConfig, SyncState};
pub use cursor::Cursor;
pub use error::SyncError;
pub use event::{DomainEvent, Entity, EventDecoder, EventKind};
pub use ledger::LedgerClient;
pub use resolver::RangeResolver;
pub use sync::{SyncReport, Synchronizer};
pub use types::{Block, BlockHash, RawLog};
