//! Fluent builder API for creating synchronizers.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chainsync_evm::{GravatarDecoder, JsonRpcLedger, SyncBuilder};
//! use chainsync_storage::InMemoryStorage;
//!
//! # fn example() -> Result<(), chainsync_core::SyncError> {
//! let sync = SyncBuilder::new()
//!     .id("gravity")
//!     .contract("0x2E645469f354BB4F5c8a05B3b30A929361cf77eC")
//!     .max_range(5_000)
//!     .build(
//!         Arc::new(JsonRpcLedger::new("http://localhost:8545")?),
//!         Arc::new(GravatarDecoder::new()),
//!         Arc::new(InMemoryStorage::new()),
//!     )?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chainsync_core::checkpoint::SyncStore;
use chainsync_core::config::SyncConfig;
use chainsync_core::error::SyncError;
use chainsync_core::event::EventDecoder;
use chainsync_core::ledger::LedgerClient;
use chainsync_core::sync::Synchronizer;

/// Fluent builder for `SyncConfig` and `Synchronizer`.
#[derive(Default)]
pub struct SyncBuilder {
    config: SyncConfig,
}

impl SyncBuilder {
    pub fn new() -> Self {
        Self {
            config: SyncConfig::default(),
        }
    }

    /// Start from an existing config (e.g. one loaded from a file).
    pub fn from_config(config: SyncConfig) -> Self {
        Self { config }
    }

    /// Set the instance ID (used as the cursor key).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.config.id = id.into();
        self
    }

    /// Set the chain slug.
    pub fn chain(mut self, chain: impl Into<String>) -> Self {
        self.config.chain = chain.into();
        self
    }

    /// Set the watched contract address.
    pub fn contract(mut self, address: impl Into<String>) -> Self {
        self.config.contract_address = address.into();
        self
    }

    /// Limit how far back one call may walk.
    pub fn max_range(mut self, blocks: u64) -> Self {
        self.config.max_range = Some(blocks);
        self
    }

    /// Remove the walk limit.
    pub fn unbounded(mut self) -> Self {
        self.config.max_range = None;
        self
    }

    /// Check the target against the canonical chain before advancing the cursor.
    pub fn verify_canonical(mut self, enabled: bool) -> Self {
        self.config.verify_canonical = enabled;
        self
    }

    /// Build the `SyncConfig`.
    pub fn build_config(self) -> SyncConfig {
        self.config
    }

    /// Build a `Synchronizer` over the given capabilities.
    pub fn build(
        self,
        ledger: Arc<dyn LedgerClient>,
        decoder: Arc<dyn EventDecoder>,
        store: Arc<dyn SyncStore>,
    ) -> Result<Synchronizer, SyncError> {
        Synchronizer::new(self.config, ledger, decoder, store)
    }
}
