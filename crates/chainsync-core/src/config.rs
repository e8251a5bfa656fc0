//! Synchronizer configuration and state types.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Configuration for a synchronizer instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Unique name for this instance (used as the cursor key).
    pub id: String,
    /// Chain slug (e.g. `"ethereum"`), used for logging only.
    pub chain: String,
    /// Address of the watched contract.
    pub contract_address: String,
    /// Maximum number of blocks a single call may walk back.
    /// `None` walks until the cursor or the chain origin.
    pub max_range: Option<u64>,
    /// Re-check the target against the ledger's canonical chain before
    /// advancing the cursor.
    pub verify_canonical: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            id: "default".into(),
            chain: "ethereum".into(),
            contract_address: String::new(),
            max_range: Some(10_000),
            verify_canonical: false,
        }
    }
}

impl SyncConfig {
    /// Parse a JSON config document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SyncError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.id.is_empty() {
            return Err(SyncError::Config("id must not be empty".into()));
        }
        if self.contract_address.is_empty() {
            return Err(SyncError::Config("contract_address must be set".into()));
        }
        if self.max_range == Some(0) {
            return Err(SyncError::Config("max_range must be at least 1".into()));
        }
        Ok(())
    }
}

/// Phase of a synchronize call.
///
/// `Idle → Resolving → Applying → AdvancingCursor → Idle`. A failure in any
/// phase returns to `Idle` without writing the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    /// No call in progress.
    Idle,
    /// Walking back from the target to the cursor.
    Resolving,
    /// Upserting events block by block.
    Applying,
    /// Writing the new cursor.
    AdvancingCursor,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Resolving => write!(f, "resolving"),
            Self::Applying => write!(f, "applying"),
            Self::AdvancingCursor => write!(f, "advancing-cursor"),
        }
    }
}
