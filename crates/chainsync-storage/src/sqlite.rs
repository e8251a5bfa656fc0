//! SQLite storage backend for ChainSync.
//!
//! Persists cursors and entities to a single SQLite file.
//! Uses `sqlx` with WAL mode for concurrent read performance.
//!
//! # Usage
//! ```rust,no_run
//! use chainsync_storage::sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStorage::open("./gravity.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStorage::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use chainsync_core::checkpoint::{Checkpoint, SyncStore};
use chainsync_core::error::SyncError;
use chainsync_core::event::Entity;
use chainsync_core::types::BlockHash;

/// SQLite-backed storage for cursors and entities.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./gravity.db"`) or a full
    /// SQLite URL (`"sqlite:./gravity.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, SyncError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(SyncError::storage)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Every pooled connection to `:memory:` is a separate database, so the
    /// pool is limited to one connection.
    pub async fn in_memory() -> Result<Self, SyncError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(SyncError::storage)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create tables and enable WAL mode.
    async fn init_schema(&self) -> Result<(), SyncError> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(SyncError::storage)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cursors (
                indexer_id   TEXT    NOT NULL PRIMARY KEY,
                block_hash   TEXT    NOT NULL,
                block_number INTEGER NOT NULL,
                updated_at   INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(SyncError::storage)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS entities (
                kind         TEXT    NOT NULL,
                key          TEXT    NOT NULL,
                fields_json  TEXT    NOT NULL,
                block_number INTEGER NOT NULL,
                block_hash   TEXT    NOT NULL,
                tx_hash      TEXT    NOT NULL,
                log_index    INTEGER NOT NULL,
                PRIMARY KEY (kind, key)
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(SyncError::storage)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entities_block ON entities (block_number);")
            .execute(&self.pool)
            .await
            .map_err(SyncError::storage)?;

        Ok(())
    }

    /// All entities of one kind, ordered by key.
    pub async fn entities_by_kind(&self, kind: &str) -> Result<Vec<Entity>, SyncError> {
        let rows = sqlx::query(
            "SELECT kind, key, fields_json, block_number, block_hash, tx_hash, log_index
             FROM entities WHERE kind = ? ORDER BY key",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await
        .map_err(SyncError::storage)?;

        rows.iter().map(entity_from_row).collect()
    }
}

fn entity_from_row(row: &SqliteRow) -> Result<Entity, SyncError> {
    let fields_str: String = row.get("fields_json");
    let fields = serde_json::from_str(&fields_str).map_err(SyncError::storage)?;
    Ok(Entity {
        kind: row.get("kind"),
        key: row.get("key"),
        fields,
        block_number: row.get::<i64, _>("block_number") as u64,
        block_hash: BlockHash::new(row.get::<String, _>("block_hash")),
        tx_hash: row.get("tx_hash"),
        log_index: row.get::<i64, _>("log_index") as u32,
    })
}

// ─── SyncStore impl ──────────────────────────────────────────────────────────

#[async_trait]
impl SyncStore for SqliteStorage {
    async fn load_cursor(&self, indexer_id: &str) -> Result<Option<Checkpoint>, SyncError> {
        let row = sqlx::query(
            "SELECT indexer_id, block_hash, block_number, updated_at
             FROM cursors WHERE indexer_id = ?",
        )
        .bind(indexer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SyncError::storage)?;

        Ok(row.map(|r| Checkpoint {
            indexer_id: r.get("indexer_id"),
            block_hash: BlockHash::new(r.get::<String, _>("block_hash")),
            block_number: r.get::<i64, _>("block_number") as u64,
            updated_at: r.get("updated_at"),
        }))
    }

    async fn save_cursor(&self, checkpoint: Checkpoint) -> Result<(), SyncError> {
        sqlx::query(
            "INSERT OR REPLACE INTO cursors (indexer_id, block_hash, block_number, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&checkpoint.indexer_id)
        .bind(checkpoint.block_hash.as_str())
        .bind(checkpoint.block_number as i64)
        .bind(checkpoint.updated_at)
        .execute(&self.pool)
        .await
        .map_err(SyncError::storage)?;

        debug!(
            indexer_id = %checkpoint.indexer_id,
            block = checkpoint.block_number,
            "cursor saved"
        );
        Ok(())
    }

    async fn delete_cursor(&self, indexer_id: &str) -> Result<(), SyncError> {
        sqlx::query("DELETE FROM cursors WHERE indexer_id = ?")
            .bind(indexer_id)
            .execute(&self.pool)
            .await
            .map_err(SyncError::storage)?;
        Ok(())
    }

    async fn upsert(&self, entity: Entity) -> Result<(), SyncError> {
        let fields = serde_json::to_string(&entity.fields).map_err(SyncError::storage)?;

        sqlx::query(
            "INSERT OR REPLACE INTO entities
             (kind, key, fields_json, block_number, block_hash, tx_hash, log_index)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entity.kind)
        .bind(&entity.key)
        .bind(&fields)
        .bind(entity.block_number as i64)
        .bind(entity.block_hash.as_str())
        .bind(&entity.tx_hash)
        .bind(entity.log_index as i64)
        .execute(&self.pool)
        .await
        .map_err(SyncError::storage)?;

        debug!(kind = %entity.kind, key = %entity.key, block = entity.block_number, "entity upserted");
        Ok(())
    }

    async fn get_entity(&self, kind: &str, key: &str) -> Result<Option<Entity>, SyncError> {
        let row = sqlx::query(
            "SELECT kind, key, fields_json, block_number, block_hash, tx_hash, log_index
             FROM entities WHERE kind = ? AND key = ?",
        )
        .bind(kind)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(SyncError::storage)?;

        row.as_ref().map(entity_from_row).transpose()
    }

    async fn entity_count(&self) -> Result<u64, SyncError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM entities")
            .fetch_one(&self.pool)
            .await
            .map_err(SyncError::storage)?;

        let cnt: i64 = row.get("cnt");
        Ok(cnt as u64)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
