use sfx_core::{CheckpointError, CheckpointStore};
use sqlx::PgPool;

/// Table-backed `CheckpointStore` (§6): a two-column `(key, value)` table in
/// the same Postgres cluster the extractor reads from. Not part of the
/// source schema the Relation Graph Builder ever sees — callers point it at
/// a dedicated schema/connection if they want the checkpoint physically
/// separate from the tables being extracted.
pub struct PgCheckpointStore {
    pool: PgPool,
    table: String,
}

impl PgCheckpointStore {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Creates the checkpoint table if it doesn't already exist. Not part of
    /// the `CheckpointStore` contract; called once at process startup.
    pub async fn ensure_schema(&self) -> Result<(), CheckpointError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (key TEXT PRIMARY KEY, value BYTEA NOT NULL)",
            self.table
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| CheckpointError::Write {
                key: "<schema>".to_string(),
                source: e.into(),
            })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CheckpointStore for PgCheckpointStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CheckpointError> {
        let sql = format!("SELECT value FROM {} WHERE key = $1", self.table);
        let row: Option<(Vec<u8>,)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CheckpointError::Read {
                key: key.to_string(),
                source: e.into(),
            })?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CheckpointError> {
        let sql = format!(
            "INSERT INTO {} (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
            self.table
        );
        sqlx::query(&sql)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| CheckpointError::Write {
                key: key.to_string(),
                source: e.into(),
            })?;
        Ok(())
    }
}
