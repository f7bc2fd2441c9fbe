use futures::stream::BoxStream;

use crate::value::Row;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source query timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("source query failed: {0}")]
    Query(#[source] anyhow::Error),
    #[error("source connection unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

impl SourceError {
    /// §7: `SourceTimeout` and other transient errors get one retry; anything
    /// that isn't transient should fail fast instead of burning the retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Timeout(_) | SourceError::Unavailable(_))
    }
}

pub type RowStream<'a> = BoxStream<'a, Result<Row, SourceError>>;

/// The external source-database collaborator assumed by §6: it can execute
/// arbitrary SQL text and stream back ordered row tuples under a transaction.
/// `sfx-postgres` is the reference adapter.
#[async_trait::async_trait]
pub trait SourceExecutor: Send + Sync {
    /// Runs `sql` under a single read transaction and streams its rows back
    /// in the order the source produced them. The stream must be exhausted
    /// (or dropped) before the transaction is considered complete.
    async fn stream<'a>(&'a self, sql: &str) -> Result<RowStream<'a>, SourceError>;
}
