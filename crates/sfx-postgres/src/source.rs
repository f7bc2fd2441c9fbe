use std::time::Duration;

use async_stream::try_stream;
use futures::StreamExt;
use sfx_core::{RowStream, SourceError, SourceExecutor};
use sqlx::{Connection, PgPool};

use crate::value::decode_row;

/// Postgres SQLSTATE for "query_canceled" raised by `statement_timeout`.
const STATEMENT_TIMEOUT_SQLSTATE: &str = "57014";

/// Reference `SourceExecutor` (§6): runs the extraction SQL under a single
/// read transaction on a dedicated connection, per §5's "source reads a
/// consistent snapshot within one extraction query" and "source cursor ...
/// held open under a transaction for the life of one batch".
pub struct PgSourceExecutor {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgSourceExecutor {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }
}

#[async_trait::async_trait]
impl SourceExecutor for PgSourceExecutor {
    async fn stream<'a>(&'a self, sql: &str) -> Result<RowStream<'a>, SourceError> {
        let pool = self.pool.clone();
        let sql = sql.to_string();
        let timeout = self.statement_timeout;

        // `conn` and the transaction it opens must live as long as the
        // stream that borrows them, so both are acquired inside the
        // `try_stream!` block rather than before it — otherwise `conn`
        // would be dropped on return while the returned stream still held
        // a transaction referencing it.
        let s = try_stream! {
            let mut conn = pool
                .acquire()
                .await
                .map_err(|e| SourceError::Unavailable(e.into()))?;

            sqlx::query(&format!("SET statement_timeout = {}", timeout.as_millis()))
                .execute(&mut *conn)
                .await
                .map_err(|e| SourceError::Unavailable(e.into()))?;

            let mut txn = conn
                .begin()
                .await
                .map_err(|e| SourceError::Unavailable(e.into()))?;

            let mut rows = sqlx::query(&sql).fetch(&mut *txn);
            while let Some(row) = rows.next().await {
                let row = row.map_err(|e| classify_error(e, timeout))?;
                yield decode_row(&row).map_err(|e| classify_error(e, timeout))?;
            }
            drop(rows);
            // Read-only query: an explicit rollback is as correct as a
            // commit and cheaper (no WAL entry for a statement that wrote
            // nothing).
            let _ = txn.rollback().await;
        };

        Ok(Box::pin(s) as RowStream<'a>)
    }
}

fn classify_error(err: sqlx::Error, timeout: Duration) -> SourceError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(STATEMENT_TIMEOUT_SQLSTATE) {
            return SourceError::Timeout(timeout);
        }
    }
    SourceError::Query(err.into())
}
