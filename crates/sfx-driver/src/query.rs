use chrono::{DateTime, Utc};
use sfx_core::PkValue;
use sfx_sql::Dialect;

use crate::checkpoint_state::CheckpointState;

/// §4.6 step 1: the driver sub-query selecting the next `chunk_size` root
/// ids strictly after the checkpoint, in `(last_modified, id)` order.
///
/// Values are inlined as literals rather than bound parameters: the
/// `SourceExecutor` contract (§6) is a plain `sql: &str`, so the full
/// extraction query — driver included — must already be one complete,
/// self-contained statement by the time it reaches the source.
pub fn driver_sql(
    dialect: &dyn Dialect,
    root_table: &str,
    pk_column: &str,
    last_modified_column: &str,
    state: &CheckpointState,
    chunk_size: u32,
) -> String {
    format!(
        "SELECT {pk} AS id FROM {table} WHERE {lm} > {lm_lit} OR ({lm} = {lm_lit} AND {pk} > {pk_lit}) ORDER BY {lm}, {pk} LIMIT {chunk}",
        pk = dialect.quote_ident(pk_column),
        table = dialect.quote_ident(root_table),
        lm = dialect.quote_ident(last_modified_column),
        lm_lit = format_timestamp_literal(&state.last_modified),
        pk_lit = format_pk_literal(&state.last_id),
        chunk = chunk_size,
    )
}

fn format_timestamp_literal(ts: &DateTime<Utc>) -> String {
    format!("TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S%.6f"))
}

fn format_pk_literal(pk: &PkValue) -> String {
    match pk {
        PkValue::Int(i) => i.to_string(),
        PkValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}
