//! Incremental Driver and Drift Guard (§4.6, §4.7): owns the checkpoint,
//! composes the per-batch driver query, verifies the canonical SQL against
//! the stored fingerprint, and loops batches through the core pipeline
//! until the source is drained.

pub mod checkpoint_state;
pub mod config;
pub mod error;
pub mod query;

use sfx_core::{CheckpointStore, ColumnAdd, Destination, PkValue, Retry, RowValue, SourceExecutor};
use sfx_doc::Reconstructor;
use sfx_encode::SchemaMirror;
use sfx_graph::{build_graph, SchemaGraph};
use sfx_schema::{require_primary_keys, SchemaSet};
use sfx_sql::{generate_sql, Dialect, Plan};

pub use checkpoint_state::CheckpointState;
pub use config::DriverConfig;
pub use error::DriverError;
pub use query::driver_sql;

/// Immutable, once-per-process state: the schema graph, the generated plan
/// and its CanonicalSQL. Built during startup (§5: "Schema Graph and
/// CanonicalSQL are immutable after startup") and then shared across every
/// batch of the loop.
pub struct ExtractionPlan {
    pub graph: SchemaGraph,
    pub plan: Plan,
    pub sql: sfx_sql::CanonicalSql,
}

/// Builds the immutable extraction plan from an introspected schema: the
/// Relation Graph Builder (§4.2) followed by the SQL Generator (§4.3).
/// Also enforces §4.1's primary-key contract for every many-reachable node,
/// since the Document Reconstructor's path cursor requires one.
pub fn build_extraction_plan(
    schema: &SchemaSet,
    config: &DriverConfig,
    dialect: &dyn Dialect,
) -> Result<ExtractionPlan, DriverError> {
    let graph = build_graph(
        schema,
        &config.root_table,
        &config.include_set,
        &config.prune_edges,
    )?;

    let mut many_tables = Vec::new();
    collect_many_tables(schema, &graph.root, &mut many_tables);
    require_primary_keys(schema, &many_tables)?;

    let (sql, _projection) = generate_sql(schema, &graph, dialect);
    let plan = sfx_sql::build_plan(schema, &graph);
    Ok(ExtractionPlan { graph, plan, sql })
}

/// Walks the graph collecting the root table plus every table reachable
/// through a many-edge, since each becomes a collection-grouping node the
/// Document Reconstructor keys on its primary key (§4.1's `AmbiguousKey`).
fn collect_many_tables<'a>(
    schema: &'a SchemaSet,
    node: &sfx_graph::GraphNode,
    out: &mut Vec<&'a sfx_schema::Table>,
) {
    if let Some(table) = schema.table(&node.table) {
        out.push(table);
    }
    for (_, child) in node.many_children() {
        collect_many_tables(schema, child, out);
    }
}

/// Drift Guard (§4.7). Compares the freshly generated fingerprint against
/// the one stored under `<prefix>.sql`. Absent → store and continue. Equal
/// → continue silently. Different and no override → `SchemaDrift`.
/// Different with override → store the new fingerprint and continue.
pub async fn check_drift(
    checkpoint: &dyn CheckpointStore,
    config: &DriverConfig,
    sql: &sfx_sql::CanonicalSql,
) -> Result<(), DriverError> {
    let fingerprint = sql.fingerprint();
    let stored = checkpoint.get(&config.sql_key()).await?;
    match stored {
        None => {
            checkpoint
                .set(&config.sql_key(), fingerprint.into_bytes())
                .await?;
            Ok(())
        }
        Some(bytes) if bytes == fingerprint.as_bytes() => Ok(()),
        Some(_) if config.drift_allow_override => {
            checkpoint
                .set(&config.sql_key(), fingerprint.into_bytes())
                .await?;
            Ok(())
        }
        Some(_) => Err(DriverError::SchemaDrift),
    }
}

/// Loads the persisted `(last_modified, last_id)` cursor, defaulting to the
/// epoch per §4.6 when no checkpoint has ever been written.
pub async fn load_checkpoint_state(
    checkpoint: &dyn CheckpointStore,
    config: &DriverConfig,
) -> Result<CheckpointState, DriverError> {
    match checkpoint.get(&config.state_key()).await? {
        Some(bytes) => Ok(CheckpointState::from_bytes(&bytes)?),
        None => Ok(CheckpointState::default()),
    }
}

/// Result of running one batch of the loop (§4.6 steps 1-6).
pub struct BatchOutcome {
    /// Number of documents emitted to the destination this batch. Zero means
    /// the source is caught up and the loop should terminate (§4.6 step 4).
    pub documents: usize,
}

/// Runs a single batch of the Incremental Driver loop end to end: composes
/// the driver sub-query from the checkpoint, renders the full extraction
/// SQL, streams rows through the Document Reconstructor and Typed Encoder,
/// pushes the resulting batch to the destination, then advances the
/// checkpoint. Returns `documents: 0` when the batch was empty (caught up);
/// the caller is expected to loop until that happens (§4.6 step 7).
pub async fn run_batch(
    extraction: &ExtractionPlan,
    source: &dyn SourceExecutor,
    destination: &dyn Destination,
    checkpoint: &dyn CheckpointStore,
    mirror: &mut SchemaMirror,
    config: &DriverConfig,
    dialect: &dyn Dialect,
    pk_column: &str,
    last_modified_column: &str,
    state: &mut CheckpointState,
    retry: &mut dyn Retry,
) -> Result<BatchOutcome, DriverError> {
    use futures::StreamExt;

    let driver = driver_sql(
        dialect,
        &config.root_table,
        pk_column,
        last_modified_column,
        state,
        config.chunk_size,
    );
    let full_sql = extraction.sql.render(&driver);

    let stream_result = stream_batch(&extraction.plan, source, &full_sql).await;
    let (docs, last_seen) = match stream_result {
        Ok(ok) => {
            retry.reset();
            ok
        }
        Err(err) if err.is_transient() => {
            if let Some(delay) = retry.next_backoff() {
                tracing::warn!(error = %err, delay_ms = delay.as_millis(), "retrying transient source error");
                tokio::time::sleep(delay).await;
                stream_batch(&extraction.plan, source, &full_sql).await?
            } else {
                return Err(err);
            }
        }
        Err(err) => return Err(err),
    };

    if docs.is_empty() {
        return Ok(BatchOutcome { documents: 0 });
    }

    let mut records = Vec::with_capacity(docs.len());
    let mut adds: Vec<ColumnAdd> = Vec::new();
    for doc in &docs {
        let (record, mut new_adds) = mirror.encode(doc);
        records.push(record);
        adds.append(&mut new_adds);
    }

    if !adds.is_empty() {
        with_destination_retry(retry, || destination.apply_schema_update(&adds)).await?;
    }
    let document_count = records.len();
    with_destination_retry(retry, || destination.extend(records.clone())).await?;

    if let Some((last_modified, last_id)) = last_seen {
        *state = CheckpointState {
            last_modified,
            last_id,
        };
        checkpoint
            .set(&config.state_key(), state.to_bytes())
            .await?;
    }

    Ok(BatchOutcome {
        documents: document_count,
    })
}

/// Retries a destination write once with jittered backoff, matching the
/// §7/§4.10 retry-once policy already applied to source reads in
/// `run_batch` — `DriverError::is_transient` treats every
/// `DestinationError` as transient, so this always gets the one retry.
async fn with_destination_retry<T, F, Fut>(retry: &mut dyn Retry, mut op: F) -> Result<T, DriverError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, sfx_core::DestinationError>>,
{
    match op().await {
        Ok(value) => {
            retry.reset();
            Ok(value)
        }
        Err(err) => {
            let err = DriverError::from(err);
            if !err.is_transient() {
                return Err(err);
            }
            match retry.next_backoff() {
                Some(delay) => {
                    tracing::warn!(error = %err, delay_ms = delay.as_millis(), "retrying transient destination error");
                    tokio::time::sleep(delay).await;
                    op().await.map_err(DriverError::from)
                }
                None => Err(err),
            }
        }
    }
}

/// Streams one extraction query's rows through the Reconstructor, returning
/// every completed document plus the `(last_modified, id)` of the final one
/// (the checkpoint advances to this pair per §4.6 step 6). `last_modified`
/// is read from slot 1 of the root node, matching the `job` table's
/// `(id, last_modified, ...)` column convention assumed throughout this crate.
async fn stream_batch(
    plan: &Plan,
    source: &dyn SourceExecutor,
    sql: &str,
) -> Result<(Vec<sfx_doc::Document>, Option<(chrono::DateTime<chrono::Utc>, PkValue)>), DriverError>
{
    use futures::StreamExt;

    let mut rows = source.stream(sql).await?;
    let mut reconstructor = Reconstructor::new(plan);
    let mut docs = Vec::new();
    let mut last_seen = None;

    while let Some(row) = rows.next().await {
        let row = row?;
        last_seen = read_last_modified_id(plan, &row).or(last_seen);
        if let Some(doc) = reconstructor.ingest_row(&row)? {
            docs.push(doc);
        }
    }
    drop(rows);
    if let Some(doc) = reconstructor.finish() {
        docs.push(doc);
    }

    Ok((docs, last_seen))
}

fn read_last_modified_id(
    plan: &Plan,
    row: &sfx_core::Row,
) -> Option<(chrono::DateTime<chrono::Utc>, PkValue)> {
    let root = &plan.nodes[0];
    let lm_offset = root.columns.iter().position(|c| c == "last_modified")?;
    let id = root
        .pk_slots()
        .into_iter()
        .find_map(|slot| row[slot].as_pk())?;
    match &row[root.slot_start + lm_offset] {
        RowValue::Timestamp(ts) => Some((*ts, id)),
        _ => None,
    }
}
