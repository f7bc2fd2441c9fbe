use crate::model::{SchemaSet, Table};

#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    #[error("source information schema is unavailable: {0}")]
    SchemaUnavailable(#[source] anyhow::Error),
    #[error("table {0:?} has no primary key but is reachable as a many-node")]
    AmbiguousKey(String),
}

/// Reads the source's information schema and produces the full Table set.
/// `sfx-postgres::PgIntrospector` is the reference implementation; anything
/// that can enumerate tables, columns, primary keys and foreign keys in the
/// deterministic order required by §4.1 can implement this.
#[async_trait::async_trait]
pub trait Introspector: Send + Sync {
    async fn introspect(&self) -> Result<SchemaSet, IntrospectError>;
}

/// Validates that every table reachable as a many-node (i.e. every table at
/// all, since any table could in principle be a child) carries a primary
/// key, per §4.1's `AmbiguousKey` failure. Called once after introspection;
/// the Relation Graph Builder only needs to re-check tables it actually
/// attaches as many-nodes, but failing fast here keeps the contract simple.
pub fn require_primary_keys(schema: &SchemaSet, required: &[&Table]) -> Result<(), IntrospectError> {
    for table in required {
        if !table.has_primary_key() {
            return Err(IntrospectError::AmbiguousKey(table.qualified_name.clone()));
        }
    }
    Ok(())
}
