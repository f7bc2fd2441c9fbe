use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum DestinationError {
    #[error("failed to write batch to destination: {0}")]
    Write(#[source] anyhow::Error),
    #[error("failed to apply schema update to destination: {0}")]
    SchemaUpdate(#[source] anyhow::Error),
}

/// A column the Typed Encoder (`sfx-encode`) has seen for the first time and
/// that must exist in the destination table before the batch lands. `tag`
/// is the type-tag suffix from §4.5 (`_b_`, `_n_`, `_t_`, `_s_`, `_a_`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAdd {
    pub field: String,
    pub tag: &'static str,
}

/// The external warehouse collaborator assumed by §6.
#[async_trait::async_trait]
pub trait Destination: Send + Sync {
    /// Creates the destination table if it doesn't already exist.
    async fn ensure_table(&self) -> Result<(), DestinationError>;

    /// Widens the destination table with newly observed field/tag columns.
    /// Called before `extend` for the batch that introduced them.
    async fn apply_schema_update(&self, adds: &[ColumnAdd]) -> Result<(), DestinationError>;

    /// Appends a batch of encoded records. Must be safe to call twice with
    /// the same batch (§4.6's at-least-once guarantee pushes this
    /// responsibility onto the destination, keyed on `(last_modified, id)`).
    async fn extend(&self, records: Vec<Value>) -> Result<(), DestinationError>;
}
