use thiserror::Error;

/// The error kinds table of §7, unified into one type so the binary shell
/// can map any of them to exit code 1 through a single `anyhow::Context`.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("schema introspection failed: {0}")]
    SchemaUnavailable(#[from] sfx_schema::IntrospectError),

    #[error(transparent)]
    GraphBuild(#[from] sfx_graph::GraphError),

    #[error("schema drift detected: the source schema no longer matches the stored fingerprint")]
    SchemaDrift,

    #[error("source query failed: {0}")]
    Source(#[from] sfx_core::SourceError),

    #[error("row reconstruction failed: {0}")]
    Reconstruction(#[from] sfx_doc::ReconstructionError),

    #[error("destination write failed: {0}")]
    Destination(#[from] sfx_core::DestinationError),

    #[error("checkpoint store failed: {0}")]
    Checkpoint(#[from] sfx_core::CheckpointError),

    #[error("stored checkpoint state is corrupt: {0}")]
    CorruptCheckpointState(#[from] serde_json::Error),
}

impl DriverError {
    /// Whether §7's local-recovery policy (retry-once with backoff) applies.
    pub fn is_transient(&self) -> bool {
        match self {
            DriverError::Source(e) => e.is_transient(),
            DriverError::Destination(_) => true,
            _ => false,
        }
    }
}
