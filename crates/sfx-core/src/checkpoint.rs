#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("failed to read checkpoint key {key:?}: {source}")]
    Read {
        key: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to write checkpoint key {key:?}: {source}")]
    Write {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

/// The key-value checkpoint store assumed by §6. Two keys are used by the
/// driver: `<prefix>.state` (the `(last_modified, id)` cursor) and
/// `<prefix>.sql` (the stored Schema Fingerprint).
#[async_trait::async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CheckpointError>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CheckpointError>;
}
