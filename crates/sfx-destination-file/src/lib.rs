//! A reference `Destination` (§6): appends encoded records as
//! newline-delimited JSON to a file. Schema is implicit in JSON, so
//! `apply_schema_update` only logs the new columns rather than issuing a
//! DDL statement — a real warehouse client (e.g. BigQuery) would widen a
//! table schema here instead.
//!
//! This exists so the CLI has something concrete to run against without
//! depending on a warehouse SDK the rest of the crate never needed; see
//! DESIGN.md.

use std::path::{Path, PathBuf};

use sfx_core::{ColumnAdd, Destination, DestinationError};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub struct FileDestination {
    path: PathBuf,
    file: Mutex<Option<tokio::fs::File>>,
}

impl FileDestination {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(None),
        }
    }

    async fn open(&self) -> std::io::Result<tokio::fs::File> {
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
    }
}

#[async_trait::async_trait]
impl Destination for FileDestination {
    async fn ensure_table(&self) -> Result<(), DestinationError> {
        let file = self
            .open()
            .await
            .map_err(|e| DestinationError::Write(e.into()))?;
        *self.file.lock().await = Some(file);
        Ok(())
    }

    async fn apply_schema_update(&self, adds: &[ColumnAdd]) -> Result<(), DestinationError> {
        for add in adds {
            tracing::info!(field = %add.field, tag = add.tag, "new column observed");
        }
        Ok(())
    }

    async fn extend(&self, records: Vec<serde_json::Value>) -> Result<(), DestinationError> {
        let mut guard = self.file.lock().await;
        let file = match guard.as_mut() {
            Some(file) => file,
            None => {
                let file = self.open().await.map_err(|e| DestinationError::Write(e.into()))?;
                *guard = Some(file);
                guard.as_mut().unwrap()
            }
        };
        for record in records {
            let mut line = serde_json::to_vec(&record).map_err(|e| DestinationError::Write(e.into()))?;
            line.push(b'\n');
            file.write_all(&line)
                .await
                .map_err(|e| DestinationError::Write(e.into()))?;
        }
        file.flush().await.map_err(|e| DestinationError::Write(e.into()))?;
        Ok(())
    }
}
