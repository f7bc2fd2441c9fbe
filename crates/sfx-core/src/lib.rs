//! Shared traits and value types for the snowflake-extractor crates.
//!
//! This crate owns nothing that touches a concrete database or warehouse;
//! it defines the contracts of §6 (`SourceExecutor`, `Destination`,
//! `CheckpointStore`) plus the row value model and retry policy that every
//! other crate builds on.

pub mod checkpoint;
pub mod destination;
pub mod retry;
pub mod source;
pub mod value;

pub use checkpoint::{CheckpointError, CheckpointStore};
pub use destination::{ColumnAdd, Destination, DestinationError};
pub use retry::{Retry, RetryOnce};
pub use source::{RowStream, SourceError, SourceExecutor};
pub use value::{PkValue, Row, RowValue};
