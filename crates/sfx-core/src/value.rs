use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single cell from a source row. The extraction SQL produces a fixed-width
/// row of these for every tuple it streams back (see `sfx-sql`'s Projection).
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl RowValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RowValue::Null)
    }

    /// The primary-key reading used by the reconstructor's path cursor:
    /// `None` means "no child row here", matching §4.4's null-path-key rule.
    pub fn as_pk(&self) -> Option<PkValue> {
        match self {
            RowValue::Null => None,
            RowValue::Int(i) => Some(PkValue::Int(*i)),
            RowValue::Text(s) => Some(PkValue::Text(s.clone())),
            other => panic!("non-key-typed value used as primary key: {other:?}"),
        }
    }
}

/// Primary-key values are compared a lot (path cursor, ordering); keep them
/// out of the general `RowValue` match so comparisons don't need PartialOrd
/// on floats/timestamps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PkValue {
    Int(i64),
    Text(String),
}

/// A single fixed-width row of the extraction SQL's result, in slot order.
pub type Row = Vec<RowValue>;
