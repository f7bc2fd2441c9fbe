//! Typed Encoder (§4.5): flattens a reconstructed `Document` into the
//! destination's tagged-field record shape, tracking newly observed
//! field/tag columns for the schema mirror the driver applies before a
//! batch lands.

mod escape;

use std::collections::HashSet;

use chrono::SecondsFormat;
use escape::escape_field_name;
use sfx_core::{ColumnAdd, RowValue};
use sfx_doc::{DocValue, Document};
use serde_json::{Map, Value};

fn tag_for(value: &RowValue) -> &'static str {
    match value {
        RowValue::Null => "_s_", // an absent scalar still needs a concrete column; see DESIGN.md
        RowValue::Bool(_) => "_b_",
        RowValue::Int(_) | RowValue::Float(_) => "_n_",
        RowValue::Text(_) => "_s_",
        RowValue::Timestamp(_) => "_t_",
    }
}

fn scalar_json(value: &RowValue) -> Value {
    match value {
        RowValue::Null => Value::Null,
        RowValue::Bool(b) => Value::Bool(*b),
        RowValue::Int(i) => Value::from(*i),
        RowValue::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        RowValue::Text(s) => Value::String(s.clone()),
        RowValue::Timestamp(ts) => {
            // `YYYY-MM-DD HH:MM:SS.ffffff` UTC, per §4.5.
            let rendered = ts.to_rfc3339_opts(SecondsFormat::Micros, true);
            let rendered = rendered.trim_end_matches('Z').replace('T', " ");
            Value::String(rendered)
        }
    }
}

/// Maintains the set of field/tag columns already reported to the
/// destination, so repeated encoding only reports genuinely new columns
/// (§4.5: "when a field/tag combination is first seen").
#[derive(Debug, Default)]
pub struct SchemaMirror {
    seen: HashSet<(String, &'static str)>,
}

impl SchemaMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `doc` into a destination record, returning the record and any
    /// field/tag columns this call is the first to observe.
    pub fn encode(&mut self, doc: &Document) -> (Value, Vec<ColumnAdd>) {
        let mut adds = Vec::new();
        let record = self.encode_document(doc, &mut adds);
        (record, adds)
    }

    fn encode_document(&mut self, doc: &Document, adds: &mut Vec<ColumnAdd>) -> Value {
        let mut record = Map::new();
        for (field, value) in &doc.fields {
            let escaped = escape_field_name(field);
            match value {
                DocValue::Scalar(v) => {
                    let tag = tag_for(v);
                    self.note(&escaped, tag, adds);
                    record.insert(format!("{escaped}.{tag}"), scalar_json(v));
                }
                DocValue::One(nested) => {
                    // One-edges nest under their own field name rather than
                    // flattening into the parent — two different lookups
                    // (or a lookup and the root) can share a leaf field name
                    // (e.g. both `job` and `machine` have an `id`), and
                    // flattening would silently clobber one with the other.
                    // Matches the original encoder's recursive dict nesting
                    // (see DESIGN.md).
                    let encoded = self.encode_document(nested, adds);
                    record.insert(escaped, encoded);
                }
                DocValue::Many(children) => {
                    // §4.5: a sequence becomes an object with a single key
                    // `_a_`, not a dot-suffixed column — it nests rather
                    // than flattens, matching the destination's RECORD/REPEATED
                    // column convention (see DESIGN.md).
                    let tag = "_a_";
                    self.note(&escaped, tag, adds);
                    let encoded: Vec<Value> = children
                        .iter()
                        .map(|(_, child)| self.encode_document(child, adds))
                        .collect();
                    let mut wrapper = Map::new();
                    wrapper.insert(tag.to_string(), Value::Array(encoded));
                    record.insert(escaped, Value::Object(wrapper));
                }
            }
        }
        Value::Object(record)
    }

    fn note(&mut self, field: &str, tag: &'static str, adds: &mut Vec<ColumnAdd>) {
        if self.seen.insert((field.to_string(), tag)) {
            adds.push(ColumnAdd { field: field.to_string(), tag });
        }
    }
}
