use sfx_core::{PkValue, RowValue};

/// A nested job document (§3, §4.4). Field order follows traversal order:
/// a node's own columns first, then its one-edge lookups, then its
/// many-edge collections, each in plan (schema-graph) order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub fields: Vec<(String, DocValue)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_scalar(&mut self, field: &str, value: RowValue) {
        self.fields.push((field.to_string(), DocValue::Scalar(value)));
    }

    pub fn set_one(&mut self, field: &str, nested: Document) {
        self.fields.push((field.to_string(), DocValue::One(nested)));
    }

    /// Declares an empty many-edge collection under `field`, so every
    /// document carries all of its schema's collection fields even when no
    /// child ever arrives (§8: "empty (or absent) sequences").
    pub fn declare_many(&mut self, field: &str) {
        self.fields.push((field.to_string(), DocValue::Many(Vec::new())));
    }

    pub fn get(&self, field: &str) -> Option<&DocValue> {
        self.fields.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    /// Mutable access to a many-edge collection declared under `field`.
    /// Panics if `field` was not declared as a many-edge by the reconstructor
    /// — that would be a bug in plan traversal, not malformed input.
    pub fn many_mut(&mut self, field: &str) -> &mut Vec<(PkValue, Document)> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == field)
            .map(|(_, v)| match v {
                DocValue::Many(children) => children,
                _ => panic!("field {field:?} is not a many-edge collection"),
            })
            .unwrap_or_else(|| panic!("field {field:?} was never declared as a many-edge collection"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    Scalar(RowValue),
    /// A one-edge lookup, nested inline. Absent entirely when the lookup
    /// has no matching row (§4.4).
    One(Document),
    /// A many-edge collection, in arrival (source result) order. The
    /// `PkValue` alongside each child is the reconstructor's own bookkeeping
    /// (identifying "is this still the currently open child") and is not
    /// part of the document's public shape.
    Many(Vec<(PkValue, Document)>),
}
