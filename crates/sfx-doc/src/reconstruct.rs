use sfx_core::{PkValue, Row};
use sfx_graph::PathId;
use sfx_sql::{Plan, PlanNode};
use thiserror::Error;

use crate::document::Document;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconstructionError {
    /// A non-null scalar landed at a slot belonging to a branch that this
    /// row's path-key vector says isn't open (§4.4, §7). Indicates the
    /// upstream SQL or driver broke the NULL-padding invariant.
    #[error("row has a non-null value for branch {path:?}, which its own path-key marks closed")]
    UnexpectedScalar { path: PathId },
}

/// Folds the ordered, flat row stream into nested `Document`s (§4.4). One
/// `Reconstructor` is scoped to a single extraction pass over one `Plan`.
pub struct Reconstructor<'a> {
    plan: &'a Plan,
    current: Option<(PkValue, Document)>,
}

impl<'a> Reconstructor<'a> {
    pub fn new(plan: &'a Plan) -> Self {
        Self { plan, current: None }
    }

    /// Folds one row in. Returns the previously in-progress root `Document`,
    /// now complete, whenever this row belongs to a new root entity — rows
    /// are ordered root-major (§4.3 step 5), so a root-pk change can only
    /// mean the prior document has no more rows coming.
    pub fn ingest_row(&mut self, row: &Row) -> Result<Option<Document>, ReconstructionError> {
        let root_node = &self.plan.nodes[0];
        let root_pk = root_node
            .pk_slots()
            .iter()
            .find_map(|&slot| row[slot].as_pk())
            .expect("root row must always carry a non-null primary key");

        let mut completed = None;
        let needs_new_root = !matches!(&self.current, Some((pk, _)) if pk == &root_pk);
        if needs_new_root {
            if let Some((_, doc)) = self.current.take() {
                completed = Some(doc);
            }
            self.current = Some((root_pk, self.seed_node(root_node, row)));
        }

        let chain = self.chain_for(row);
        self.validate_no_stray_scalars(row, &chain)?;

        let (_, root_doc) = self.current.as_mut().expect("root just seeded");
        let mut cursor = root_doc;
        for (path, pk) in &chain {
            let node = self.plan.by_path(path);
            let label = path.0.last().expect("chain entries are non-root");
            let children = cursor.many_mut(label);
            let is_open = matches!(children.last(), Some((last_pk, _)) if last_pk == pk);
            if !is_open {
                let child = self.seed_node(node, row);
                children.push((pk.clone(), child));
            }
            cursor = &mut children.last_mut().unwrap().1;
        }

        Ok(completed)
    }

    /// Flushes the last in-progress document at end of stream.
    pub fn finish(mut self) -> Option<Document> {
        self.current.take().map(|(_, doc)| doc)
    }

    /// Builds a fresh `Document` for `node` from `row`: its own scalar
    /// columns, its immediate one-edge lookups, and empty placeholders for
    /// its immediate many-edge collections.
    fn seed_node(&self, node: &PlanNode, row: &Row) -> Document {
        let mut doc = Document::new();
        for (i, col) in node.columns.iter().enumerate() {
            doc.set_scalar(col, row[node.slot_start + i].clone());
        }
        for lookup in self.plan.one_children_of(&node.alias) {
            let lookup_slots = lookup.slot_start..lookup.slot_start + lookup.width();
            // The lookup is joined with a LEFT JOIN (§4.3 step 3): no match
            // means every one of its columns comes back NULL, and the edge
            // is absent entirely rather than present with null fields.
            if lookup_slots.clone().all(|s| row[s].is_null()) {
                continue;
            }
            let mut nested = Document::new();
            for (i, col) in lookup.columns.iter().enumerate() {
                nested.set_scalar(col, row[lookup.slot_start + i].clone());
            }
            let label = lookup.path.0.last().expect("one-edges are never root");
            doc.set_one(label, nested);
        }
        for many in self.plan.many_children_of(&node.alias) {
            let label = many.path.0.last().expect("many-edges are never root");
            doc.declare_many(label);
        }
        doc
    }

    /// This row's own branch ancestor chain (root excluded), in pre-order.
    /// Walked top-down from root rather than filtered flat over all branch
    /// nodes: a non-null primary key for a node whose parent isn't open is
    /// not part of any chain — it surfaces as an `UnexpectedScalar` instead,
    /// since a well-formed row's own branch always projects its full spine.
    fn chain_for(&self, row: &Row) -> Vec<(PathId, PkValue)> {
        let mut chain = Vec::new();
        self.walk_chain(&self.plan.nodes[0], row, &mut chain);
        chain
    }

    fn walk_chain(&self, node: &PlanNode, row: &Row, chain: &mut Vec<(PathId, PkValue)>) {
        for child in self.plan.many_children_of(&node.alias) {
            if let Some(pk) = child.pk_slots().iter().find_map(|&slot| row[slot].as_pk()) {
                chain.push((child.path.clone(), pk));
                self.walk_chain(child, row, chain);
            }
        }
    }

    /// Every branch node not on this row's own chain must carry only NULLs
    /// in its own column range (§4.3's NULL padding, §7's ReconstructionError).
    fn validate_no_stray_scalars(
        &self,
        row: &Row,
        chain: &[(PathId, PkValue)],
    ) -> Result<(), ReconstructionError> {
        let open: std::collections::HashSet<&PathId> = chain.iter().map(|(p, _)| p).collect();
        for node in self.plan.branch_nodes() {
            if node.path.is_root() || open.contains(&node.path) {
                continue;
            }
            let slots = node.slot_start..node.slot_start + node.width();
            if slots.clone().any(|s| !row[s].is_null()) {
                return Err(ReconstructionError::UnexpectedScalar { path: node.path.clone() });
            }
        }
        Ok(())
    }
}
