use std::collections::{HashMap, HashSet};

use sfx_schema::{ForeignKey, SchemaSet, Table};

use crate::model::{EdgeKind, GraphNode, RelationEdge, SchemaGraph};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("root table {0:?} is not present in the introspected schema")]
    UnreachableRoot(String),
}

/// Builds the rooted `RelationEdge` tree per §4.2.
///
/// The traversal is conceptually a BFS from `root_table`, but because the
/// output is a tree (one parent per node) the cycle check only needs the
/// chain of ancestors back to the root, which a recursive walk carries for
/// free; the resulting tree and edge ordering are identical to a queue-based
/// BFS given the deterministic per-node edge ordering below.
pub fn build_graph(
    schema: &SchemaSet,
    root_table: &str,
    include_set: &[String],
    prune_edges: &[String],
) -> Result<SchemaGraph, GraphError> {
    let root = schema
        .table(root_table)
        .ok_or_else(|| GraphError::UnreachableRoot(root_table.to_string()))?;

    let include: HashSet<String> = include_set.iter().cloned().collect();
    let prune: HashSet<String> = prune_edges.iter().cloned().collect();

    let mut ancestors = HashSet::new();
    ancestors.insert(root_table.to_string());

    let node = expand(schema, root, &include, &prune, &mut ancestors);
    Ok(SchemaGraph { root: node })
}

/// One candidate attachment before label assignment: the table being
/// attached and the foreign key forming the join predicate.
struct Attachment {
    target: Table,
    fk: ForeignKey,
}

fn expand(
    schema: &SchemaSet,
    table: &Table,
    include: &HashSet<String>,
    prune: &HashSet<String>,
    ancestors: &mut HashSet<String>,
) -> GraphNode {
    let mut children = Vec::new();

    // Outbound FKs: one-edges to lookup tables. Not expanded further.
    let mut one_attachments: Vec<Attachment> = table
        .foreign_keys
        .iter()
        .filter(|fk| include.contains(&fk.to_table))
        .filter_map(|fk| {
            schema
                .table(&fk.to_table)
                .map(|target| Attachment {
                    target: target.clone(),
                    fk: fk.clone(),
                })
        })
        .collect();
    one_attachments.sort_by_key(|a| a.fk.from_columns.join(","));

    let one_labels = assign_labels(one_attachments.iter().map(|a| a.target.qualified_name.as_str()));

    for (attachment, label) in one_attachments.into_iter().zip(one_labels.into_iter()) {
        if ancestors.contains(&attachment.target.qualified_name) {
            continue; // cycle rule: drop an edge back to an ancestor.
        }
        if prune.contains(&format!("{}.{}", table.qualified_name, label)) {
            continue;
        }
        let edge = RelationEdge {
            parent_table: table.qualified_name.clone(),
            child_table: attachment.target.qualified_name.clone(),
            // `join_predicate` is always "this edge's own node's column" first,
            // "parent's column" second (the convention `render_join_condition`
            // relies on). For an outbound FK the FK's own `from_table` is the
            // *parent*, so the pair must be flipped relative to `zip_columns`'
            // raw from/to order — the lookup's (`to_table`'s) column comes first.
            join_predicate: zip_columns_reversed(&attachment.fk),
            kind: EdgeKind::One,
            label,
        };
        let leaf = GraphNode {
            table: attachment.target.qualified_name.clone(),
            children: Vec::new(),
        };
        children.push((edge, leaf));
    }

    // Inbound FKs: many-edges to child tables. Expanded recursively.
    let mut many_attachments: Vec<Attachment> = schema
        .inbound_foreign_keys(&table.qualified_name)
        .filter(|(t, _)| include.contains(&t.qualified_name))
        .map(|(t, fk)| Attachment {
            target: t.clone(),
            fk: fk.clone(),
        })
        .collect();
    many_attachments
        .sort_by_key(|a| (a.target.qualified_name.clone(), a.fk.from_columns.join(",")));

    let many_labels =
        assign_labels(many_attachments.iter().map(|a| a.target.qualified_name.as_str()));

    for (attachment, label) in many_attachments.into_iter().zip(many_labels.into_iter()) {
        if ancestors.contains(&attachment.target.qualified_name) {
            continue; // root (or any ancestor) may not reappear.
        }
        if prune.contains(&format!("{}.{}", table.qualified_name, label)) {
            continue;
        }
        let edge = RelationEdge {
            parent_table: table.qualified_name.clone(),
            child_table: attachment.target.qualified_name.clone(),
            join_predicate: zip_columns(&attachment.fk),
            kind: EdgeKind::Many,
            label,
        };
        ancestors.insert(attachment.target.qualified_name.clone());
        let subtree = expand(schema, &attachment.target, include, prune, ancestors);
        ancestors.remove(&attachment.target.qualified_name);
        children.push((edge, subtree));
    }

    GraphNode {
        table: table.qualified_name.clone(),
        children,
    }
}

fn zip_columns(fk: &ForeignKey) -> Vec<(String, String)> {
    fk.from_columns
        .iter()
        .cloned()
        .zip(fk.to_columns.iter().cloned())
        .collect()
}

/// Same pairing as `zip_columns`, but with each pair flipped: the FK's
/// `to_columns` (the lookup table's referenced columns) come first, its
/// `from_columns` (the parent's referencing columns) second. Used for
/// one-edges, where the FK's own `from_table`/`to_table` orientation is
/// parent-to-child rather than child-to-parent.
fn zip_columns_reversed(fk: &ForeignKey) -> Vec<(String, String)> {
    fk.to_columns
        .iter()
        .cloned()
        .zip(fk.from_columns.iter().cloned())
        .collect()
}

/// §4.2's label collision rule: when the same target table is attached more
/// than once from the same parent (via different FK columns), labels are
/// suffixed `<table>`, `<table>__2`, … The caller has already sorted
/// attachments by FK column name, so repeats here are encountered in that
/// order.
fn assign_labels<'a>(targets: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    targets
        .map(|target| {
            let count = seen.entry(target).or_insert(0);
            *count += 1;
            if *count == 1 {
                target.to_string()
            } else {
                format!("{target}__{count}")
            }
        })
        .collect()
}
