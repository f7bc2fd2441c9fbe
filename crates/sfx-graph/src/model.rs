#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Outbound FK: a parent lookup. The target is attached as a leaf and
    /// never re-expanded.
    One,
    /// Inbound FK: a child collection. The target is expanded recursively.
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEdge {
    pub parent_table: String,
    pub child_table: String,
    /// Column pairs `(parent_column, child_column)` forming the join predicate.
    pub join_predicate: Vec<(String, String)>,
    pub kind: EdgeKind,
    /// Unique among siblings of `parent_table` (§4.2's label collision rule).
    pub label: String,
}

/// A node of the rooted tree: the table it represents, plus its outgoing
/// edges in deterministic order (one-edges then many-edges, each group
/// ordered by label).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub table: String,
    pub children: Vec<(RelationEdge, GraphNode)>,
}

impl GraphNode {
    pub fn one_children(&self) -> impl Iterator<Item = (&RelationEdge, &GraphNode)> {
        self.children
            .iter()
            .filter(|(e, _)| e.kind == EdgeKind::One)
            .map(|(e, n)| (e, n))
    }

    pub fn many_children(&self) -> impl Iterator<Item = (&RelationEdge, &GraphNode)> {
        self.children
            .iter()
            .filter(|(e, _)| e.kind == EdgeKind::Many)
            .map(|(e, n)| (e, n))
    }
}

/// Rooted tree over `RelationEdge`s (§3). The Schema Graph Builder's
/// invariant — no node reachable from root by two distinct paths — is
/// enforced by construction: this is a tree, not a general graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaGraph {
    pub root: GraphNode,
}

impl SchemaGraph {
    /// The ordered sequence of labels from root to `node`, used to build a
    /// `PathId` (§3). Not used internally by the builder, but handed to the
    /// SQL Generator and Document Reconstructor to identify branches.
    pub fn many_nodes_preorder(&self) -> Vec<PathId> {
        let mut out = Vec::new();
        Self::walk_many(&self.root, &mut Vec::new(), &mut out);
        out
    }

    fn walk_many(node: &GraphNode, prefix: &mut Vec<String>, out: &mut Vec<PathId>) {
        for (edge, child) in node.many_children() {
            prefix.push(edge.label.clone());
            out.push(PathId(prefix.clone()));
            Self::walk_many(child, prefix, out);
            prefix.pop();
        }
    }
}

/// Ordered sequence of edge labels from root to a node; uniquely identifies
/// a branch (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathId(pub Vec<String>);

impl PathId {
    pub fn root() -> Self {
        PathId(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}
