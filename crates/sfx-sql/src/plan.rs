use sfx_graph::{EdgeKind, GraphNode, PathId, SchemaGraph};
use sfx_schema::SchemaSet;

/// A flattened, DFS-ordered view of one schema-graph node, carrying exactly
/// what the SQL Generator needs: its table alias, the join back to its
/// parent, and the global slot range its own columns occupy.
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub path: PathId,
    pub table: String,
    pub alias: String,
    pub parent_alias: Option<String>,
    /// `(parent_column, child_column)` pairs forming the join's ON clause;
    /// empty for the root (joined to the driver instead, see `generate.rs`).
    pub join_predicate: Vec<(String, String)>,
    /// `None` for the root; the edge kind that attached this node otherwise.
    pub kind: Option<EdgeKind>,
    pub slot_start: usize,
    pub columns: Vec<String>,
    pub primary_key: Vec<String>,
}

impl PlanNode {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Global slot indices of this node's primary-key columns, in PK order.
    pub fn pk_slots(&self) -> Vec<usize> {
        self.primary_key
            .iter()
            .map(|pk| {
                let offset = self
                    .columns
                    .iter()
                    .position(|c| c == pk)
                    .expect("primary key column must be projected");
                self.slot_start + offset
            })
            .collect()
    }

    pub fn is_many_or_root(&self) -> bool {
        !matches!(self.kind, Some(EdgeKind::One))
    }
}

/// The full DFS-ordered plan plus the global slot width `W = Σ columns(node)`.
pub struct Plan {
    pub nodes: Vec<PlanNode>,
    pub width: usize,
}

impl Plan {
    pub fn by_path(&self, path: &PathId) -> &PlanNode {
        self.nodes
            .iter()
            .find(|n| &n.path == path)
            .expect("path must reference a node in this plan")
    }

    /// Immediate one-edge children of the node with the given alias.
    pub fn one_children_of(&self, alias: &str) -> Vec<&PlanNode> {
        self.nodes
            .iter()
            .filter(|n| n.kind == Some(EdgeKind::One) && n.parent_alias.as_deref() == Some(alias))
            .collect()
    }

    /// Immediate many-edge children of the node with the given alias, in
    /// plan (DFS pre-)order.
    pub fn many_children_of(&self, alias: &str) -> Vec<&PlanNode> {
        self.nodes
            .iter()
            .filter(|n| n.kind == Some(EdgeKind::Many) && n.parent_alias.as_deref() == Some(alias))
            .collect()
    }

    /// Root, plus every node reachable via zero or more many-edges, in DFS
    /// pre-order: exactly the branch set of §3/§4.3.
    pub fn branch_nodes(&self) -> Vec<&PlanNode> {
        self.nodes.iter().filter(|n| n.is_many_or_root()).collect()
    }

    /// The ancestor chain from root to `branch` inclusive (every prefix of
    /// its path has a corresponding plan node, since only many-edges are
    /// ever part of a branch's path).
    pub fn spine_of<'a>(&'a self, branch: &PlanNode) -> Vec<&'a PlanNode> {
        (0..=branch.path.0.len())
            .map(|i| self.by_path(&PathId(branch.path.0[..i].to_vec())))
            .collect()
    }
}

/// Walks the schema graph depth-first, assigning contiguous slot blocks and
/// DFS-ordered table aliases (`t1, t2, …`), per §4.3 step 1.
pub fn build_plan(schema: &SchemaSet, graph: &SchemaGraph) -> Plan {
    let mut nodes = Vec::new();
    let mut alias_counter = 1u32;
    let mut slot_counter = 0usize;
    visit(
        schema,
        &graph.root,
        PathId::root(),
        None,
        Vec::new(),
        None,
        &mut alias_counter,
        &mut slot_counter,
        &mut nodes,
    );
    Plan {
        nodes,
        width: slot_counter,
    }
}

#[allow(clippy::too_many_arguments)]
fn visit(
    schema: &SchemaSet,
    node: &GraphNode,
    path: PathId,
    parent_alias: Option<String>,
    join_predicate: Vec<(String, String)>,
    kind: Option<EdgeKind>,
    alias_counter: &mut u32,
    slot_counter: &mut usize,
    out: &mut Vec<PlanNode>,
) {
    let table = schema
        .table(&node.table)
        .expect("graph node must reference an introspected table");
    let alias = format!("t{alias_counter}");
    *alias_counter += 1;

    let columns: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
    let slot_start = *slot_counter;
    *slot_counter += columns.len();

    out.push(PlanNode {
        path: path.clone(),
        table: node.table.clone(),
        alias: alias.clone(),
        parent_alias,
        join_predicate,
        kind,
        slot_start,
        columns,
        primary_key: table.primary_key.clone(),
    });

    for (edge, child) in &node.children {
        let mut child_path = path.0.clone();
        child_path.push(edge.label.clone());
        visit(
            schema,
            child,
            PathId(child_path),
            Some(alias.clone()),
            edge.join_predicate.clone(),
            Some(edge.kind),
            alias_counter,
            slot_counter,
            out,
        );
    }
}
