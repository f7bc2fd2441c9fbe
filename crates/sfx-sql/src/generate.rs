use sfx_graph::SchemaGraph;
use sfx_schema::SchemaSet;

use crate::dialect::Dialect;
use crate::plan::{build_plan, Plan, PlanNode};

/// One `(PathId, table, column) -> slot_index` entry of the global
/// projection (§3). `slot_index` is this entry's position in `Projection::slots`.
#[derive(Debug, Clone)]
pub struct Slot {
    pub path: sfx_graph::PathId,
    pub table: String,
    pub column: String,
}

/// The global, branch-shared column layout: `slots[i]` describes `c{i}`.
#[derive(Debug, Clone)]
pub struct Projection {
    pub slots: Vec<Slot>,
}

impl Projection {
    pub fn width(&self) -> usize {
        self.slots.len()
    }
}

/// The rendered extraction query, parameterized by a driver sub-query. The
/// template contains exactly one `{{DRIVER}}` placeholder (§3/§4.3).
#[derive(Debug, Clone)]
pub struct CanonicalSql {
    template: String,
}

/// The literal trivial driver used to compute the Schema Fingerprint (§4.7)
/// and in the E1 byte-equality scenario: a single, always-present root id.
pub const FINGERPRINT_DRIVER: &str = "SELECT 0 AS id";

impl CanonicalSql {
    pub fn render(&self, driver_sql: &str) -> String {
        self.template.replace("{{DRIVER}}", driver_sql)
    }

    /// The byte-stable Schema Fingerprint: the canonical SQL rendered with
    /// the trivial driver, stripped of insignificant whitespace so that
    /// formatting changes in this generator don't look like schema drift.
    pub fn fingerprint(&self) -> String {
        normalize_whitespace(&self.render(FINGERPRINT_DRIVER))
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

/// Collapses runs of whitespace to a single space and trims ends, so textual
/// comparisons (fingerprinting, the E1 scenario) are insensitive to
/// incidental formatting.
pub fn normalize_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Produces the CanonicalSQL and its Projection for a schema graph (§4.3).
pub fn generate_sql(
    schema: &SchemaSet,
    graph: &SchemaGraph,
    dialect: &dyn Dialect,
) -> (CanonicalSql, Projection) {
    let plan = build_plan(schema, graph);
    let width = plan.width;

    let branches = plan.branch_nodes();
    let branch_selects: Vec<String> = branches
        .iter()
        .map(|branch| render_branch(&plan, branch, width, dialect))
        .collect();

    let order_by = render_order_by(&plan, &branches, dialect);

    let template = format!(
        "SELECT * FROM ({}) AS u ORDER BY {}",
        branch_selects.join(" UNION ALL "),
        order_by
    );

    let projection = Projection {
        slots: plan
            .nodes
            .iter()
            .flat_map(|n| {
                n.columns.iter().map(move |c| Slot {
                    path: n.path.clone(),
                    table: n.table.clone(),
                    column: c.clone(),
                })
            })
            .collect(),
    };

    (CanonicalSql { template }, projection)
}

/// Every plan node that is on `branch`'s spine (ancestor-or-self), or is an
/// immediate one-edge child of a spine node: exactly the set of nodes whose
/// columns are projected as real values for this branch (§4.3 step 3).
fn spine_and_lookups<'a>(plan: &'a Plan, branch: &'a PlanNode) -> Vec<&'a PlanNode> {
    let spine = plan.spine_of(branch);
    let mut real = spine.clone();
    for s in &spine {
        real.extend(plan.one_children_of(&s.alias));
    }
    real
}

fn render_branch(plan: &Plan, branch: &PlanNode, width: usize, dialect: &dyn Dialect) -> String {
    let real_nodes = spine_and_lookups(plan, branch);
    let real_aliases: std::collections::HashSet<&str> =
        real_nodes.iter().map(|n| n.alias.as_str()).collect();

    let mut select_list = Vec::with_capacity(width);
    for node in &plan.nodes {
        for col in &node.columns {
            if real_aliases.contains(node.alias.as_str()) {
                select_list.push(format!(
                    "{}.{} AS c{}",
                    node.alias,
                    dialect.quote_ident(col),
                    select_list.len()
                ));
            } else {
                select_list.push(format!("NULL AS c{}", select_list.len()));
            }
        }
    }
    debug_assert_eq!(select_list.len(), width);

    let root = &plan.nodes[0];
    let root_pk = root
        .primary_key
        .first()
        .expect("root table must have a primary key");
    let mut from_clause = format!(
        "FROM ({{{{DRIVER}}}}) AS t0 LEFT JOIN {} AS {} ON {}.{} = t0.{}",
        dialect.quote_ident(&root.table),
        root.alias,
        root.alias,
        dialect.quote_ident(root_pk),
        dialect.quote_ident("id"),
    );

    let spine = plan.spine_of(branch);
    for (i, node) in spine.iter().enumerate().skip(1) {
        let join_kind = if i == spine.len() - 1 { "JOIN" } else { "LEFT JOIN" };
        let parent = &spine[i - 1];
        from_clause.push_str(&format!(
            " {} {} AS {} ON {}",
            join_kind,
            dialect.quote_ident(&node.table),
            node.alias,
            render_join_condition(node, parent.alias.as_str(), dialect),
        ));
    }

    // Lookup (one-edge) joins for every spine node's immediate one-children.
    for s in &spine {
        for lookup in plan.one_children_of(&s.alias) {
            from_clause.push_str(&format!(
                " LEFT JOIN {} AS {} ON {}",
                dialect.quote_ident(&lookup.table),
                lookup.alias,
                render_join_condition(lookup, s.alias.as_str(), dialect),
            ));
        }
    }

    format!("SELECT {} {}", select_list.join(", "), from_clause)
}

fn render_join_condition(node: &PlanNode, parent_alias: &str, dialect: &dyn Dialect) -> String {
    node.join_predicate
        .iter()
        .map(|(from_col, to_col)| {
            format!(
                "{}.{} = {}.{}",
                node.alias,
                dialect.quote_ident(from_col),
                parent_alias,
                dialect.quote_ident(to_col),
            )
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// §4.3 step 5: order by, for each branch node's primary-key slot(s) in
/// tree pre-order, the tuple `(slot IS NOT NULL, slot)`.
fn render_order_by(plan: &Plan, branches: &[&PlanNode], dialect: &dyn Dialect) -> String {
    let _ = dialect;
    let mut terms = Vec::new();
    for node in branches {
        for slot in node.pk_slots() {
            terms.push(format!("(u.c{slot} IS NOT NULL)"));
            terms.push(format!("u.c{slot}"));
        }
    }
    terms.join(", ")
}
