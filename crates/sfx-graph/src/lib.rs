//! Relation Graph Builder (§4.2): roots the schema at a fact table and
//! classifies every reachable edge as *one* (outbound FK, a parent lookup)
//! or *many* (inbound FK, a child collection), cutting cycles by rule.

pub mod build;
pub mod model;

pub use build::{build_graph, GraphError};
pub use model::{EdgeKind, GraphNode, PathId, RelationEdge, SchemaGraph};
