//! Backend for translating a selection graph into one flat SQL SELECT.

mod gen_query;
pub mod operators;

pub use operators::{
    add_sql_operators, add_sql_relation_operators, default_operators, default_relation_operators,
    Operator, OperatorSet,
};

use std::ops::Range;

use indexmap::IndexMap;
use serde_json::Value;

use nestql_parser::{Graph, NodeId};

use crate::Result;

/// Per-node compile output: where the node's columns live within the flat
/// projection, and how the node relates to its parent.
#[derive(Debug, Clone)]
pub struct TableInfo {
    /// SQL table alias of the node.
    pub alias: String,
    pub parent_alias: Option<String>,
    /// Table name as written in the query.
    pub name: String,
    pub parent_name: Option<String>,
    /// Scalar field names, in declaration order.
    pub columns: Vec<String>,
    /// The node's slice of the flat projection.
    pub cols: Range<usize>,
    pub node: NodeId,
}

/// A compiled SELECT: its text, the per-table column metadata needed to slice
/// result rows, and (after execution) the flat rows themselves.
#[derive(Debug)]
pub struct Statement {
    pub query: String,
    /// Table metadata keyed by table name. A name selected twice keeps the
    /// later node's entry.
    pub tables: IndexMap<String, TableInfo>,
    /// Width of the flat projection.
    pub columns: usize,
    pub data: Vec<Vec<Value>>,
    pub graph: Graph,
}

/// Compiles a selection graph using the default operator registries.
pub fn compile(graph: Graph) -> Result<Statement> {
    compile_with(graph, default_operators(), default_relation_operators())
}

/// Compiles a selection graph against explicit operator registries.
pub fn compile_with(
    graph: Graph,
    templates: &OperatorSet,
    relations: &OperatorSet,
) -> Result<Statement> {
    gen_query::compile(graph, templates, relations)
}
