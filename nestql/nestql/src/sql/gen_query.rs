//! The graph walk: each selection node becomes an aliased table with its
//! conditions, and the tables render into one flat SELECT.

use indexmap::IndexMap;
use itertools::Itertools;

use nestql_parser::{Annotate, Error, Graph, NodeId, NodeKind, Reason};

use super::operators::{OperatorSet, PARENT_TABLE, RELATION_KEYS, TABLE};
use super::{Statement, TableInfo};
use crate::Result;

const SIMPLE_SELECT: &str = "SELECT {{columns}} FROM {{tables}} WHERE {{clauses}};";

/// One table of the statement under construction.
struct Table {
    name: String,
    alias: String,
    parent_name: Option<String>,
    parent_alias: Option<String>,
    columns: Vec<String>,
    conditions: Vec<String>,
    node: NodeId,
}

pub(super) fn compile(
    mut graph: Graph,
    templates: &OperatorSet,
    relations: &OperatorSet,
) -> Result<Statement> {
    let mut tables = Vec::with_capacity(graph.len());
    for id in graph.depth_first() {
        tables.push(build_table(&mut graph, id, templates, relations)?);
    }
    render(graph, tables)
}

fn build_table(
    graph: &mut Graph,
    id: NodeId,
    templates: &OperatorSet,
    relations: &OperatorSet,
) -> Result<Table> {
    {
        let node = graph.node(id);
        if node.kind == NodeKind::SubRoot && !node.rules.has("with") {
            return Err(Error::new(Reason::MissingRelation {
                child: node.name.clone(),
                parent: node.parent_name.clone().unwrap_or_default(),
            })
            .hint(format!("for example `{}(with: [user_id id])`", node.name)));
        }
    }

    // relation tags resolve against their own registry and leave the rules
    let mut conditions = Vec::new();
    for key in RELATION_KEYS {
        let Some(collectors) = graph.node_mut(id).rules.remove(key) else {
            continue;
        };
        let Some(first) = collectors.first() else {
            continue;
        };
        conditions.extend(relations.process(key, key, first)?);
    }

    let node = graph.node(id);
    for (tag, collector) in node.rules.conditions() {
        conditions.extend(templates.process(collector.kind(), tag, collector)?);
    }

    let columns = node.records.keys().map(String::from).collect_vec();
    for (field, collector) in node.records.conditions() {
        conditions.extend(templates.process(collector.kind(), field, collector)?);
    }

    Ok(Table {
        name: node.name.clone(),
        alias: node.key.clone(),
        parent_name: node.parent_name.clone(),
        parent_alias: node.parent_key.clone(),
        columns,
        conditions,
        node: id,
    })
}

fn render(graph: Graph, tables: Vec<Table>) -> Result<Statement> {
    let mut table_names = Vec::with_capacity(tables.len());
    let mut table_columns = Vec::new();
    let mut table_wheres = Vec::with_capacity(tables.len());
    let mut table_meta = IndexMap::with_capacity(tables.len());

    for table in &tables {
        // "NAME alias" per table in the FROM list
        table_names.push(format!("{} {}", table.name.to_uppercase(), table.alias));

        let begin = table_columns.len();
        table_columns.extend(
            table
                .columns
                .iter()
                .map(|column| format!("{}.{}", table.alias, column)),
        );

        table_meta.insert(
            table.name.clone(),
            TableInfo {
                alias: table.alias.clone(),
                parent_alias: table.parent_alias.clone(),
                name: table.name.clone(),
                parent_name: table.parent_name.clone(),
                columns: table.columns.clone(),
                cols: begin..table_columns.len(),
                node: table.node,
            },
        );

        let clauses = table
            .conditions
            .join("\nAND ")
            .replace(TABLE, &table.alias)
            .replace(PARENT_TABLE, table.parent_alias.as_deref().unwrap_or(""));
        if clauses.contains("{{") {
            return Err(Error::internal(format!(
                "unresolved placeholder in `{clauses}`"
            )));
        }
        table_wheres.push(clauses);
    }

    let table_wheres = table_wheres
        .into_iter()
        .filter(|w| !w.trim().is_empty())
        .collect_vec();

    let query = SIMPLE_SELECT
        .replace("{{columns}}", &table_columns.join(", "))
        .replace("{{tables}}", &table_names.join(", "))
        .replace("{{clauses}}", &table_wheres.join("\nAND "));

    log::debug!("compiled statement: {query}");

    Ok(Statement {
        query,
        columns: table_columns.len(),
        tables: table_meta,
        data: Vec::new(),
        graph,
    })
}
