//! Re-assembles a statement's flat rows into a nested document shaped like
//! the source query.

use serde_json::{Map, Value};

use crate::sql::Statement;

/// Projects each flat row into per-node sub-documents using the column
/// ranges recorded at compile time, stitches child documents into their
/// parents, and emits `{root_name: [...]}`.
///
/// Pairing between parent and child documents is positional: the flat
/// cross-product yields one document per node per row, so the lists always
/// line up, but 1-to-many joins repeat the parent rather than grouping its
/// children.
pub fn assemble(stmt: Statement) -> Value {
    let Statement {
        tables,
        data,
        mut graph,
        ..
    } = stmt;

    for row in &data {
        for info in tables.values() {
            let mut section = Map::new();
            for (index, col) in info.cols.clone().enumerate() {
                let cell = row.get(col).cloned().unwrap_or(Value::Null);
                section.insert(info.columns[index].clone(), cell);
            }
            graph.node_mut(info.node).result.push(section);
        }
    }

    // walk up from the leaves so every sub-document is complete before it is
    // attached to its parent
    for id in graph.breadth_first().into_iter().rev() {
        let node = graph.node(id);
        let (Some(parent_key), name) = (node.parent_key.clone(), node.name.clone()) else {
            continue;
        };
        let Some(parent) = graph.get(&parent_key) else {
            continue;
        };

        let sections = std::mem::take(&mut graph.node_mut(id).result);
        let parent_sections = &mut graph.node_mut(parent).result;
        for (target, section) in parent_sections.iter_mut().zip(sections) {
            target.insert(name.clone(), Value::Object(section));
        }
    }

    let mut tree = Map::new();
    if let Some(root) = graph.root() {
        let node = graph.node_mut(root);
        let sections = std::mem::take(&mut node.result);
        tree.insert(
            node.name.clone(),
            Value::Array(sections.into_iter().map(Value::Object).collect()),
        );
    }
    Value::Object(tree)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::sql::compile;
    use nestql_parser::parse_source;

    fn statement_with_rows(source: &str, rows: Vec<Vec<Value>>) -> Statement {
        let mut stmt = compile(parse_source(source).unwrap()).unwrap();
        stmt.data = rows;
        stmt
    }

    #[test]
    fn test_flat_rows_become_documents() {
        let stmt = statement_with_rows(
            "user(){id,name}",
            vec![
                vec![json!(1), json!("alex")],
                vec![json!(2), json!("josh")],
            ],
        );
        assert_eq!(
            assemble(stmt),
            json!({"user": [{"id": 1, "name": "alex"}, {"id": 2, "name": "josh"}]})
        );
    }

    #[test]
    fn test_children_nest_under_parents() {
        let stmt = statement_with_rows(
            "user(){id,photos(with:[user_id id]){url}}",
            vec![
                vec![json!(1), json!("winnie.jpg")],
                vec![json!(2), json!("sock.jpg")],
            ],
        );
        assert_eq!(
            assemble(stmt),
            json!({"user": [
                {"id": 1, "photos": {"url": "winnie.jpg"}},
                {"id": 2, "photos": {"url": "sock.jpg"}},
            ]})
        );
    }

    #[test]
    fn test_grandchildren_arrive_complete() {
        let stmt = statement_with_rows(
            "user(){id,photos(with:[user_id id]){url,tags(with:[photo_id id]){label}}}",
            vec![vec![json!(1), json!("winnie.jpg"), json!("cute")]],
        );
        assert_eq!(
            assemble(stmt),
            json!({"user": [
                {"id": 1, "photos": {"url": "winnie.jpg", "tags": {"label": "cute"}}},
            ]})
        );
    }

    #[test]
    fn test_no_rows_yields_empty_list() {
        let stmt = statement_with_rows("user(){id}", vec![]);
        assert_eq!(assemble(stmt), json!({"user": []}));
    }
}
