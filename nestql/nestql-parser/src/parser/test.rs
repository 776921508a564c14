use similar_asserts::assert_eq;

use super::gr::NodeKind;
use crate::{parse_source, InspectorSet, Parser};

#[test]
fn test_minimal_root() {
    let graph = parse_source("user(id:4){name,age}").unwrap();
    assert_eq!(graph.len(), 1);

    let root = graph.node(graph.root().unwrap());
    assert_eq!(root.name, "user");
    assert_eq!(root.key, "t0");
    assert_eq!(root.kind, NodeKind::Root);
    assert_eq!(root.parent_name, None);
    assert_eq!(root.parent_key, None);

    assert_eq!(root.records.keys().collect::<Vec<_>>(), vec!["name", "age"]);
    assert!(root.records.get("name").unwrap().is_empty());

    let id = &root.rules.get("id").unwrap()[0];
    assert_eq!(id.kind(), "is");
    assert_eq!(id.get("value").unwrap().as_str(), Some("4"));
}

#[test]
fn test_root_without_args() {
    let graph = parse_source("user(){name}").unwrap();
    let root = graph.node(graph.root().unwrap());
    assert!(root.rules.is_empty());
    assert_eq!(root.records.keys().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn test_nested_selection() {
    let graph = parse_source("user(){id,photos(with:[user_id id]){url}}").unwrap();
    assert_eq!(graph.len(), 2);

    let root_id = graph.root().unwrap();
    let root = graph.node(root_id);
    assert_eq!(root.children().len(), 1);

    let photos = graph.node(root.children()[0]);
    assert_eq!(photos.name, "photos");
    assert_eq!(photos.key, "t1");
    assert_eq!(photos.kind, NodeKind::SubRoot);
    assert_eq!(photos.parent_name.as_deref(), Some("user"));
    assert_eq!(photos.parent_key.as_deref(), Some("t0"));
    assert_eq!(photos.records.keys().collect::<Vec<_>>(), vec!["url"]);

    let with = &photos.rules.get("with").unwrap()[0];
    assert_eq!(with.kind(), "with");
    assert_eq!(
        with.get("value").unwrap(),
        &serde_json::json!(["user_id", "id"])
    );

    // parent keeps its own scalar fields only
    assert_eq!(root.records.keys().collect::<Vec<_>>(), vec!["id"]);
}

#[test]
fn test_nested_selection_with_space_before_body() {
    let graph = parse_source("user(){id, photos(with:[user_id id]) {url}}").unwrap();
    let photos = graph.node(graph.node(graph.root().unwrap()).children()[0]);
    // the argument list survives the rewind across the interleaved whitespace
    assert!(photos.rules.has("with"));
}

#[test]
fn test_repeated_names_get_distinct_keys() {
    let graph =
        parse_source("user(){id,friend(with:[id id]){id},rival(with:[id id]){id}}").unwrap();
    let keys: Vec<_> = graph.ids().map(|id| graph.node(id).key.clone()).collect();
    assert_eq!(keys, vec!["t0", "t1", "t2"]);

    assert_eq!(graph.get("t1"), graph.find_by_name("friend"));
    assert_eq!(graph.get("nope"), None);
}

#[test]
fn test_record_conditions() {
    let graph = parse_source("user(){age(lt:30, gte:40), age(is: 20), day(isnot: wednesday)}")
        .unwrap();
    let root = graph.node(graph.root().unwrap());

    // repeated clauses on one field accumulate under a single column
    assert_eq!(root.records.keys().collect::<Vec<_>>(), vec!["age", "day"]);
    let kinds: Vec<_> = root
        .records
        .get("age")
        .unwrap()
        .iter()
        .map(|c| c.kind().to_string())
        .collect();
    assert_eq!(kinds, vec!["lt", "gte", "is"]);

    let day = &root.records.get("day").unwrap()[0];
    assert_eq!(day.kind(), "isnot");
    assert_eq!(day.get("value").unwrap().as_str(), Some("wednesday"));
}

#[test]
fn test_unknown_field_tag_falls_back_to_is() {
    let graph = parse_source("user(){photos(width: 400)}").unwrap();
    let root = graph.node(graph.root().unwrap());
    let photos = &root.records.get("photos").unwrap()[0];
    assert_eq!(photos.kind(), "is");
    assert_eq!(photos.get("value").unwrap().as_str(), Some("400"));
}

#[test]
fn test_unknown_rule_tag_becomes_literal_is() {
    let graph = parse_source("user(foo: bar){name}").unwrap();
    let root = graph.node(graph.root().unwrap());
    let foo = &root.rules.get("foo").unwrap()[0];
    assert_eq!(foo.kind(), "is");
    assert_eq!(foo.get("value").unwrap().as_str(), Some("bar"));
}

#[test]
fn test_bare_attrs() {
    let graph = parse_source("admin(id:4, rack, shared){name}").unwrap();
    let root = graph.node(graph.root().unwrap());
    assert_eq!(root.attrs, vec!["rack", "shared"]);
    assert!(root.rules.has("id"));
}

#[test]
fn test_rule_tags_are_lowercased() {
    let graph = parse_source("user(ID: 4){name}").unwrap();
    let root = graph.node(graph.root().unwrap());
    assert!(root.rules.has("id"));
}

#[test]
fn test_field_after_group_end_lands_in_parent() {
    let graph = parse_source("user(){photos(with:[user_id id]){url(is: x)}, name}").unwrap();
    let root = graph.node(graph.root().unwrap());
    assert_eq!(root.records.keys().collect::<Vec<_>>(), vec!["name"]);
    let photos = graph.node(root.children()[0]);
    assert_eq!(photos.records.keys().collect::<Vec<_>>(), vec!["url"]);
}

#[test]
fn test_bad_start_errors() {
    let err = parse_source("{user}").unwrap_err();
    assert_eq!(err.code(), "E0002");

    let err = parse_source("user(id:4) name").unwrap_err();
    assert_eq!(err.code(), "E0002");
}

#[test]
fn test_keyless_field_argument_part_errors() {
    let err = parse_source("user(){age(30)}").unwrap_err();
    assert_eq!(err.code(), "E0003");
}

#[test]
fn test_numeric_rule_errors() {
    let err = parse_source("user(id: four){name}").unwrap_err();
    assert_eq!(err.code(), "E0004");
    assert!(err.span.is_some());
}

#[test]
fn test_unterminated_argument_list_errors() {
    let err = parse_source("user(){age(lt:30}").unwrap_err();
    assert_eq!(err.code(), "E0001");
}

#[test]
fn test_custom_inspector_set() {
    let set = InspectorSet::new();
    crate::add_default_inspections(&set);
    set.register("near", |data| {
        let mut cond = crate::Collector::of_kind("near");
        cond.set("value", data.trim());
        Ok(cond)
    });

    let parser = Parser::new(&set);
    let graph = parser.scan("user(near: lagos){name}".as_bytes()).unwrap();
    let near = &graph.node(graph.root().unwrap()).rules.get("near").unwrap()[0];
    assert_eq!(near.kind(), "near");
}

#[test]
fn test_graph_serializes() {
    let graph = parse_source("user(id:4){name,photos(with:[user_id id]){url}}").unwrap();
    let value = serde_json::to_value(&graph).unwrap();
    let nodes = value["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["name"], "user");
    assert_eq!(nodes[0]["rules"]["id"][0]["type"], "is");
    assert_eq!(nodes[1]["kind"], "SubRoot");
}

#[test]
fn test_traversal_orders() {
    let graph = parse_source(
        "user(){id,photos(with:[user_id id]){url,tags(with:[photo_id id]){label}},posts(with:[user_id id]){title}}",
    )
    .unwrap();
    let names = |ids: Vec<crate::NodeId>| {
        ids.into_iter()
            .map(|id| graph.node(id).name.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(
        names(graph.depth_first()),
        vec!["user", "photos", "tags", "posts"]
    );
    assert_eq!(
        names(graph.breadth_first()),
        vec!["user", "photos", "posts", "tags"]
    );
}
