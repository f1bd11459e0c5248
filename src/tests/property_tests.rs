//! Property-based tests using proptest.
//!
//! These tests verify invariants that must hold for *any* input, catching
//! edge cases that hand-written tests miss.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use crate::core::generate_child_id;
use crate::core::schema::BlockSchema;
use crate::runtime::RenderMode;
use crate::tests::example_blocks::BrokenBlock;
use crate::transform::dynamic::DynamicSource;
use crate::transform::node::TemplateNode;
use crate::transform::property::PropertyTransformers;
use crate::update::UpdateRequest;
use crate::BlockEngine;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

/// Arbitrary JSON without floats; object keys never collide with the
/// dynamic source marker.
fn json_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn properties() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,8}", json_value(), 0..6)
        .prop_map(|m| m.into_iter().collect())
}

fn dot_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,5}", 1..4).prop_map(|segments| segments.join("."))
}

/// Ids from a tiny alphabet so change sets overlap often
fn ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]", 0..6)
}

fn nested(path: &str, leaf: Value) -> Value {
    path.rsplit('.').fold(leaf, |value, segment| {
        let mut object = Map::new();
        object.insert(segment.to_string(), value);
        Value::Object(object)
    })
}

fn untyped_schema() -> BlockSchema {
    BlockSchema::from_handler(Arc::new(BrokenBlock)).unwrap()
}

// ---------------------------------------------------------------------------
// Property transformers
// ---------------------------------------------------------------------------

proptest! {
    /// Values that are not dynamic sources and have no bound transformer
    /// come back unchanged.
    #[test]
    fn plain_values_are_left_untouched(props in properties()) {
        let resolved = PropertyTransformers::with_defaults()
            .apply_all(&props, &untyped_schema())
            .unwrap();
        prop_assert_eq!(resolved, props);
    }

    /// A source whose path is absent yields its default and never fails.
    #[test]
    fn missing_paths_fall_back_to_default(path in dot_path(), default in json_value()) {
        let source = DynamicSource::new(path, "text", json!({})).with_default(default.clone());
        prop_assert_eq!(source.resolve(), default.clone());

        let mut props = Map::new();
        props.insert("value".into(), source.to_value());
        let resolved = PropertyTransformers::new()
            .apply_all(&props, &untyped_schema())
            .unwrap();
        prop_assert_eq!(&resolved["value"], &default);
    }

    /// A source whose path is present yields the value at that path.
    #[test]
    fn present_paths_resolve(path in dot_path(), value in "[a-z]{0,8}") {
        let context = nested(&path, json!(value));
        let source = DynamicSource::new(path, "text", context).with_default(json!("fallback"));
        prop_assert_eq!(source.resolve(), json!(value));
    }
}

// ---------------------------------------------------------------------------
// Child ids
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn child_ids_are_deterministic(parent in ".{0,16}", local in ".{0,16}") {
        let id = generate_child_id(&parent, &local);
        prop_assert_eq!(&id, &generate_child_id(&parent, &local));
        prop_assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    /// Shifting characters between the parent and local id changes the result.
    #[test]
    fn child_ids_are_distinct(
        a in ("[a-z0-9-]{0,8}", "[a-z0-9-]{0,8}"),
        b in ("[a-z0-9-]{0,8}", "[a-z0-9-]{0,8}"),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(generate_child_id(&a.0, &a.1), generate_child_id(&b.0, &b.1));
    }
}

// ---------------------------------------------------------------------------
// Update requests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn changed_blocks_is_the_deduplicated_union(
        added in ids(),
        updated in ids(),
        removed in ids(),
        moved in ids(),
    ) {
        let moved_map: Map<String, Value> =
            moved.iter().map(|id| (id.clone(), json!({"index": 0}))).collect();
        let request = UpdateRequest::from_json(json!({
            "changes": {
                "added": added,
                "updated": updated,
                "removed": removed,
                "moved": moved_map,
            }
        }))
        .unwrap();

        let mut expected: Vec<String> = Vec::new();
        for id in added.iter().chain(&updated).chain(&removed).chain(&moved) {
            if !expected.contains(id) {
                expected.push(id.clone());
            }
        }
        prop_assert_eq!(request.has_changes(), !expected.is_empty());
        prop_assert_eq!(request.changed_blocks(), expected);
    }

    /// `from_json(x).to_json() == x` for payloads carrying unknown fields.
    #[test]
    fn update_payloads_round_trip(
        blocks in prop::collection::btree_map("[a-e]", "[a-z ]{0,10}", 0..5),
        added in ids(),
        removed in ids(),
        extra in json_value(),
    ) {
        let snapshot: Map<String, Value> = blocks
            .iter()
            .map(|(id, content)| {
                (id.clone(), json!({
                    "id": id,
                    "type": "text",
                    "properties": {"content": content},
                    "editorState": {"collapsed": false}
                }))
            })
            .collect();
        let ids: Vec<&String> = blocks.keys().collect();
        let payload = json!({
            "blocks": snapshot,
            "regions": [{"name": "main", "blocks": ids}],
            "changes": {
                "added": added,
                "updated": [],
                "removed": removed,
                "moved": {}
            },
            "meta": extra
        });

        let request = UpdateRequest::from_json(payload.clone()).unwrap();
        prop_assert_eq!(request.to_json(), payload);
    }
}

// ---------------------------------------------------------------------------
// Node transformer chain
// ---------------------------------------------------------------------------

proptest! {
    /// Nodes no transformer matches pass through verbatim.
    #[test]
    fn unmatched_nodes_pass_through(text in "[^@<{]{0,40}", tag in "[a-z]{1,6}") {
        let engine = BlockEngine::builder().build().unwrap();
        let nodes = vec![
            TemplateNode::text(text.clone()),
            TemplateNode::element(tag.clone(), vec![TemplateNode::echo("$title")]),
        ];
        let compiled = engine.compile_template(nodes, RenderMode::Live).unwrap();
        prop_assert_eq!(
            compiled.source.as_str(),
            format!("{}<{tag}>{{{{ $title }}}}</{tag}>", text, tag = tag)
        );
    }
}
