//! Update reconciler tests
//!
//! Change-set views over editor payloads, lossless round-tripping and the
//! derived delta.

#[cfg(test)]
mod update_tests {
    use serde_json::{json, Value};

    use crate::tests::example_blocks::registry;
    use crate::update::{UpdateError, UpdateRequest};
    use crate::{BlockEngine, Error};

    fn payload() -> Value {
        json!({
            "blocks": {
                "s1": {"id": "s1", "type": "section", "children": ["c1"]},
                "c1": {"id": "c1", "type": "acme-card", "parentId": "s1", "children": ["t1"]},
                "t1": {"id": "t1", "type": "text", "parentId": "c1", "properties": {"content": "Hi"}},
                "t9": {"id": "t9", "type": "text", "properties": {"content": "Loose"}}
            },
            "regions": [{"name": "main", "blocks": ["s1", "t9"], "locked": false}],
            "changes": {
                "added": ["t1"],
                "updated": ["c1", "t1"],
                "removed": ["gone"],
                "moved": {"t9": {"parent": null, "index": 1}}
            },
            "version": 7
        })
    }

    /// Duplicates collapse across categories.
    #[test]
    fn test_changed_blocks_is_deduplicated_union() {
        let request = UpdateRequest::from_json(json!({
            "changes": {
                "added": ["a"],
                "updated": ["b"],
                "removed": ["a"],
                "moved": {"c": {"index": 0}}
            }
        }))
        .unwrap();
        assert_eq!(request.changed_blocks(), vec!["a", "b", "c"]);
        assert!(request.has_changes());
        assert_eq!(request.moved_ids(), vec!["c"]);
    }

    #[test]
    fn test_no_changes() {
        let request = UpdateRequest::from_json(json!({
            "blocks": {},
            "regions": [],
            "changes": {"added": [], "updated": [], "removed": [], "moved": {}}
        }))
        .unwrap();
        assert!(request.changed_blocks().is_empty());
        assert!(!request.has_changes());

        let empty = UpdateRequest::from_json(json!({})).unwrap();
        assert!(!empty.has_changes());
    }

    #[test]
    fn test_accessors() {
        let request = UpdateRequest::from_json(payload()).unwrap();
        assert_eq!(request.added(), ["t1"]);
        assert_eq!(request.updated(), ["c1", "t1"]);
        assert_eq!(request.removed(), ["gone"]);
        assert_eq!(request.moved()["t9"], json!({"parent": null, "index": 1}));
    }

    /// Unknown fields on the payload, its records and its regions survive.
    #[test]
    fn test_round_trip_is_lossless() {
        let original = payload();
        let request = UpdateRequest::from_json(original.clone()).unwrap();
        assert_eq!(request.to_json(), original);

        let again = UpdateRequest::from_json(request.to_json()).unwrap();
        assert_eq!(again.to_json(), request.to_json());
    }

    #[test]
    fn test_upserts_skip_removed_and_duplicates() {
        let request = UpdateRequest::from_json(json!({
            "blocks": {
                "a": {"type": "text"},
                "b": {"id": "b", "type": "text"}
            },
            "changes": {"added": ["a", "b"], "updated": ["a"], "removed": ["b"]}
        }))
        .unwrap();

        let upserts = request.upserts().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].id, "a");
        assert_eq!(request.removals(), vec!["b"]);
    }

    #[test]
    fn test_upsert_of_unknown_block_fails() {
        let request = UpdateRequest::from_json(json!({
            "changes": {"updated": ["ghost"]}
        }))
        .unwrap();
        assert_eq!(
            request.upserts().unwrap_err(),
            UpdateError::MissingBlock("ghost".into())
        );
    }

    #[test]
    fn test_invalid_snapshot_records_are_rejected() {
        let err = UpdateRequest::from_json(json!({
            "blocks": {"a": {"properties": {}}}
        }))
        .unwrap_err();
        assert!(matches!(err, UpdateError::InvalidBlock { id, .. } if id == "a"));

        assert!(matches!(
            UpdateRequest::from_json(json!({"changes": {"added": "a"}})),
            Err(UpdateError::Malformed(_))
        ));
    }

    /// Affected blocks include every ancestor of a changed block.
    #[test]
    fn test_affected_blocks_include_ancestors() {
        let request = UpdateRequest::from_json(json!({
            "blocks": payload()["blocks"].clone(),
            "changes": {"updated": ["t1"], "moved": {"t9": 0}}
        }))
        .unwrap();
        assert_eq!(request.affected_blocks(), vec!["t1", "c1", "s1", "t9"]);
    }

    #[test]
    fn test_snapshot_document_is_validated() {
        let request = UpdateRequest::from_json(payload()).unwrap();
        let document = request.document().unwrap();
        assert_eq!(document.len(), 4);
        assert_eq!(document.region("main").unwrap().blocks, vec!["s1", "t9"]);

        let broken = UpdateRequest::from_json(json!({
            "blocks": {"a": {"type": "text", "parentId": "ghost"}}
        }))
        .unwrap();
        assert!(matches!(broken.document(), Err(UpdateError::Document(_))));
    }

    #[test]
    fn test_engine_reconcile_checks_block_types() {
        let engine = BlockEngine::builder()
            .registry(registry())
            .builtin_blocks(false)
            .build()
            .unwrap();

        let delta = engine.reconcile(&UpdateRequest::from_json(payload()).unwrap()).unwrap();
        let ids: Vec<&str> = delta.upserts.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "c1"]);
        assert_eq!(delta.removals, vec!["gone"]);
        assert_eq!(delta.affected, vec!["t1", "c1", "s1", "gone", "t9"]);

        let unknown = UpdateRequest::from_json(json!({
            "blocks": {"x": {"type": "carousel"}},
            "changes": {"added": ["x"]}
        }))
        .unwrap();
        assert!(matches!(engine.reconcile(&unknown), Err(Error::Schema(_))));
    }
}
