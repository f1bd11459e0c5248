//! Schema registry tests
//!
//! Registration policies, lookups, accepted children and directory
//! discovery of block manifests.

#[cfg(test)]
mod registry_tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::categories::BlockCategory;
    use crate::core::block::{BlockError, BlockHandler, BlockInstance};
    use crate::core::property::PropertyDefinition;
    use crate::core::registry::{DuplicatePolicy, SchemaRegistry};
    use crate::core::schema::{BlockSchema, SchemaError};
    use crate::tests::example_blocks::{registry, CardBlock};

    struct Named(&'static str);

    impl BlockHandler for Named {
        fn block_type(&self) -> &str {
            self.0
        }

        fn render(&self, _instance: &BlockInstance) -> Result<String, BlockError> {
            Ok(self.0.to_string())
        }
    }

    struct DuplicateKeys;

    impl BlockHandler for DuplicateKeys {
        fn block_type(&self) -> &str {
            "dupe"
        }

        fn properties(&self) -> Vec<PropertyDefinition> {
            vec![
                PropertyDefinition::text("title", ""),
                PropertyDefinition::text("title", "again"),
            ]
        }

        fn render(&self, _instance: &BlockInstance) -> Result<String, BlockError> {
            Ok(String::new())
        }
    }

    /// The schema snapshot carries the handler metadata and derived slug.
    #[test]
    fn test_schema_from_handler() {
        let schema = BlockSchema::from_handler(Arc::new(CardBlock)).unwrap();
        assert_eq!(schema.slug, "acme-card");
        assert_eq!(schema.block_type, "@acme/card");
        assert_eq!(schema.name, "Card");
        assert_eq!(schema.icon, "square");
        assert!(schema.has_wrapper());
        assert_eq!(schema.default_properties()["title"], json!("Untitled"));
    }

    #[test]
    fn test_malformed_schemas_are_rejected() {
        assert!(matches!(
            BlockSchema::from_handler(Arc::new(DuplicateKeys)),
            Err(SchemaError::Malformed { .. })
        ));
        assert!(matches!(
            BlockSchema::from_handler(Arc::new(Named("  "))),
            Err(SchemaError::Malformed { .. })
        ));
    }

    /// Registering the same slug twice fails by default.
    #[test]
    fn test_duplicate_rejected_by_default() {
        let registry = SchemaRegistry::new();
        registry.register_handler(Arc::new(Named("hero"))).unwrap();
        let err = registry.register_handler(Arc::new(Named("hero"))).unwrap_err();
        assert_eq!(err, SchemaError::Duplicate("hero".into()));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_replace_policy_overwrites() {
        let registry = SchemaRegistry::with_policy(DuplicatePolicy::Replace);
        let first = registry.register_handler(Arc::new(Named("hero"))).unwrap();
        let second = registry.register_handler(Arc::new(Named("hero"))).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&registry.get("hero").unwrap(), &second));
    }

    /// Two type strings with the same slug collide under every policy.
    #[test]
    fn test_slug_collision_always_rejected() {
        let registry = SchemaRegistry::with_policy(DuplicatePolicy::Replace);
        registry.register_handler(Arc::new(Named("@acme/hero"))).unwrap();
        let err = registry.register_handler(Arc::new(Named("acme-hero"))).unwrap_err();
        assert_eq!(
            err,
            SchemaError::SlugCollision {
                slug: "acme-hero".into(),
                existing: "@acme/hero".into(),
                incoming: "acme-hero".into(),
            }
        );
    }

    #[test]
    fn test_sealed_registry_is_read_only() {
        let registry = SchemaRegistry::new();
        registry.register_handler(Arc::new(Named("hero"))).unwrap();
        registry.seal();
        assert!(registry.is_sealed());
        assert_eq!(
            registry.register_handler(Arc::new(Named("other"))).unwrap_err(),
            SchemaError::Sealed("other".into())
        );
        assert!(registry.get("hero").is_ok());
    }

    #[test]
    fn test_lookups() {
        let registry = registry();
        assert_eq!(registry.count(), 6);
        assert!(registry.contains("acme-card"));
        assert_eq!(registry.get_by_type("@acme/card").unwrap().slug, "acme-card");
        assert_eq!(registry.resolve("@acme/card").unwrap().slug, "acme-card");
        assert_eq!(
            registry.get("missing").unwrap_err(),
            SchemaError::NotFound("missing".into())
        );

        let slugs: Vec<String> = registry.all().iter().map(|s| s.slug.clone()).collect();
        let mut sorted = slugs.clone();
        sorted.sort();
        assert_eq!(slugs, sorted);

        let layout: Vec<String> = registry
            .by_category(&BlockCategory::Layout)
            .iter()
            .map(|s| s.slug.clone())
            .collect();
        assert_eq!(layout, vec!["columns", "section"]);

        let found: Vec<String> = registry.search("HEAD").iter().map(|s| s.slug.clone()).collect();
        assert_eq!(found, vec!["heading"]);
    }

    #[test]
    fn test_accepts() {
        let registry = registry();
        assert!(registry.accepts("acme-card", "text"));
        assert!(!registry.accepts("acme-card", "columns"));
        assert!(registry.accepts("section", "acme-card"));
        assert!(!registry.accepts("text", "text"));
        assert!(!registry.accepts("unknown", "text"));
    }

    #[test]
    fn test_summaries_serialize_for_editor() {
        let registry = registry();
        let summaries = serde_json::to_value(registry.summaries()).unwrap();
        let card = summaries
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["slug"] == "acme-card")
            .unwrap();
        assert_eq!(card["type"], "@acme/card");
        assert_eq!(card["category"], "Marketing");
        assert_eq!(card["accepts"], json!(["text", "heading"]));
        assert_eq!(card["properties"][1]["type"], "boolean");
    }

    // ------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------

    /// One malformed manifest does not stop the scan.
    #[test]
    fn test_discover_tolerates_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("hero.json"),
            r#"{
                "name": "Hero",
                "category": "layout",
                "properties": [{"key": "title", "type": "text", "default": "Hi"}],
                "template": "<h1>{{ title }}</h1>{!! children !!}"
            }"#,
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(
            dir.path().join("nested").join("quote.toml"),
            "type = \"@site/quote\"\ntemplate = \"<blockquote>{{ text }}</blockquote>\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let registry = SchemaRegistry::new();
        let report = registry.discover("site", dir.path());

        assert_eq!(report.registered, vec!["site-hero", "site-quote"]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].path.ends_with("broken.json"));
        assert!(!report.is_clean());

        let hero = registry.get("site-hero").unwrap();
        assert_eq!(hero.block_type, "@site/hero");
        assert_eq!(hero.category, BlockCategory::Layout);

        let instance = BlockInstance {
            properties: hero.default_properties(),
            children: "<p>x</p>".into(),
            ..Default::default()
        };
        assert_eq!(hero.handler().render(&instance).unwrap(), "<h1>Hi</h1><p>x</p>");
    }

    #[test]
    fn test_discover_reports_registration_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("text.json"),
            r#"{"type": "text", "template": "{{ content }}"}"#,
        )
        .unwrap();

        let registry = registry();
        let report = registry.discover("site", dir.path());
        assert!(report.registered.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].reason.contains("Duplicate"));
    }

    #[test]
    fn test_discover_missing_directory() {
        let registry = SchemaRegistry::new();
        let report = registry.discover("site", "/definitely/not/here");
        assert!(report.registered.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }
}
