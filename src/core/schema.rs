//! Block schemas
//!
//! A `BlockSchema` is the immutable snapshot of a handler's metadata taken at
//! registration time. The registry owns one per block type for the lifetime
//! of the process.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::block::{Accepts, BlockHandler, Wrapper};
use super::property::PropertyDefinition;
use super::Properties;
use crate::categories::BlockCategory;

/// Schema errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// A schema with this slug is already registered
    #[error("Duplicate block schema: {0}")]
    Duplicate(String),

    /// Two different type strings canonicalize to the same slug
    #[error("Slug '{slug}' is derived from both '{existing}' and '{incoming}'")]
    SlugCollision {
        slug: String,
        existing: String,
        incoming: String,
    },

    /// No schema for this slug or type
    #[error("Block schema not found: {0}")]
    NotFound(String),

    /// The handler's metadata is not a valid schema
    #[error("Malformed block schema '{block_type}': {reason}")]
    Malformed { block_type: String, reason: String },

    /// Registration attempted after bootstrap
    #[error("Schema registry is sealed; cannot register '{0}'")]
    Sealed(String),
}

/// Immutable block type metadata bound to its handler
#[derive(Clone)]
pub struct BlockSchema {
    pub slug: String,
    pub block_type: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BlockCategory,
    pub properties: Vec<PropertyDefinition>,
    pub accepts: Accepts,
    pub wrapper: Option<Wrapper>,
    handler: Arc<dyn BlockHandler>,
}

impl BlockSchema {
    /// Snapshot a handler's metadata into a schema
    ///
    /// Fails when the type string is empty, when it canonicalizes to an
    /// empty slug, or when two properties share a key.
    pub fn from_handler(handler: Arc<dyn BlockHandler>) -> Result<Self, SchemaError> {
        let block_type = handler.block_type().trim().to_string();
        if block_type.is_empty() {
            return Err(SchemaError::Malformed {
                block_type,
                reason: "block type cannot be empty".into(),
            });
        }

        let slug = handler.slug();
        if slug.is_empty() {
            return Err(SchemaError::Malformed {
                block_type,
                reason: "block type does not produce a usable slug".into(),
            });
        }

        let properties = handler.properties();
        let mut seen = HashSet::new();
        for property in &properties {
            if property.key.is_empty() {
                return Err(SchemaError::Malformed {
                    block_type,
                    reason: "property key cannot be empty".into(),
                });
            }
            if !seen.insert(property.key.as_str()) {
                return Err(SchemaError::Malformed {
                    block_type,
                    reason: format!("duplicate property key '{}'", property.key),
                });
            }
        }

        Ok(Self {
            slug,
            name: handler.name(),
            description: handler.description(),
            icon: handler.icon(),
            category: handler.category(),
            accepts: handler.accepts(),
            wrapper: handler.wrapper(),
            properties,
            block_type,
            handler,
        })
    }

    /// The handler this schema was built from
    pub fn handler(&self) -> &Arc<dyn BlockHandler> {
        &self.handler
    }

    /// Look up a property definition by key
    pub fn property(&self, key: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.key == key)
    }

    /// Default value of every declared property, in declaration order
    pub fn default_properties(&self) -> Properties {
        self.properties
            .iter()
            .map(|p| (p.key.clone(), p.default.clone()))
            .collect()
    }

    pub fn has_wrapper(&self) -> bool {
        self.wrapper.is_some()
    }

    /// Serializable metadata for an editor palette
    pub fn summary(&self) -> SchemaSummary {
        SchemaSummary {
            slug: self.slug.clone(),
            block_type: self.block_type.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            category: self.category.clone(),
            properties: self.properties.clone(),
            accepts: self.accepts.clone(),
            wrapper: self.wrapper.clone(),
        }
    }
}

impl std::fmt::Debug for BlockSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockSchema")
            .field("slug", &self.slug)
            .field("block_type", &self.block_type)
            .field("category", &self.category)
            .field("properties", &self.properties.len())
            .field("accepts", &self.accepts)
            .field("wrapper", &self.wrapper)
            .finish()
    }
}

/// Schema metadata as sent to the editor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    pub slug: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BlockCategory,
    pub properties: Vec<PropertyDefinition>,
    pub accepts: Accepts,
    pub wrapper: Option<Wrapper>,
}
