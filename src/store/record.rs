//! Block records and regions
//!
//! Field names follow the editor wire format (`parentId`, `semanticId`,
//! ...). Unknown fields are kept in `extra` and written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::Properties;

fn is_false(value: &bool) -> bool {
    !*value
}

/// One block in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    #[serde(default)]
    pub id: String,
    /// Schema slug
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Ordered child ids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    /// Static blocks are rendered but not editable
    #[serde(rename = "static", default, skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub repeated: bool,
    /// Human-assigned alias, stable across id regeneration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlockRecord {
    /// New record of `block_type` with a fresh random id
    pub fn new(block_type: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), block_type)
    }

    pub fn with_id(id: impl Into<String>, block_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            properties: Properties::new(),
            parent_id: None,
            children: Vec::new(),
            disabled: false,
            is_static: false,
            repeated: false,
            semantic_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_semantic_id(mut self, semantic_id: impl Into<String>) -> Self {
        self.semantic_id = Some(semantic_id.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Merge this (stored) record over `defaults`.
    ///
    /// Stored properties win key by key; default properties the store does
    /// not know about are kept. Structural fields come from the stored
    /// record, except an empty type which falls back to the default's.
    pub fn merged_over(&self, defaults: &BlockRecord) -> BlockRecord {
        let mut properties = defaults.properties.clone();
        for (key, value) in &self.properties {
            properties.insert(key.clone(), value.clone());
        }

        let mut extra = defaults.extra.clone();
        for (key, value) in &self.extra {
            extra.insert(key.clone(), value.clone());
        }

        BlockRecord {
            block_type: if self.block_type.is_empty() {
                defaults.block_type.clone()
            } else {
                self.block_type.clone()
            },
            properties,
            extra,
            ..self.clone()
        }
    }
}

/// A named top-level placement slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    /// Ordered ids of the region's top-level blocks
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Region {
    pub fn new<I, S>(name: impl Into<String>, blocks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            blocks: blocks.into_iter().map(Into::into).collect(),
            extra: Map::new(),
        }
    }
}
