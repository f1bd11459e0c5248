//! Block handler trait and related types
//!
//! This module defines the capability set every block handler exposes, the
//! instance a handler renders from, and the structural pieces (accepted
//! children, wrapper element, HTML attributes) a schema is built from.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use super::property::PropertyDefinition;
use super::{default_name, escape_html, slugify, Properties};
use crate::categories::BlockCategory;

/// Capability set every block handler must provide.
///
/// Only `block_type` and `render` are required; the remaining metadata has
/// defaults derived from the type string, so a handler overrides what it
/// actually cares about.
pub trait BlockHandler: Send + Sync {
    /// Type string, e.g. `"text"` or `"@vendor/hero"`
    fn block_type(&self) -> &str;

    /// Registry key derived from the type string
    fn slug(&self) -> String {
        slugify(self.block_type())
    }

    /// Human-readable block name
    fn name(&self) -> String {
        default_name(self.block_type())
    }

    /// Short description shown in the editor palette
    fn description(&self) -> String {
        String::new()
    }

    /// Ordered property definitions
    fn properties(&self) -> Vec<PropertyDefinition> {
        Vec::new()
    }

    /// Child block types this block accepts
    fn accepts(&self) -> Accepts {
        Accepts::Any
    }

    /// Icon identifier
    fn icon(&self) -> String {
        "square".to_string()
    }

    /// Palette category
    fn category(&self) -> BlockCategory {
        BlockCategory::Content
    }

    /// Optional root wrapper element; custom attributes are merged onto it
    fn wrapper(&self) -> Option<Wrapper> {
        None
    }

    /// Render a resolved block instance
    fn render(&self, instance: &BlockInstance) -> Result<String, BlockError>;
}

/// A block ready to render: resolved properties plus pre-rendered children.
#[derive(Debug, Clone, Default)]
pub struct BlockInstance {
    pub id: String,
    pub block_type: String,
    pub properties: Properties,
    /// Rendered children markup, spliced in verbatim
    pub children: String,
    /// Attributes for the root element when the schema has no wrapper
    pub attributes: Attributes,
}

impl BlockInstance {
    /// Get a property value
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// Get a property as text (empty when missing or null)
    pub fn text(&self, key: &str) -> String {
        self.properties
            .get(key)
            .map(super::value_to_text)
            .unwrap_or_default()
    }
}

/// Block rendering errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum BlockError {
    /// A property required for rendering is missing or has the wrong shape
    #[error("Invalid property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },

    /// Rendering failed
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Child block types a block accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepts {
    /// Any block type (`"*"`)
    Any,
    /// Only slugs matching one of these patterns; a trailing `*` matches a
    /// prefix. An empty list accepts nothing.
    Only(Vec<String>),
}

impl Accepts {
    /// Accept no children
    pub fn nothing() -> Self {
        Accepts::Only(Vec::new())
    }

    /// Check whether a child slug is allowed
    pub fn allows(&self, slug: &str) -> bool {
        match self {
            Accepts::Any => true,
            Accepts::Only(patterns) => patterns.iter().any(|pattern| {
                if pattern == "*" {
                    true
                } else if let Some(prefix) = pattern.strip_suffix('*') {
                    slug.starts_with(prefix)
                } else {
                    pattern == slug
                }
            }),
        }
    }
}

impl Default for Accepts {
    fn default() -> Self {
        Accepts::Any
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AcceptsRepr {
    Wildcard(String),
    List(Vec<String>),
}

impl Serialize for Accepts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Accepts::Any => AcceptsRepr::Wildcard("*".to_string()).serialize(serializer),
            Accepts::Only(list) => AcceptsRepr::List(list.clone()).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Accepts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match AcceptsRepr::deserialize(deserializer)? {
            AcceptsRepr::Wildcard(s) if s == "*" => Ok(Accepts::Any),
            AcceptsRepr::Wildcard(s) => Ok(Accepts::Only(vec![s])),
            AcceptsRepr::List(list) => Ok(Accepts::Only(list)),
        }
    }
}

/// HTML attributes, kept sorted so rendering is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Set an attribute, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Merge `overrides` on top of these attributes.
    ///
    /// `class` values are joined with a space and `style` values with `;`;
    /// every other attribute in `overrides` replaces the base value.
    pub fn merge(&self, overrides: &Attributes) -> Attributes {
        let mut merged = self.0.clone();
        for (name, value) in &overrides.0 {
            match (name.as_str(), merged.get(name)) {
                ("class", Some(base)) if !base.is_empty() && !value.is_empty() => {
                    let joined = format!("{} {}", base, value);
                    merged.insert(name.clone(), joined);
                }
                ("style", Some(base)) if !base.is_empty() && !value.is_empty() => {
                    let joined = format!("{};{}", base.trim_end_matches(';'), value);
                    merged.insert(name.clone(), joined);
                }
                _ => {
                    merged.insert(name.clone(), value.clone());
                }
            }
        }
        Attributes(merged)
    }

    /// Render as ` name="value"` pairs (leading space included when non-empty)
    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(|(name, value)| format!(" {}=\"{}\"", name, escape_html(value)))
            .collect()
    }
}

/// Structural wrapper element placed around a block's rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrapper {
    pub tag: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Wrapper {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.set(name, value);
        self
    }

    /// Wrap `inner` in this element, with `custom` merged over the wrapper's
    /// own attributes.
    pub fn wrap(&self, custom: &Attributes, inner: &str) -> String {
        let attributes = self.attributes.merge(custom);
        format!("<{tag}{attrs}>{inner}</{tag}>", tag = self.tag, attrs = attributes.render())
    }
}
