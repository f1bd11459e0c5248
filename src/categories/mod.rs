//! Block categories and built-in blocks
//!
//! This module handles block categorization for the editor palette and ships
//! the handful of built-in block handlers most pages need.

pub mod content;
pub mod layout;

pub use content::{HeadingBlock, TextBlock};
pub use layout::{ColumnsBlock, SectionBlock};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::registry::SchemaRegistry;
use crate::core::schema::SchemaError;

/// Block category enumeration
///
/// Serialized as its lowercase name; any other string is a custom category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockCategory {
    /// Structural blocks (sections, columns)
    Layout,
    /// Text and other inline content
    Content,
    /// Images, video, embeds
    Media,
    /// Form controls
    Form,
    /// Menus and links
    Navigation,
    /// Custom user-defined category
    Custom(String),
}

impl BlockCategory {
    /// Get a human-readable name for the category
    pub fn display_name(&self) -> &str {
        match self {
            BlockCategory::Layout => "Layout",
            BlockCategory::Content => "Content",
            BlockCategory::Media => "Media",
            BlockCategory::Form => "Form",
            BlockCategory::Navigation => "Navigation",
            BlockCategory::Custom(name) => name,
        }
    }
}

impl From<String> for BlockCategory {
    fn from(name: String) -> Self {
        match name.to_lowercase().as_str() {
            "layout" => BlockCategory::Layout,
            "content" => BlockCategory::Content,
            "media" => BlockCategory::Media,
            "form" => BlockCategory::Form,
            "navigation" => BlockCategory::Navigation,
            _ => BlockCategory::Custom(name),
        }
    }
}

impl From<BlockCategory> for String {
    fn from(category: BlockCategory) -> Self {
        match category {
            BlockCategory::Custom(name) => name,
            other => other.display_name().to_lowercase(),
        }
    }
}

impl std::fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Register the built-in blocks (`text`, `heading`, `section`, `columns`)
pub fn register_builtin(registry: &SchemaRegistry) -> Result<(), SchemaError> {
    registry.register_handler(Arc::new(TextBlock))?;
    registry.register_handler(Arc::new(HeadingBlock))?;
    registry.register_handler(Arc::new(SectionBlock))?;
    registry.register_handler(Arc::new(ColumnsBlock))?;
    Ok(())
}
