//! Content blocks
//!
//! Leaf blocks that render text. They accept no children and carry no
//! wrapper, so custom attributes land on their own root element.

use crate::categories::BlockCategory;
use crate::core::block::{Accepts, BlockError, BlockHandler, BlockInstance};
use crate::core::escape_html;
use crate::core::property::{PropertyDefinition, SelectOption};

/// Paragraph of text
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBlock;

impl BlockHandler for TextBlock {
    fn block_type(&self) -> &str {
        "text"
    }

    fn description(&self) -> String {
        "A paragraph of text".into()
    }

    fn properties(&self) -> Vec<PropertyDefinition> {
        vec![PropertyDefinition::textarea("content", "").with_label("Content")]
    }

    fn accepts(&self) -> Accepts {
        Accepts::nothing()
    }

    fn icon(&self) -> String {
        "text".into()
    }

    fn render(&self, instance: &BlockInstance) -> Result<String, BlockError> {
        Ok(format!(
            "<p{}>{}</p>",
            instance.attributes.render(),
            escape_html(&instance.text("content"))
        ))
    }
}

const HEADING_LEVELS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Heading with a selectable level
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingBlock;

impl BlockHandler for HeadingBlock {
    fn block_type(&self) -> &str {
        "heading"
    }

    fn description(&self) -> String {
        "A section heading".into()
    }

    fn properties(&self) -> Vec<PropertyDefinition> {
        let levels = HEADING_LEVELS
            .iter()
            .map(|level| SelectOption::new(*level, level.to_uppercase()))
            .collect();
        vec![
            PropertyDefinition::text("content", "").with_label("Text"),
            PropertyDefinition::select("level", levels, "h2").with_label("Level"),
        ]
    }

    fn accepts(&self) -> Accepts {
        Accepts::nothing()
    }

    fn icon(&self) -> String {
        "heading".into()
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Content
    }

    fn render(&self, instance: &BlockInstance) -> Result<String, BlockError> {
        let level = instance.text("level");
        if !HEADING_LEVELS.contains(&level.as_str()) {
            return Err(BlockError::InvalidProperty {
                key: "level".into(),
                reason: format!("'{}' is not a heading level", level),
            });
        }
        Ok(format!(
            "<{level}{attrs}>{text}</{level}>",
            attrs = instance.attributes.render(),
            text = escape_html(&instance.text("content")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_escapes_content() {
        let mut instance = BlockInstance::default();
        instance.properties.insert("content".into(), json!("a < b"));
        assert_eq!(TextBlock.render(&instance).unwrap(), "<p>a &lt; b</p>");
    }

    #[test]
    fn test_heading_rejects_unknown_level() {
        let mut instance = BlockInstance::default();
        instance.properties.insert("level".into(), json!("h9"));
        assert!(matches!(
            HeadingBlock.render(&instance),
            Err(BlockError::InvalidProperty { .. })
        ));
    }
}
