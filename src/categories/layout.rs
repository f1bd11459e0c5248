//! Layout blocks
//!
//! Container blocks that declare a wrapper element and render their
//! children inside it.

use crate::categories::BlockCategory;
use crate::core::block::{BlockError, BlockHandler, BlockInstance, Wrapper};
use crate::core::escape_html;
use crate::core::property::PropertyDefinition;

/// Full-width page section
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionBlock;

impl BlockHandler for SectionBlock {
    fn block_type(&self) -> &str {
        "section"
    }

    fn description(&self) -> String {
        "A full-width container for other blocks".into()
    }

    fn properties(&self) -> Vec<PropertyDefinition> {
        vec![PropertyDefinition::text("title", "").with_label("Title")]
    }

    fn icon(&self) -> String {
        "layout".into()
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Layout
    }

    fn wrapper(&self) -> Option<Wrapper> {
        Some(Wrapper::new("section").with_attribute("class", "block-section"))
    }

    fn render(&self, instance: &BlockInstance) -> Result<String, BlockError> {
        let title = instance.text("title");
        if title.is_empty() {
            return Ok(instance.children.clone());
        }
        Ok(format!("<h2>{}</h2>{}", escape_html(&title), instance.children))
    }
}

/// Grid of columns
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnsBlock;

impl BlockHandler for ColumnsBlock {
    fn block_type(&self) -> &str {
        "columns"
    }

    fn description(&self) -> String {
        "Lays out child blocks in a grid".into()
    }

    fn properties(&self) -> Vec<PropertyDefinition> {
        vec![PropertyDefinition::number("count", 2.0)
            .with_label("Columns")
            .with_range(Some(1.0), Some(6.0))]
    }

    fn icon(&self) -> String {
        "columns".into()
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Layout
    }

    fn wrapper(&self) -> Option<Wrapper> {
        Some(Wrapper::new("div").with_attribute("class", "block-columns"))
    }

    fn render(&self, instance: &BlockInstance) -> Result<String, BlockError> {
        let count = instance
            .property("count")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| BlockError::InvalidProperty {
                key: "count".into(),
                reason: "expected a number".into(),
            })?;
        Ok(format!(
            "<div class=\"block-columns__grid\" style=\"--columns: {}\">{}</div>",
            count as u32, instance.children
        ))
    }
}
