//! Render-time block resolution
//!
//! For every block the renderer:
//! 1. merges the stored record over the compile-time defaults,
//! 2. merges schema defaults with stored properties and runs the property
//!    transformer chain,
//! 3. renders the accepted children,
//! 4. invokes the schema's handler,
//! 5. wraps the output and merges custom attributes onto the root element.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::RenderMode;
use crate::core::block::{Attributes, BlockError, BlockInstance};
use crate::core::registry::SchemaRegistry;
use crate::core::schema::BlockSchema;
use crate::core::{escape_html, Properties};
use crate::store::{BlockDocument, BlockRecord};
use crate::transform::dynamic::DynamicSource;
use crate::transform::property::{PropertyTransformers, TransformError};

/// Render-time errors, localized to a block
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error("Block '{id}' has unknown type '{block_type}'")]
    UnknownType { id: String, block_type: String },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("Block '{id}' ({block_type}) failed to render: {error}")]
    Block {
        id: String,
        block_type: String,
        #[source]
        error: BlockError,
    },

    #[error("Block '{0}' not found")]
    BlockNotFound(String),

    #[error("Region '{0}' not found")]
    RegionNotFound(String),
}

/// Renders the blocks of one loaded document
#[derive(Clone)]
pub struct Renderer {
    registry: SchemaRegistry,
    transformers: Arc<PropertyTransformers>,
    document: Arc<BlockDocument>,
    mode: RenderMode,
    context: Option<Map<String, Value>>,
}

impl Renderer {
    pub fn new(
        registry: SchemaRegistry,
        transformers: Arc<PropertyTransformers>,
        document: Arc<BlockDocument>,
        mode: RenderMode,
    ) -> Self {
        Self {
            registry,
            transformers,
            document,
            mode,
            context: None,
        }
    }

    /// Resolve dynamic sources that carry no context of their own against
    /// `context`
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn document(&self) -> &BlockDocument {
        &self.document
    }

    /// Stored record merged over `defaults`
    pub fn resolve(&self, id: &str, defaults: Option<&BlockRecord>) -> Option<BlockRecord> {
        self.document.get_block(id, defaults)
    }

    /// Render-time properties of a record
    pub fn properties(&self, record: &BlockRecord, schema: &BlockSchema) -> Result<Properties, RenderError> {
        let mut properties = schema.default_properties();
        for (key, value) in &record.properties {
            properties.insert(key.clone(), self.bind_context(value));
        }
        self.transformers
            .apply_all(&properties, schema)
            .map_err(|e| RenderError::from(e.with_block_id(record.id.clone())))
    }

    fn bind_context(&self, value: &Value) -> Value {
        match (&self.context, DynamicSource::detect(value)) {
            (Some(context), Some(source)) if source.context.is_empty() => {
                source.with_context(context.clone()).to_value()
            }
            _ => value.clone(),
        }
    }

    /// Render a stored block by id
    pub fn render_block(&self, id: &str) -> Result<String, RenderError> {
        let record = self
            .document
            .get(id)
            .ok_or_else(|| RenderError::BlockNotFound(id.to_string()))?;
        self.render_record(record, &Attributes::new())
    }

    /// Render a block by id, merged over compile-time defaults, with custom
    /// attributes. Unknown ids without defaults render nothing.
    pub fn render_with(
        &self,
        id: &str,
        defaults: Option<&BlockRecord>,
        attributes: &Attributes,
    ) -> Result<String, RenderError> {
        match self.resolve(id, defaults) {
            Some(record) => self.render_record(&record, attributes),
            None => Ok(String::new()),
        }
    }

    /// Render the top-level blocks of a region in placement order
    pub fn render_region(&self, name: &str) -> Result<String, RenderError> {
        if self.document.region(name).is_none() {
            return Err(RenderError::RegionNotFound(name.to_string()));
        }
        self.document
            .region_blocks(name)
            .into_iter()
            .map(|record| self.render_record(record, &Attributes::new()))
            .collect()
    }

    pub fn render_record(&self, record: &BlockRecord, attributes: &Attributes) -> Result<String, RenderError> {
        if record.disabled {
            return Ok(self.placeholder(record));
        }

        let schema = self
            .registry
            .resolve(&record.block_type)
            .map_err(|_| RenderError::UnknownType {
                id: record.id.clone(),
                block_type: record.block_type.clone(),
            })?;
        let properties = self.properties(record, &schema)?;
        let children = self.render_children(record, &schema)?;

        let mut attributes = attributes.clone();
        if self.mode.is_preview() && !record.is_static {
            attributes.set("data-block-id", record.id.clone());
            attributes.set("data-block-type", schema.slug.clone());
        }

        let instance = BlockInstance {
            id: record.id.clone(),
            block_type: schema.slug.clone(),
            properties,
            children,
            attributes: if schema.has_wrapper() {
                Attributes::new()
            } else {
                attributes.clone()
            },
        };
        let html = schema
            .handler()
            .render(&instance)
            .map_err(|error| RenderError::Block {
                id: record.id.clone(),
                block_type: schema.slug.clone(),
                error,
            })?;

        Ok(match &schema.wrapper {
            Some(wrapper) => wrapper.wrap(&attributes, &html),
            None => html,
        })
    }

    fn render_children(&self, record: &BlockRecord, schema: &BlockSchema) -> Result<String, RenderError> {
        let mut out = String::new();
        for child in self.document.children_of(&record.id) {
            if !self.registry.accepts(&schema.slug, &child.block_type) {
                warn!(
                    parent = %record.id,
                    child = %child.id,
                    child_type = %child.block_type,
                    "skipping child not accepted by parent"
                );
                continue;
            }
            out.push_str(&self.render_record(child, &Attributes::new())?);
        }
        Ok(out)
    }

    fn placeholder(&self, record: &BlockRecord) -> String {
        if !self.mode.is_preview() {
            debug!(id = %record.id, "disabled block skipped");
            return String::new();
        }
        format!(
            "<div data-block-id=\"{}\" data-block-type=\"{}\" data-block-disabled></div>",
            escape_html(&record.id),
            escape_html(&record.block_type),
        )
    }
}
