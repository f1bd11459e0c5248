//! Block compilers
//!
//! A block compiler turns one block occurrence in a template into target
//! template source. The generated code performs the render-time work: it
//! looks the record up in the block store, transforms its properties,
//! invokes the handler bound to the schema, splices in the children closure
//! and merges custom attributes onto the wrapper.
//!
//! Compilation is pure code generation. It does no I/O and is
//! deterministic, so compiled output can be cached by content hash.

pub mod cache;
pub mod php;

pub use cache::TemplateCache;

use std::sync::Arc;

use crate::core::schema::{BlockSchema, SchemaError};
use crate::runtime::RenderMode;

/// Compilation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// The selected compiler cannot handle this schema
    #[error("Compiler '{compiler}' does not support block '{slug}'")]
    Unsupported { compiler: String, slug: String },

    /// No registered compiler supports this schema
    #[error("No compiler supports block '{0}'")]
    NoCompiler(String),

    /// The template references an unknown block
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A directive or component node is not well formed
    #[error("Invalid {node} node: {reason}")]
    InvalidNode { node: String, reason: String },
}

/// Everything a compiler needs to emit one block
#[derive(Debug, Clone)]
pub struct CompileInput<'a> {
    pub schema: &'a BlockSchema,
    /// Id the generated code looks the record up by
    pub block_id: &'a str,
    pub content_hash: &'a str,
    /// Already-compiled children source
    pub children_code: &'a str,
    /// Expression for the default properties
    pub properties_expr: &'a str,
    /// Expression for the custom attributes
    pub attributes_expr: &'a str,
    pub mode: RenderMode,
}

/// Emits template source for a block
pub trait BlockCompiler: Send + Sync {
    /// Name used in errors and logs
    fn name(&self) -> &str;

    /// Whether this compiler can handle blocks of `schema`
    fn supports(&self, schema: &BlockSchema) -> bool;

    fn compile(&self, input: &CompileInput<'_>) -> Result<String, CompileError>;
}

/// Compiles blocks that declare a wrapper element
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapperCompiler;

impl BlockCompiler for WrapperCompiler {
    fn name(&self) -> &str {
        "wrapper"
    }

    fn supports(&self, schema: &BlockSchema) -> bool {
        schema.has_wrapper()
    }

    fn compile(&self, input: &CompileInput<'_>) -> Result<String, CompileError> {
        let wrapper = input
            .schema
            .wrapper
            .as_ref()
            .ok_or_else(|| CompileError::Unsupported {
                compiler: self.name().to_string(),
                slug: input.schema.slug.clone(),
            })?;
        Ok(php::emit_block(input, Some(wrapper)))
    }
}

/// Compiles any block; attributes are handed to the handler
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineCompiler;

impl BlockCompiler for InlineCompiler {
    fn name(&self) -> &str {
        "inline"
    }

    fn supports(&self, _schema: &BlockSchema) -> bool {
        true
    }

    fn compile(&self, input: &CompileInput<'_>) -> Result<String, CompileError> {
        Ok(php::emit_block(input, None))
    }
}

/// Ordered compilers; the first one supporting a schema wins
#[derive(Clone)]
pub struct CompilerSet {
    compilers: Vec<Arc<dyn BlockCompiler>>,
}

impl CompilerSet {
    /// Empty set (every compile fails with `NoCompiler`)
    pub fn empty() -> Self {
        Self {
            compilers: Vec::new(),
        }
    }

    /// Put a compiler in front of the existing ones
    pub fn prepend(&mut self, compiler: Arc<dyn BlockCompiler>) {
        self.compilers.insert(0, compiler);
    }

    pub fn push(&mut self, compiler: Arc<dyn BlockCompiler>) {
        self.compilers.push(compiler);
    }

    /// Pick the compiler for `schema`
    pub fn select(&self, schema: &BlockSchema) -> Result<&Arc<dyn BlockCompiler>, CompileError> {
        self.compilers
            .iter()
            .find(|c| c.supports(schema))
            .ok_or_else(|| CompileError::NoCompiler(schema.slug.clone()))
    }

    pub fn compile(&self, input: &CompileInput<'_>) -> Result<String, CompileError> {
        self.select(input.schema)?.compile(input)
    }
}

impl Default for CompilerSet {
    /// `WrapperCompiler` with `InlineCompiler` as fallback
    fn default() -> Self {
        Self {
            compilers: vec![Arc::new(WrapperCompiler), Arc::new(InlineCompiler)],
        }
    }
}
