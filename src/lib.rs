//! Block Builder - block-based page building engine
//!
//! Blocks are declared with typed property schemas, assembled into a tree
//! of records with regions, persisted as JSON and compiled into template
//! code. The crate covers the schema registry, the property and node
//! transformer chains, the block data store, the block compilers and the
//! update reconciler, wired together by `BlockEngine`.

pub mod categories;
pub mod compiler;
pub mod config;
pub mod core;
pub mod error;
pub mod runtime;
pub mod store;
pub mod transform;
pub mod update;
mod tests;

// Re-export commonly used types
pub use categories::BlockCategory;
pub use compiler::{BlockCompiler, CompileError, CompilerSet, TemplateCache};
pub use config::BuilderConfig;
pub use core::{
    Accepts, Attributes, BlockHandler, BlockInstance, BlockSchema, PropertyDefinition,
    PropertyType, SchemaError, SchemaRegistry, Wrapper,
};
pub use error::{Error, Result};
pub use runtime::{BlockEngine, RenderMode, Renderer};
pub use store::{BlockDocument, BlockRecord, BlockStore, LoadError, SourceId};
pub use transform::{DynamicSource, NodeTransformerChain, PropertyTransformers, TemplateNode};
pub use update::UpdateRequest;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
