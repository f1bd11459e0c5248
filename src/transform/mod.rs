//! Transformer chains
//!
//! Two independent chains live here. Property transformers turn raw stored
//! property values into render-time values. Node transformers rewrite the
//! block syntax of a parsed template into compiled block code.

pub mod directives;
pub mod dynamic;
pub mod node;
pub mod property;

pub use directives::{
    BlockComponentTransformer, BlockDirectiveTransformer, RegionDirectiveTransformer,
    ScriptsDirectiveTransformer,
};
pub use dynamic::{data_get, DynamicSource};
pub use node::{
    AttributeValue, DocumentContext, NodeAttribute, NodeTransformer, NodeTransformerChain,
    TemplateNode, TransformContext,
};
pub use property::{PropertyTransformer, PropertyTransformers, TransformError};
