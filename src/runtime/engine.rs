//! Block engine
//!
//! Explicit service object composing configuration, schema registry,
//! property transformers, block store, node transformers, compilers and the
//! compiled-template cache. Hosts build one at bootstrap and share it; the
//! registry is sealed by `build`, so it is read-only while serving.

use std::sync::Arc;
use tracing::{debug, info};

use super::renderer::Renderer;
use super::RenderMode;
use crate::categories::register_builtin;
use crate::compiler::{BlockCompiler, CompileError, CompilerSet, TemplateCache};
use crate::config::BuilderConfig;
use crate::core::registry::SchemaRegistry;
use crate::error::Result;
use crate::store::{BlockStore, DocumentLoader, JsonFileLoader, SourceId};
use crate::transform::directives::{
    BlockComponentTransformer, BlockDirectiveTransformer, RegionDirectiveTransformer,
    ScriptsDirectiveTransformer,
};
use crate::transform::node::{
    nodes_to_source, template_hash, DocumentContext, NodeTransformer, NodeTransformerChain, TemplateNode,
};
use crate::transform::property::{PropertyTransformer, PropertyTransformers};
use crate::update::{UpdateDelta, UpdateRequest};

// ── Compiled output ─────────────────────────────────────────────────────────

/// Compiled template source plus the identity it is cached under
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    pub content_hash: String,
    pub mode: RenderMode,
    pub source: Arc<String>,
}

// ── Builder ─────────────────────────────────────────────────────────────────

/// Bootstrap-time configuration of a `BlockEngine`
pub struct BlockEngineBuilder {
    config: BuilderConfig,
    registry: SchemaRegistry,
    builtin_blocks: bool,
    transformers: PropertyTransformers,
    loader: Option<Arc<dyn DocumentLoader>>,
    compilers: CompilerSet,
    node_transformers: Vec<Arc<dyn NodeTransformer>>,
}

impl BlockEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: BuilderConfig::default(),
            registry: SchemaRegistry::new(),
            builtin_blocks: true,
            transformers: PropertyTransformers::with_defaults(),
            loader: None,
            compilers: CompilerSet::default(),
            node_transformers: Vec::new(),
        }
    }

    pub fn config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a pre-populated registry
    pub fn registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Whether to register the built-in blocks (default: yes)
    pub fn builtin_blocks(mut self, enabled: bool) -> Self {
        self.builtin_blocks = enabled;
        self
    }

    /// Bind a property transformer; a later binding for the same tag wins
    pub fn property_transformer<T>(mut self, type_tag: &str, transformer: T) -> Self
    where
        T: PropertyTransformer + 'static,
    {
        self.transformers.register(type_tag, transformer);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Add a compiler ahead of the built-in ones
    pub fn compiler(mut self, compiler: Arc<dyn BlockCompiler>) -> Self {
        self.compilers.prepend(compiler);
        self
    }

    /// Add a node transformer; custom transformers run before the built-ins
    pub fn node_transformer(mut self, transformer: Arc<dyn NodeTransformer>) -> Self {
        self.node_transformers.push(transformer);
        self
    }

    pub fn build(self) -> Result<BlockEngine> {
        if self.builtin_blocks {
            register_builtin(&self.registry)?;
        }
        self.registry.seal();

        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(JsonFileLoader::new(self.config.store.data_extension.clone())));
        let compilers = Arc::new(self.compilers);

        let mut nodes = NodeTransformerChain::new();
        for transformer in self.node_transformers {
            nodes.push(transformer);
        }
        nodes.push(Arc::new(BlockComponentTransformer::new(
            self.registry.clone(),
            compilers.clone(),
            self.config.components.clone(),
        )));
        nodes.push(Arc::new(BlockDirectiveTransformer::new(
            self.registry.clone(),
            compilers.clone(),
            self.config.directives.block.clone(),
        )));
        nodes.push(Arc::new(RegionDirectiveTransformer::new(
            self.config.directives.region.clone(),
        )));
        nodes.push(Arc::new(ScriptsDirectiveTransformer::new(
            self.config.directives.scripts.clone(),
            self.config.preview.view.clone(),
        )));

        info!(
            schemas = self.registry.count(),
            node_transformers = nodes.len(),
            "block engine ready"
        );

        Ok(BlockEngine {
            config: self.config,
            registry: self.registry,
            transformers: Arc::new(self.transformers),
            store: Arc::new(BlockStore::new(loader)),
            nodes,
            cache: TemplateCache::new(),
        })
    }
}

impl Default for BlockEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ── Engine ──────────────────────────────────────────────────────────────────

/// Compiles templates and renders block documents
pub struct BlockEngine {
    config: BuilderConfig,
    registry: SchemaRegistry,
    transformers: Arc<PropertyTransformers>,
    store: Arc<BlockStore>,
    nodes: NodeTransformerChain,
    cache: TemplateCache,
}

impl BlockEngine {
    pub fn builder() -> BlockEngineBuilder {
        BlockEngineBuilder::new()
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn transformers(&self) -> &PropertyTransformers {
        &self.transformers
    }

    pub fn store(&self) -> &Arc<BlockStore> {
        &self.store
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Render mode for a raw request query string
    pub fn mode_for_query(&self, query: &str) -> RenderMode {
        if self.config.preview.is_requested(query) {
            RenderMode::Preview
        } else {
            RenderMode::Live
        }
    }

    /// Rewrite a parsed template and emit its compiled source.
    ///
    /// The content hash is taken over the template's node tree, so an
    /// unchanged template compiles once per mode.
    pub fn compile_template(
        &self,
        nodes: Vec<TemplateNode>,
        mode: RenderMode,
    ) -> std::result::Result<CompiledTemplate, CompileError> {
        let hash = template_hash(&nodes)?;
        let source = self.cache.get_or_compile(&hash, mode, || {
            debug!(content_hash = %hash, ?mode, "compiling template");
            let document = DocumentContext::new(hash.clone(), mode);
            let rewritten = self.nodes.run(nodes, document)?;
            Ok::<_, CompileError>(nodes_to_source(&rewritten))
        })?;
        Ok(CompiledTemplate {
            content_hash: hash,
            mode,
            source,
        })
    }

    /// Renderer over the document of `source`, loading it if needed
    pub fn renderer(&self, source: &SourceId, mode: RenderMode) -> Result<Renderer> {
        let document = self.store.load_file(source)?;
        Ok(Renderer::new(
            self.registry.clone(),
            self.transformers.clone(),
            document,
            mode,
        ))
    }

    pub fn render_region(&self, source: &SourceId, region: &str, mode: RenderMode) -> Result<String> {
        Ok(self.renderer(source, mode)?.render_region(region)?)
    }

    pub fn render_block(&self, source: &SourceId, id: &str, mode: RenderMode) -> Result<String> {
        Ok(self.renderer(source, mode)?.render_block(id)?)
    }

    /// Net delta of an editor update, checked against the registry
    pub fn reconcile(&self, request: &UpdateRequest) -> Result<UpdateDelta> {
        let delta = request.delta()?;
        for record in &delta.upserts {
            self.registry.resolve(&record.block_type)?;
        }
        debug!(
            upserts = delta.upserts.len(),
            removals = delta.removals.len(),
            moved = delta.moved.len(),
            "reconciled block update"
        );
        Ok(delta)
    }

    /// Drop the loaded document of `source`
    pub fn forget(&self, source: &SourceId) {
        self.store.forget(source);
    }

    /// Drop loaded documents and compiled templates
    pub fn clear(&self) {
        self.store.clear();
        self.cache.clear();
    }
}
