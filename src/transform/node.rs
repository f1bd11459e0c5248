//! Template AST nodes and the node transformer chain
//!
//! The template parser is external; its output reaches this crate as a
//! tree of `TemplateNode`s. Node transformers rewrite directive and
//! component nodes into compiled block code before the tree is emitted back
//! to template source.
//!
//! The chain is first-match: transformers are tried in registration order
//! and the first whose `supports` returns true handles the node. Its output
//! is not fed back through the chain. Unmatched elements and components are
//! descended into; any other unmatched node is returned as-is.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::compiler::CompileError;
use crate::core::{content_hash, generate_child_id};
use crate::runtime::RenderMode;

/// Attribute value on an element or component node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// `name="text"`
    Literal(String),
    /// `:name="expression"`
    Bound(String),
    /// `name`
    Flag,
}

/// Named attribute on an element or component node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttribute {
    pub name: String,
    pub value: AttributeValue,
}

impl NodeAttribute {
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Literal(value.into()),
        }
    }

    pub fn bound(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Bound(expression.into()),
        }
    }

    fn to_source(&self) -> String {
        match &self.value {
            AttributeValue::Literal(v) => format!(" {}=\"{}\"", self.name, v),
            AttributeValue::Bound(expr) => format!(" :{}=\"{}\"", self.name, expr),
            AttributeValue::Flag => format!(" {}", self.name),
        }
    }
}

/// A node of a parsed template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TemplateNode {
    /// Literal template text
    Text { content: String },
    /// `{{ expression }}` or `{!! expression !!}`
    Echo { expression: String, raw: bool },
    /// `@name(arguments)`
    Directive {
        name: String,
        arguments: Option<String>,
    },
    /// Plain markup element
    Element {
        tag: String,
        attributes: Vec<NodeAttribute>,
        children: Vec<TemplateNode>,
    },
    /// `<x-name ...>` component
    Component {
        name: String,
        attributes: Vec<NodeAttribute>,
        children: Vec<TemplateNode>,
        self_closing: bool,
    },
    /// Generated code; emitted verbatim
    Compiled { source: String },
}

impl TemplateNode {
    pub fn text(content: impl Into<String>) -> Self {
        TemplateNode::Text {
            content: content.into(),
        }
    }

    pub fn echo(expression: impl Into<String>) -> Self {
        TemplateNode::Echo {
            expression: expression.into(),
            raw: false,
        }
    }

    pub fn directive(name: impl Into<String>, arguments: Option<&str>) -> Self {
        TemplateNode::Directive {
            name: name.into(),
            arguments: arguments.map(str::to_string),
        }
    }

    pub fn element(tag: impl Into<String>, children: Vec<TemplateNode>) -> Self {
        TemplateNode::Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children,
        }
    }

    /// Self-closing component with no attributes
    pub fn component(name: impl Into<String>) -> Self {
        TemplateNode::Component {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: true,
        }
    }

    pub fn compiled(source: impl Into<String>) -> Self {
        TemplateNode::Compiled {
            source: source.into(),
        }
    }

    /// Add an attribute (elements and components only)
    pub fn with_attribute(mut self, attribute: NodeAttribute) -> Self {
        if let TemplateNode::Element { attributes, .. } | TemplateNode::Component { attributes, .. } =
            &mut self
        {
            attributes.push(attribute);
        }
        self
    }

    /// Set children (elements and components only)
    pub fn with_children(mut self, nodes: Vec<TemplateNode>) -> Self {
        match &mut self {
            TemplateNode::Element { children, .. } => *children = nodes,
            TemplateNode::Component {
                children,
                self_closing,
                ..
            } => {
                *self_closing = nodes.is_empty();
                *children = nodes;
            }
            _ => {}
        }
        self
    }

    /// Emit template source for this node
    pub fn to_source(&self) -> String {
        match self {
            TemplateNode::Text { content } => content.clone(),
            TemplateNode::Echo { expression, raw: false } => format!("{{{{ {} }}}}", expression),
            TemplateNode::Echo { expression, raw: true } => format!("{{!! {} !!}}", expression),
            TemplateNode::Directive {
                name,
                arguments: Some(args),
            } => format!("@{}({})", name, args),
            TemplateNode::Directive {
                name,
                arguments: None,
            } => format!("@{}", name),
            TemplateNode::Element {
                tag,
                attributes,
                children,
            } => format!(
                "<{tag}{attrs}>{inner}</{tag}>",
                attrs = attributes.iter().map(NodeAttribute::to_source).collect::<String>(),
                inner = nodes_to_source(children),
            ),
            TemplateNode::Component {
                name,
                attributes,
                children,
                self_closing,
            } => {
                let attrs: String = attributes.iter().map(NodeAttribute::to_source).collect();
                if *self_closing && children.is_empty() {
                    format!("<x-{}{} />", name, attrs)
                } else {
                    format!("<x-{name}{attrs}>{}</x-{name}>", nodes_to_source(children))
                }
            }
            TemplateNode::Compiled { source } => source.clone(),
        }
    }
}

/// Emit template source for a node list
pub fn nodes_to_source(nodes: &[TemplateNode]) -> String {
    nodes.iter().map(TemplateNode::to_source).collect()
}

/// Content hash of a node list.
///
/// Taken over the JSON encoding of the tree. Emitted source is lossy: a text
/// node can print the same characters as a directive.
pub fn template_hash(nodes: &[TemplateNode]) -> Result<String, CompileError> {
    let encoded = serde_json::to_string(nodes).map_err(|e| CompileError::InvalidNode {
        node: "template".to_string(),
        reason: e.to_string(),
    })?;
    Ok(content_hash(&encoded))
}

/// Rewrites one kind of template node
pub trait NodeTransformer: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    fn supports(&self, node: &TemplateNode) -> bool;

    fn transform(
        &self,
        node: TemplateNode,
        cx: &mut TransformContext<'_>,
    ) -> Result<TemplateNode, CompileError>;
}

#[derive(Debug, Clone)]
struct Scope {
    id: String,
    counters: HashMap<String, usize>,
    /// Local ids taken in this scope, explicit and generated
    used: HashSet<String>,
}

impl Scope {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            counters: HashMap::new(),
            used: HashSet::new(),
        }
    }

    /// Next `{slug}-{n}` not already taken
    fn next_local(&mut self, slug: &str) -> String {
        let counter = self.counters.entry(slug.to_string()).or_insert(0);
        loop {
            let local = format!("{}-{}", slug, counter);
            *counter += 1;
            if !self.used.contains(&local) {
                return local;
            }
        }
    }
}

/// Per-document state threaded through a transformation pass
///
/// Block ids are scoped: a root block's id derives from the content hash,
/// a nested block's id from its parent's id. Blocks without an explicit id
/// get `{slug}-{n}` as local id, counted per scope in source order and
/// skipping locals already taken. Local ids are unique within a scope.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    content_hash: String,
    mode: RenderMode,
    scopes: Vec<Scope>,
}

impl DocumentContext {
    pub fn new(content_hash: impl Into<String>, mode: RenderMode) -> Self {
        let content_hash = content_hash.into();
        Self {
            scopes: vec![Scope::new(content_hash.clone())],
            content_hash,
            mode,
        }
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Id of the innermost enclosing block, or the content hash at the root
    pub fn scope_id(&self) -> &str {
        self.scopes
            .last()
            .map(|s| s.id.as_str())
            .unwrap_or(&self.content_hash)
    }

    /// Nesting depth (0 at the document root)
    pub fn depth(&self) -> usize {
        self.scopes.len().saturating_sub(1)
    }

    /// Allocate the id of the next block of `slug` in the current scope.
    ///
    /// Fails when `explicit` is already taken in this scope.
    pub fn block_id(&mut self, slug: &str, explicit: Option<&str>) -> Result<String, CompileError> {
        let local = match self.scopes.last_mut() {
            Some(scope) => {
                let local = match explicit {
                    Some(id) if scope.used.contains(id) => {
                        return Err(CompileError::InvalidNode {
                            node: slug.to_string(),
                            reason: format!("duplicate block id '{}'", id),
                        });
                    }
                    Some(id) => id.to_string(),
                    None => scope.next_local(slug),
                };
                scope.used.insert(local.clone());
                local
            }
            None => explicit.map_or_else(|| format!("{}-0", slug), str::to_string),
        };
        Ok(generate_child_id(self.scope_id(), &local))
    }

    fn push_scope(&mut self, id: &str) {
        self.scopes.push(Scope::new(id));
    }

    fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }
}

/// Handle passed to transformers: the chain plus the document state
pub struct TransformContext<'a> {
    chain: &'a NodeTransformerChain,
    pub document: DocumentContext,
}

impl<'a> TransformContext<'a> {
    pub fn new(chain: &'a NodeTransformerChain, document: DocumentContext) -> Self {
        Self { chain, document }
    }

    /// Run the chain over a node list in the current scope
    pub fn transform_nodes(&mut self, nodes: Vec<TemplateNode>) -> Result<Vec<TemplateNode>, CompileError> {
        let chain = self.chain;
        nodes.into_iter().map(|node| chain.transform(node, self)).collect()
    }

    /// Run the chain over the children of block `scope_id`
    pub fn transform_within(
        &mut self,
        scope_id: &str,
        nodes: Vec<TemplateNode>,
    ) -> Result<Vec<TemplateNode>, CompileError> {
        self.document.push_scope(scope_id);
        let result = self.transform_nodes(nodes);
        self.document.pop_scope();
        result
    }

    pub fn into_document(self) -> DocumentContext {
        self.document
    }
}

/// Ordered, first-match list of node transformers
#[derive(Clone, Default)]
pub struct NodeTransformerChain {
    transformers: Vec<Arc<dyn NodeTransformer>>,
}

impl NodeTransformerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transformer; earlier registrations take precedence
    pub fn push(&mut self, transformer: Arc<dyn NodeTransformer>) {
        self.transformers.push(transformer);
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// First transformer supporting `node`
    pub fn find(&self, node: &TemplateNode) -> Option<&Arc<dyn NodeTransformer>> {
        self.transformers.iter().find(|t| t.supports(node))
    }

    /// Transform a single node
    pub fn transform(
        &self,
        node: TemplateNode,
        cx: &mut TransformContext<'_>,
    ) -> Result<TemplateNode, CompileError> {
        if let Some(transformer) = self.find(&node) {
            return transformer.transform(node, cx);
        }

        match node {
            TemplateNode::Element {
                tag,
                attributes,
                children,
            } => Ok(TemplateNode::Element {
                tag,
                attributes,
                children: cx.transform_nodes(children)?,
            }),
            TemplateNode::Component {
                name,
                attributes,
                children,
                self_closing,
            } => Ok(TemplateNode::Component {
                name,
                attributes,
                children: cx.transform_nodes(children)?,
                self_closing,
            }),
            other => Ok(other),
        }
    }

    /// Transform a whole document, returning the rewritten nodes
    pub fn run(
        &self,
        nodes: Vec<TemplateNode>,
        document: DocumentContext,
    ) -> Result<Vec<TemplateNode>, CompileError> {
        let mut cx = TransformContext::new(self, document);
        cx.transform_nodes(nodes)
    }
}
