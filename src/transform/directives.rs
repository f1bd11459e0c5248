//! Built-in node transformers
//!
//! These rewrite the block syntax of source templates into compiled code:
//!
//! - `<x-blocks::text content="Hi" class="lead" />` block components
//! - `@block('text', ['content' => $title])` block directives
//! - `@region('main')` region directives
//! - `@blocksScripts` editor bootstrap (preview only)

use serde_json::Value;
use std::sync::Arc;

use super::node::{nodes_to_source, AttributeValue, NodeAttribute, NodeTransformer, TemplateNode, TransformContext};
use crate::compiler::php::{php_array, php_literal, php_string};
use crate::compiler::{CompileError, CompileInput, CompilerSet};
use crate::config::ComponentConfig;
use crate::core::registry::SchemaRegistry;
use crate::core::schema::BlockSchema;
use crate::core::escape_html;

/// Default properties of `schema` as `(key, expression)` pairs, with
/// `overrides` replacing or extending them
fn property_pairs(schema: &BlockSchema, overrides: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = schema
        .properties
        .iter()
        .map(|p| (p.key.clone(), php_literal(&p.default)))
        .collect();
    for (key, expr) in overrides {
        match pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = expr,
            None => pairs.push((key, expr)),
        }
    }
    pairs
}

fn attribute_expression(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Literal(text) => php_string(text),
        AttributeValue::Bound(expr) => expr.clone(),
        AttributeValue::Flag => "true".to_string(),
    }
}

/// Compile one block occurrence and return the generated node
fn compile_block(
    compilers: &CompilerSet,
    schema: &BlockSchema,
    explicit_id: Option<&str>,
    properties_expr: &str,
    attributes_expr: &str,
    children: Vec<TemplateNode>,
    cx: &mut TransformContext<'_>,
) -> Result<TemplateNode, CompileError> {
    let block_id = cx.document.block_id(&schema.slug, explicit_id)?;
    let children = cx.transform_within(&block_id, children)?;
    let children_code = nodes_to_source(&children);
    let content_hash = cx.document.content_hash().to_string();

    let input = CompileInput {
        schema,
        block_id: &block_id,
        content_hash: &content_hash,
        children_code: &children_code,
        properties_expr,
        attributes_expr,
        mode: cx.document.mode(),
    };
    Ok(TemplateNode::compiled(compilers.compile(&input)?))
}

/// Split directive arguments into the leading quoted string and the rest.
///
/// `'text', ['a' => 1]` yields `("text", Some("['a' => 1]"))`.
pub fn split_quoted_argument(arguments: &str) -> Option<(String, Option<&str>)> {
    let trimmed = arguments.trim();
    let mut chars = trimmed.char_indices();
    let (_, quote) = chars.next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }

    let mut value = String::new();
    let mut escaped = false;
    for (index, c) in chars {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            let rest = trimmed[index + c.len_utf8()..].trim_start();
            if rest.is_empty() {
                return Some((value, None));
            }
            let rest = rest.strip_prefix(',')?.trim();
            return Some((value, (!rest.is_empty()).then_some(rest)));
        } else {
            value.push(c);
        }
    }
    None
}

fn directive_named<'a>(node: &'a TemplateNode, aliases: &[String]) -> Option<&'a Option<String>> {
    match node {
        TemplateNode::Directive { name, arguments } if aliases.iter().any(|a| a == name) => {
            Some(arguments)
        }
        _ => None,
    }
}

fn invalid(node: &str, reason: impl Into<String>) -> CompileError {
    CompileError::InvalidNode {
        node: node.to_string(),
        reason: reason.into(),
    }
}

// ── Block components ────────────────────────────────────────────────────────

/// Rewrites `<x-{prefix}{separator}{slug}>` components into compiled blocks.
///
/// Attributes named after a schema property become property values; the
/// literal `id` attribute pins the local block id; everything else is a
/// custom HTML attribute merged onto the block's root element.
pub struct BlockComponentTransformer {
    registry: SchemaRegistry,
    compilers: Arc<CompilerSet>,
    components: ComponentConfig,
}

impl BlockComponentTransformer {
    pub fn new(registry: SchemaRegistry, compilers: Arc<CompilerSet>, components: ComponentConfig) -> Self {
        Self {
            registry,
            compilers,
            components,
        }
    }
}

impl NodeTransformer for BlockComponentTransformer {
    fn name(&self) -> &str {
        "block-component"
    }

    fn supports(&self, node: &TemplateNode) -> bool {
        matches!(node, TemplateNode::Component { name, .. } if self.components.block_slug(name).is_some())
    }

    fn transform(
        &self,
        node: TemplateNode,
        cx: &mut TransformContext<'_>,
    ) -> Result<TemplateNode, CompileError> {
        let TemplateNode::Component {
            name,
            attributes,
            children,
            ..
        } = node
        else {
            return Err(invalid(self.name(), "expected a component node"));
        };
        let slug = self
            .components
            .block_slug(&name)
            .ok_or_else(|| invalid(self.name(), format!("'{}' is not a block component", name)))?;
        let schema = self.registry.resolve(slug)?;

        let mut explicit_id = None;
        let mut properties = Vec::new();
        let mut custom = Vec::new();
        for NodeAttribute { name, value } in attributes {
            match (&value, schema.property(&name)) {
                (AttributeValue::Literal(id), _) if name == "id" => explicit_id = Some(id.clone()),
                (_, Some(_)) => properties.push((name, attribute_expression(&value))),
                _ => custom.push((name, attribute_expression(&value))),
            }
        }

        let properties_expr = php_array(property_pairs(&schema, properties));
        let attributes_expr = php_array(custom);
        compile_block(
            &self.compilers,
            &schema,
            explicit_id.as_deref(),
            &properties_expr,
            &attributes_expr,
            children,
            cx,
        )
    }
}

// ── Block directives ────────────────────────────────────────────────────────

/// Rewrites `@block('slug', [...])` into a compiled block.
///
/// The optional second argument is an array expression merged over the
/// schema defaults at render time.
pub struct BlockDirectiveTransformer {
    registry: SchemaRegistry,
    compilers: Arc<CompilerSet>,
    aliases: Vec<String>,
}

impl BlockDirectiveTransformer {
    pub fn new(registry: SchemaRegistry, compilers: Arc<CompilerSet>, aliases: Vec<String>) -> Self {
        Self {
            registry,
            compilers,
            aliases,
        }
    }
}

impl NodeTransformer for BlockDirectiveTransformer {
    fn name(&self) -> &str {
        "block-directive"
    }

    fn supports(&self, node: &TemplateNode) -> bool {
        directive_named(node, &self.aliases).is_some()
    }

    fn transform(
        &self,
        node: TemplateNode,
        cx: &mut TransformContext<'_>,
    ) -> Result<TemplateNode, CompileError> {
        let arguments = directive_named(&node, &self.aliases)
            .and_then(|args| args.as_deref())
            .ok_or_else(|| invalid(self.name(), "missing block type argument"))?;
        let (slug, extra) = split_quoted_argument(arguments)
            .ok_or_else(|| invalid(self.name(), format!("cannot parse arguments '{}'", arguments)))?;
        let schema = self.registry.resolve(&slug)?;

        let defaults = php_array(property_pairs(&schema, Vec::new()));
        let properties_expr = match extra {
            Some(expr) => format!("array_merge({}, {})", defaults, expr),
            None => defaults,
        };
        compile_block(&self.compilers, &schema, None, &properties_expr, "[]", Vec::new(), cx)
    }
}

// ── Regions and scripts ─────────────────────────────────────────────────────

/// Rewrites `@region('name')` into a call rendering that region's blocks
pub struct RegionDirectiveTransformer {
    aliases: Vec<String>,
}

impl RegionDirectiveTransformer {
    pub fn new(aliases: Vec<String>) -> Self {
        Self { aliases }
    }
}

impl NodeTransformer for RegionDirectiveTransformer {
    fn name(&self) -> &str {
        "region-directive"
    }

    fn supports(&self, node: &TemplateNode) -> bool {
        directive_named(node, &self.aliases).is_some()
    }

    fn transform(
        &self,
        node: TemplateNode,
        cx: &mut TransformContext<'_>,
    ) -> Result<TemplateNode, CompileError> {
        let arguments = directive_named(&node, &self.aliases)
            .and_then(|args| args.as_deref())
            .ok_or_else(|| invalid(self.name(), "missing region name"))?;
        let (region, _) = split_quoted_argument(arguments)
            .ok_or_else(|| invalid(self.name(), format!("cannot parse arguments '{}'", arguments)))?;

        let call = format!("<?php echo $__blocks->renderRegion({}); ?>", php_string(&region));
        let source = if cx.document.mode().is_preview() {
            format!(
                "<div data-blocks-region=\"{}\">{}</div>",
                escape_html(&region),
                call
            )
        } else {
            call
        };
        Ok(TemplateNode::compiled(source))
    }
}

/// Emits the editor bootstrap view in preview mode and nothing otherwise
pub struct ScriptsDirectiveTransformer {
    aliases: Vec<String>,
    view: String,
}

impl ScriptsDirectiveTransformer {
    pub fn new(aliases: Vec<String>, view: impl Into<String>) -> Self {
        Self {
            aliases,
            view: view.into(),
        }
    }
}

impl NodeTransformer for ScriptsDirectiveTransformer {
    fn name(&self) -> &str {
        "scripts-directive"
    }

    fn supports(&self, node: &TemplateNode) -> bool {
        directive_named(node, &self.aliases).is_some()
    }

    fn transform(
        &self,
        _node: TemplateNode,
        cx: &mut TransformContext<'_>,
    ) -> Result<TemplateNode, CompileError> {
        if !cx.document.mode().is_preview() {
            return Ok(TemplateNode::compiled(""));
        }
        let data = php_array([
            ("source".to_string(), "$__blocksSource".to_string()),
            ("contentHash".to_string(), php_literal(&Value::from(cx.document.content_hash()))),
        ]);
        Ok(TemplateNode::compiled(format!(
            "<?php echo $__env->make({}, {})->render(); ?>",
            php_string(&self.view),
            data
        )))
    }
}
