//! Code generation for the host template engine
//!
//! Generated code talks to the host through three variables it provides at
//! render time: `$__blocks` (the block runtime bound to the current source
//! document), `$__blocksSource` (the source identity) and `$__env`.

use serde_json::Value;

use super::CompileInput;
use crate::core::block::{Attributes, Wrapper};
use crate::core::escape_html;

/// Single-quoted string literal
pub fn php_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Literal for a JSON value
pub fn php_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => php_string(s),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(php_literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(map) => php_array(
            map.iter()
                .map(|(k, v)| (k.clone(), php_literal(v))),
        ),
    }
}

/// Associative array from `(key, expression)` pairs
pub fn php_array(pairs: impl IntoIterator<Item = (String, String)>) -> String {
    let entries: Vec<String> = pairs
        .into_iter()
        .map(|(key, expr)| format!("{} => {}", php_string(&key), expr))
        .collect();
    format!("[{}]", entries.join(", "))
}

/// Associative array of literal attribute values
pub fn php_attributes(attributes: &Attributes) -> String {
    php_array(
        attributes
            .iter()
            .map(|(k, v)| (k.clone(), php_string(v))),
    )
}

fn variable(block_id: &str) -> String {
    let sanitized: String = block_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("$__block_{}", sanitized)
}

/// Emit the code for one block occurrence
pub(crate) fn emit_block(input: &CompileInput<'_>, wrapper: Option<&Wrapper>) -> String {
    let var = variable(input.block_id);
    let id = php_string(input.block_id);
    let slug = php_string(&input.schema.slug);
    let preview = input.mode.is_preview();

    let attributes_expr = if preview {
        format!(
            "array_merge({}, ['data-block-id' => {}, 'data-block-type' => {}])",
            input.attributes_expr, id, slug
        )
    } else {
        input.attributes_expr.to_string()
    };

    let mut out = String::new();
    out.push_str(&format!(
        "<?php {var} = $__blocks->getBlock({id}, ['id' => {id}, 'type' => {slug}, 'properties' => {props}]); ?>\n",
        props = input.properties_expr,
    ));
    out.push_str(&format!("<?php if ({var} && ! {var}->disabled): ?>\n"));
    out.push_str(&format!("<?php {var}_props = $__blocks->transform({var}); ?>\n"));
    out.push_str(&format!(
        "<?php {var}_children = function () use ($__env, $__blocks, $__blocksSource) {{ ob_start(); ?>{children}<?php return ob_get_clean(); }}; ?>\n",
        children = input.children_code,
    ));
    out.push_str(&format!(
        "<?php {var}_attributes = $__blocks->attributes({attributes_expr}); ?>\n"
    ));

    match wrapper {
        Some(wrapper) => {
            out.push_str(&format!(
                "<{tag}<?php echo {var}_attributes->merge({base})->toHtml(); ?>>",
                tag = wrapper.tag,
                base = php_attributes(&wrapper.attributes),
            ));
            out.push_str(&format!(
                "<?php echo $__blocks->render({var}, {var}_props, {var}_children); ?>"
            ));
            out.push_str(&format!("</{}>\n", wrapper.tag));
        }
        None => {
            out.push_str(&format!(
                "<?php echo $__blocks->render({var}, {var}_props, {var}_children, {var}_attributes); ?>\n"
            ));
        }
    }

    if preview {
        out.push_str(&format!("<?php elseif ({var}): ?>\n"));
        out.push_str(&format!(
            "<div data-block-id=\"{}\" data-block-type=\"{}\" data-block-disabled></div>\n",
            escape_html(input.block_id),
            escape_html(&input.schema.slug),
        ));
    }
    out.push_str("<?php endif; ?>");
    out
}
