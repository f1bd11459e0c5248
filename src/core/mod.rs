//! Core block abstractions and types
//!
//! This module defines the block handler capability set, block schemas,
//! property definitions and the schema registry, together with the small
//! id/slug helpers every other stage relies on.

pub mod block;
pub mod manifest;
pub mod property;
pub mod registry;
pub mod schema;

use heck::{ToKebabCase, ToTitleCase};
use serde_json::Value;
use uuid::Uuid;

pub use block::{Accepts, Attributes, BlockError, BlockHandler, BlockInstance, Wrapper};
pub use property::{PropertyDefinition, PropertyType};
pub use registry::SchemaRegistry;
pub use schema::{BlockSchema, SchemaError};

/// Property values keyed by property key, in declaration order.
pub type Properties = serde_json::Map<String, Value>;

/// Canonicalize a block type string into its slug.
///
/// `"@vendor/hero"` becomes `"vendor-hero"`, `"HeroBanner"` becomes
/// `"hero-banner"`. The mapping is deterministic; the registry rejects two
/// different type strings that canonicalize to the same slug.
pub fn slugify(block_type: &str) -> String {
    block_type.to_kebab_case()
}

/// Human-readable default name for a block type: the last path segment in
/// title case (`"@vendor/hero-banner"` → `"Hero Banner"`).
pub fn default_name(block_type: &str) -> String {
    let segment = block_type
        .rsplit(|c: char| c == '/' || c == '.' || c == ':')
        .next()
        .unwrap_or(block_type);
    segment.to_title_case()
}

/// Derive a stable child id from its parent id and a local id.
///
/// The id is the first 16 bytes of a BLAKE3 hash over the length-prefixed
/// parent id and the local id, formatted as a UUID. It is a pure function of
/// its inputs, so compiled templates can be cached and re-invoked across
/// renders without ids drifting.
pub fn generate_child_id(parent_id: &str, local_id: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(parent_id.len() as u64).to_le_bytes());
    hasher.update(parent_id.as_bytes());
    hasher.update(local_id.as_bytes());
    let hash = hasher.finalize();

    let mut id_bytes = [0u8; 16];
    id_bytes.copy_from_slice(&hash.as_bytes()[0..16]);
    Uuid::from_bytes(id_bytes).to_string()
}

/// Content hash of a template source, used as its compile/cache identity.
pub fn content_hash(source: &str) -> String {
    let hash = blake3::hash(source.as_bytes());
    hash.to_hex().as_str()[..32].to_string()
}

/// Escape text for inclusion in HTML content or a quoted attribute value.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a property value as plain text.
///
/// Strings are returned as-is, `null` becomes empty, and composite values
/// fall back to their JSON form.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
