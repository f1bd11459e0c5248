//! Dynamic sources
//!
//! A dynamic source is a property value that names a dot-notation path into
//! a context mapping instead of carrying a literal. On the wire it is an
//! object with a single `$source` key:
//!
//! ```json
//! {"$source": {"path": "user.name", "type": "text", "context": {"user": {"name": "Ada"}}, "default": ""}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key marking a dynamic source object
pub const SOURCE_KEY: &str = "$source";

/// A deferred value resolved from a context mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicSource {
    /// Dot-notation path into the context
    pub path: String,
    /// Expected type tag of the resolved value
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub expected_type: Option<String>,
    /// Context snapshot the path is resolved against; `null` reads as empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub context: Map<String, Value>,
    /// Value used when the path is absent
    #[serde(default)]
    pub default: Value,
}

impl DynamicSource {
    pub fn new(path: impl Into<String>, expected_type: impl Into<String>, context: Value) -> Self {
        let context = match context {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            path: path.into(),
            expected_type: Some(expected_type.into()),
            context,
            default: Value::Null,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    /// Rebind the source to another context snapshot
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Whether `value` is shaped as a dynamic source (a single `$source` key)
    pub fn is_marked(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|object| object.len() == 1 && object.contains_key(SOURCE_KEY))
    }

    /// Parse a marked value. `None` when unmarked, `Some(Err)` when the
    /// descriptor under the marker is malformed.
    pub fn parse(value: &Value) -> Option<Result<Self, String>> {
        if !Self::is_marked(value) {
            return None;
        }
        let inner = value.get(SOURCE_KEY)?;
        Some(
            serde_json::from_value(inner.clone())
                .map_err(|e| format!("malformed dynamic source: {}", e)),
        )
    }

    /// Recognize a well-formed dynamic source in a raw property value
    pub fn detect(value: &Value) -> Option<Self> {
        Self::parse(value)?.ok()
    }

    /// Wire form of this source
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            SOURCE_KEY.to_string(),
            serde_json::to_value(self).unwrap_or(Value::Null),
        );
        Value::Object(object)
    }

    /// Resolve against the embedded context, falling back to the default
    pub fn resolve(&self) -> Value {
        let context = Value::Object(self.context.clone());
        data_get(&context, &self.path).unwrap_or_else(|| self.default.clone())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Look up a dot-notation path in a JSON value.
///
/// Segments index into objects by key and into arrays by position. A `*`
/// segment fans out over every element (or object value) and collects the
/// matches of the remaining path into an array. Returns `None` when any
/// segment is missing; an empty path returns the target itself.
pub fn data_get(target: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(target.clone());
    }
    let segments: Vec<&str> = path.split('.').collect();
    lookup(target, &segments)
}

fn lookup(target: &Value, segments: &[&str]) -> Option<Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(target.clone());
    };

    if *head == "*" {
        let items: Vec<&Value> = match target {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            _ => return None,
        };
        let collected = items.into_iter().filter_map(|v| lookup(v, rest)).collect();
        return Some(Value::Array(collected));
    }

    let next = match target {
        Value::Object(map) => map.get(*head),
        Value::Array(items) => head.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }?;
    lookup(next, rest)
}
