//! Property transformer chain
//!
//! Transformers are bound to property type tags. `apply_all` resolves
//! dynamic sources first, then runs the transformer bound to each property's
//! declared type, and passes everything else through untouched.
//!
//! Binding a second transformer to a tag replaces the first (last wins);
//! `register` hands back the replaced binding so callers can observe it.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::dynamic::DynamicSource;
use crate::core::schema::BlockSchema;
use crate::core::Properties;

/// Transforms a raw property value into its render-time value
pub trait PropertyTransformer: Send + Sync {
    fn transform(&self, value: Value) -> Result<Value, String>;
}

impl<F> PropertyTransformer for F
where
    F: Fn(Value) -> Result<Value, String> + Send + Sync,
{
    fn transform(&self, value: Value) -> Result<Value, String> {
        self(value)
    }
}

/// Resolves dynamic sources; every other value passes through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicSourceTransformer;

impl PropertyTransformer for DynamicSourceTransformer {
    fn transform(&self, value: Value) -> Result<Value, String> {
        match DynamicSource::parse(&value) {
            Some(source) => Ok(source?.resolve()),
            None => Ok(value),
        }
    }
}

/// Coerces numeric strings (as submitted by form inputs) into numbers
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberTransformer;

impl PropertyTransformer for NumberTransformer {
    fn transform(&self, value: Value) -> Result<Value, String> {
        match &value {
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(Value::from(i));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| format!("'{}' is not a number", s))
            }
            _ => Ok(value),
        }
    }
}

/// Coerces `"true"`/`"false"`/`"1"`/`"0"`/`"on"`/`"off"` into booleans
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanTransformer;

impl PropertyTransformer for BooleanTransformer {
    fn transform(&self, value: Value) -> Result<Value, String> {
        match &value {
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "off" | "no" | "" => Ok(Value::Bool(false)),
                other => Err(format!("'{}' is not a boolean", other)),
            },
            Value::Number(n) => Ok(Value::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(false))),
            _ => Ok(value),
        }
    }
}

/// A transformer failed on a property
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Transform failed for property '{key}' of '{block_type}' (block {}): {message}", .block_id.as_deref().unwrap_or("?"))]
pub struct TransformError {
    pub block_id: Option<String>,
    pub block_type: String,
    pub key: String,
    pub message: String,
}

impl TransformError {
    /// Attach the id of the block being rendered
    pub fn with_block_id(mut self, id: impl Into<String>) -> Self {
        self.block_id = Some(id.into());
        self
    }
}

/// Type-tag keyed transformer bindings
#[derive(Clone, Default)]
pub struct PropertyTransformers {
    bindings: HashMap<String, Arc<dyn PropertyTransformer>>,
    dynamic: DynamicSourceTransformer,
}

impl PropertyTransformers {
    /// Empty chain: only dynamic-source resolution
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with the `number` and `boolean` coercions bound
    pub fn with_defaults() -> Self {
        let mut chain = Self::new();
        chain.register("number", NumberTransformer);
        chain.register("boolean", BooleanTransformer);
        chain
    }

    /// Bind a transformer to a type tag, returning the binding it replaced
    pub fn register<T>(
        &mut self,
        type_tag: impl Into<String>,
        transformer: T,
    ) -> Option<Arc<dyn PropertyTransformer>>
    where
        T: PropertyTransformer + 'static,
    {
        self.register_arc(type_tag, Arc::new(transformer))
    }

    pub fn register_arc(
        &mut self,
        type_tag: impl Into<String>,
        transformer: Arc<dyn PropertyTransformer>,
    ) -> Option<Arc<dyn PropertyTransformer>> {
        let type_tag = type_tag.into();
        let previous = self.bindings.insert(type_tag.clone(), transformer);
        if previous.is_some() {
            debug!(type_tag = %type_tag, "property transformer replaced");
        }
        previous
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.bindings.contains_key(type_tag)
    }

    pub fn get(&self, type_tag: &str) -> Option<&Arc<dyn PropertyTransformer>> {
        self.bindings.get(type_tag)
    }

    /// Transform one property value of `schema`
    pub fn transform_value(
        &self,
        key: &str,
        value: Value,
        schema: &BlockSchema,
    ) -> Result<Value, TransformError> {
        let fail = |message: String| TransformError {
            block_id: None,
            block_type: schema.slug.clone(),
            key: key.to_string(),
            message,
        };

        if DynamicSource::is_marked(&value) {
            return self.dynamic.transform(value).map_err(fail);
        }

        let transformer = schema
            .property(key)
            .and_then(|p| self.bindings.get(p.property_type.as_str()));
        match transformer {
            Some(transformer) => transformer.transform(value).map_err(fail),
            None => Ok(value),
        }
    }

    /// Transform every property, preserving key order
    pub fn apply_all(
        &self,
        properties: &Properties,
        schema: &BlockSchema,
    ) -> Result<Properties, TransformError> {
        properties
            .iter()
            .map(|(key, value)| {
                self.transform_value(key, value.clone(), schema)
                    .map(|v| (key.clone(), v))
            })
            .collect()
    }
}
