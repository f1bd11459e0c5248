//! Property system for block schemas
//!
//! Properties are the typed, editable values of a block. A schema declares
//! them in order with a type tag, a default value and type-specific
//! constraints such as the option list of a select.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property type tag
///
/// Serialized as a lowercase string (`"text"`, `"select"`, ...). Unknown tags
/// are kept as `Custom` so projects can bind their own transformers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    /// Single-line text
    Text,
    /// Multi-line text
    Textarea,
    /// Rich text / HTML
    RichText,
    /// Numeric value
    Number,
    /// Boolean toggle
    Boolean,
    /// One of a fixed option list
    Select,
    /// Color value
    Color,
    /// Image reference
    Image,
    /// Link target
    Link,
    /// Arbitrary JSON
    Json,
    /// Project-defined type tag
    Custom(String),
}

impl PropertyType {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::Text => "text",
            PropertyType::Textarea => "textarea",
            PropertyType::RichText => "richtext",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Select => "select",
            PropertyType::Color => "color",
            PropertyType::Image => "image",
            PropertyType::Link => "link",
            PropertyType::Json => "json",
            PropertyType::Custom(tag) => tag,
        }
    }
}

impl From<&str> for PropertyType {
    fn from(tag: &str) -> Self {
        match tag {
            "text" => PropertyType::Text,
            "textarea" => PropertyType::Textarea,
            "richtext" => PropertyType::RichText,
            "number" => PropertyType::Number,
            "boolean" => PropertyType::Boolean,
            "select" => PropertyType::Select,
            "color" => PropertyType::Color,
            "image" => PropertyType::Image,
            "link" => PropertyType::Link,
            "json" => PropertyType::Json,
            other => PropertyType::Custom(other.to_string()),
        }
    }
}

impl From<String> for PropertyType {
    fn from(tag: String) -> Self {
        PropertyType::from(tag.as_str())
    }
}

impl From<PropertyType> for String {
    fn from(ty: PropertyType) -> Self {
        ty.as_str().to_string()
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Option of a select property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Property definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    /// Key, unique within a schema
    pub key: String,
    /// Editor label (defaults to the key)
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default)]
    pub default: Value,
    /// Allowed options (selects)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Minimum value (numbers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum value (numbers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Maximum length (text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Help text for the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl PropertyDefinition {
    pub fn new(key: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            key: key.into(),
            label: None,
            property_type,
            default: Value::Null,
            options: Vec::new(),
            min: None,
            max: None,
            max_length: None,
            help: None,
        }
    }

    /// Text property with a default
    pub fn text(key: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(key, PropertyType::Text).with_default(Value::String(default.into()))
    }

    /// Multi-line text property with a default
    pub fn textarea(key: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(key, PropertyType::Textarea).with_default(Value::String(default.into()))
    }

    /// Number property with a default
    pub fn number(key: impl Into<String>, default: f64) -> Self {
        Self::new(key, PropertyType::Number).with_default(serde_json::json!(default))
    }

    /// Boolean property with a default
    pub fn boolean(key: impl Into<String>, default: bool) -> Self {
        Self::new(key, PropertyType::Boolean).with_default(Value::Bool(default))
    }

    /// Select property with its options and default
    pub fn select(key: impl Into<String>, options: Vec<SelectOption>, default: impl Into<Value>) -> Self {
        let mut def = Self::new(key, PropertyType::Select).with_default(default.into());
        def.options = options;
        def
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Editor label, falling back to the key
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }

    /// Validate a literal value against this definition
    ///
    /// `null` is always accepted (the default applies). Custom type tags are
    /// not checked.
    pub fn validate(&self, value: &Value) -> ValidationResult {
        if value.is_null() {
            return ValidationResult::ok();
        }

        match &self.property_type {
            PropertyType::Text
            | PropertyType::Textarea
            | PropertyType::RichText
            | PropertyType::Color
            | PropertyType::Image
            | PropertyType::Link => {
                let Some(s) = value.as_str() else {
                    return ValidationResult::error(format!(
                        "Property '{}' expects a string",
                        self.key
                    ));
                };
                if let Some(max) = self.max_length {
                    if s.chars().count() > max {
                        return ValidationResult::error(format!(
                            "Property '{}' exceeds {} characters",
                            self.key, max
                        ));
                    }
                }
                ValidationResult::ok()
            }
            PropertyType::Number => {
                let Some(n) = value.as_f64() else {
                    return ValidationResult::error(format!(
                        "Property '{}' expects a number",
                        self.key
                    ));
                };
                let mut result = ValidationResult::ok();
                if let Some(min) = self.min {
                    if n < min {
                        result = result.merge(ValidationResult::error(format!(
                            "Property '{}' must be >= {}",
                            self.key, min
                        )));
                    }
                }
                if let Some(max) = self.max {
                    if n > max {
                        result = result.merge(ValidationResult::error(format!(
                            "Property '{}' must be <= {}",
                            self.key, max
                        )));
                    }
                }
                result
            }
            PropertyType::Boolean => {
                if value.is_boolean() {
                    ValidationResult::ok()
                } else {
                    ValidationResult::error(format!("Property '{}' expects a boolean", self.key))
                }
            }
            PropertyType::Select => {
                if self.options.is_empty() {
                    return ValidationResult::ok()
                        .with_warning(format!("Select property '{}' has no options", self.key));
                }
                if self.options.iter().any(|o| &o.value == value) {
                    ValidationResult::ok()
                } else {
                    ValidationResult::error(format!(
                        "Property '{}' must be one of the declared options",
                        self.key
                    ))
                }
            }
            PropertyType::Json | PropertyType::Custom(_) => ValidationResult::ok(),
        }
    }
}

/// Validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether validation passed
    pub valid: bool,
    /// Error messages
    pub errors: Vec<String>,
    /// Warning messages
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Create a validation result with an error
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![msg.into()],
            warnings: Vec::new(),
        }
    }

    /// Add a warning to the validation result
    pub fn with_warning(mut self, msg: impl Into<String>) -> Self {
        self.warnings.push(msg.into());
        self
    }

    /// Check if the validation has any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Merge another validation result into this one
    pub fn merge(mut self, other: ValidationResult) -> Self {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self
    }
}
