//! Builder configuration
//!
//! All values are resolved strings; nothing here reads HTTP or the host
//! framework's configuration format. Every field has a default, so an empty
//! TOML document yields `BuilderConfig::default()`.
//!
//! ```toml
//! [directives]
//! block = ["block"]
//! region = ["region", "blocks"]
//!
//! [components]
//! prefix = "blocks"
//!
//! [preview]
//! query_parameter = "_preview"
//! ```

use serde::Deserialize;
use std::path::Path;
use url::form_urlencoded;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub directives: DirectiveConfig,
    pub components: ComponentConfig,
    pub preview: PreviewConfig,
    pub store: StoreConfig,
}

impl BuilderConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

/// Directive name aliases
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectiveConfig {
    /// `@block('type', [...])`
    pub block: Vec<String>,
    /// `@region('name')`
    pub region: Vec<String>,
    /// Editor script bootstrap
    pub scripts: Vec<String>,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            block: vec!["block".to_string()],
            region: vec!["region".to_string(), "blocks".to_string()],
            scripts: vec!["blocksScripts".to_string()],
        }
    }
}

/// Component namespace for block components (`<x-blocks::text />`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    pub prefix: String,
    pub separator: String,
}

impl ComponentConfig {
    /// Block slug named by a component, if it lives under the prefix
    pub fn block_slug<'a>(&self, component: &'a str) -> Option<&'a str> {
        component
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(self.separator.as_str()))
            .filter(|slug| !slug.is_empty())
    }
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            prefix: "blocks".to_string(),
            separator: "::".to_string(),
        }
    }
}

/// Preview (live editing) mode
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Query parameter that switches a request into preview mode
    pub query_parameter: String,
    /// View that bootstraps the editor scripts
    pub view: String,
}

impl PreviewConfig {
    /// Whether a raw query string requests preview mode.
    ///
    /// Names and values are form-decoded (`+` and `%XX`) before matching.
    /// The parameter counts when present without a value or with any value
    /// other than `0`, `false`, `off` or `no` (in any letter case).
    pub fn is_requested(&self, query: &str) -> bool {
        let query = query.trim_start_matches('?');
        form_urlencoded::parse(query.as_bytes()).any(|(name, value)| {
            let value = value.trim();
            name == self.query_parameter.as_str()
                && !["0", "false", "off", "no"]
                    .iter()
                    .any(|off| value.eq_ignore_ascii_case(off))
        })
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            query_parameter: "_preview".to_string(),
            view: "blocks::preview".to_string(),
        }
    }
}

/// Block data store settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Extension of a template's sibling data file
    /// (`page.blade.php` → `page.blocks.json`)
    pub data_extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_extension: "blocks.json".to_string(),
        }
    }
}
