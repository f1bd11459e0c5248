//! Declarative block manifests
//!
//! Discovery turns each `*.json` / `*.toml` manifest in a block directory
//! into a `ManifestBlock` handler. A manifest carries the schema metadata and
//! a small template where `{{ key }}` inserts an escaped property value,
//! `{!! key !!}` inserts it raw, and `children` names the rendered children.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::Path;

use super::block::{Accepts, BlockError, BlockHandler, BlockInstance, Wrapper};
use super::property::PropertyDefinition;
use super::{default_name, escape_html};
use crate::categories::BlockCategory;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockManifest {
    #[serde(rename = "type", default)]
    block_type: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    category: Option<BlockCategory>,
    #[serde(default)]
    properties: Vec<PropertyDefinition>,
    #[serde(default)]
    accepts: Accepts,
    #[serde(default)]
    wrapper: Option<Wrapper>,
    template: String,
}

/// Block handler backed by a manifest file
#[derive(Debug, Clone)]
pub struct ManifestBlock {
    block_type: String,
    name: String,
    description: String,
    icon: String,
    category: BlockCategory,
    properties: Vec<PropertyDefinition>,
    accepts: Accepts,
    wrapper: Option<Wrapper>,
    template: String,
}

impl ManifestBlock {
    /// Load a manifest; the type defaults to `@{namespace}/{file stem}`.
    pub fn load(path: &Path, namespace: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;

        let manifest: BlockManifest = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&raw)
                .with_context(|| format!("parsing JSON manifest {}", path.display()))?,
            Some("toml") => toml::from_str(&raw)
                .with_context(|| format!("parsing TOML manifest {}", path.display()))?,
            _ => bail!("unsupported manifest extension: {}", path.display()),
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("manifest has no usable file name: {}", path.display()))?;
        let block_type = manifest
            .block_type
            .unwrap_or_else(|| format!("@{}/{}", namespace, stem));

        Ok(Self {
            name: manifest.name.unwrap_or_else(|| default_name(&block_type)),
            description: manifest.description,
            icon: manifest.icon.unwrap_or_else(|| "square".to_string()),
            category: manifest.category.unwrap_or(BlockCategory::Content),
            properties: manifest.properties,
            accepts: manifest.accepts,
            wrapper: manifest.wrapper,
            template: manifest.template,
            block_type,
        })
    }

    fn placeholder(&self, key: &str, raw: bool, instance: &BlockInstance) -> String {
        if key == "children" {
            return instance.children.clone();
        }
        let text = instance.text(key);
        if raw {
            text
        } else {
            escape_html(&text)
        }
    }
}

impl BlockHandler for ManifestBlock {
    fn block_type(&self) -> &str {
        &self.block_type
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn properties(&self) -> Vec<PropertyDefinition> {
        self.properties.clone()
    }

    fn accepts(&self) -> Accepts {
        self.accepts.clone()
    }

    fn icon(&self) -> String {
        self.icon.clone()
    }

    fn category(&self) -> BlockCategory {
        self.category.clone()
    }

    fn wrapper(&self) -> Option<Wrapper> {
        self.wrapper.clone()
    }

    fn render(&self, instance: &BlockInstance) -> Result<String, BlockError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        loop {
            let escaped = rest.find("{{");
            let raw = rest.find("{!!");
            let (start, open, close, is_raw) = match (escaped, raw) {
                (Some(e), Some(r)) if r < e => (r, "{!!", "!!}", true),
                (Some(e), _) => (e, "{{", "}}", false),
                (None, Some(r)) => (r, "{!!", "!!}", true),
                (None, None) => break,
            };

            out.push_str(&rest[..start]);
            let after_open = &rest[start + open.len()..];
            let Some(end) = after_open.find(close) else {
                return Err(BlockError::RenderFailed(format!(
                    "unterminated '{}' in template of '{}'",
                    open, self.block_type
                )));
            };
            let key = after_open[..end].trim();
            out.push_str(&self.placeholder(key, is_raw, instance));
            rest = &after_open[end + close.len()..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_manifest(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_toml_manifest_defaults_type_from_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            dir.path(),
            "hero.toml",
            r#"
template = "<h1>{{ title }}</h1>{!! children !!}"

[[properties]]
key = "title"
type = "text"
default = "Welcome"
"#,
        );

        let block = ManifestBlock::load(&path, "acme").unwrap();
        assert_eq!(block.block_type(), "@acme/hero");
        assert_eq!(block.slug(), "acme-hero");
        assert_eq!(block.name(), "Hero");
        assert_eq!(block.properties().len(), 1);
    }

    #[test]
    fn test_manifest_render_escapes_and_splices_children() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            dir.path(),
            "card.json",
            r#"{"type": "card", "template": "<div>{{ title }}|{!! body !!}|{{ children }}</div>"}"#,
        );
        let block = ManifestBlock::load(&path, "acme").unwrap();

        let mut instance = BlockInstance::default();
        instance.properties.insert("title".into(), json!("<b>"));
        instance.properties.insert("body".into(), json!("<i>x</i>"));
        instance.children = "<p>child</p>".into();

        assert_eq!(
            block.render(&instance).unwrap(),
            "<div>&lt;b&gt;|<i>x</i>|<p>child</p></div>"
        );
    }

    #[test]
    fn test_unterminated_placeholder_fails_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "bad.json", r#"{"template": "{{ title"}"#);
        let block = ManifestBlock::load(&path, "acme").unwrap();
        assert!(block.render(&BlockInstance::default()).is_err());
    }

    #[test]
    fn test_manifest_without_template_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "empty.json", r#"{"name": "Empty"}"#);
        assert!(ManifestBlock::load(&path, "acme").is_err());
    }
}
