//! Document loaders
//!
//! The store delegates the only I/O in the pipeline to a `DocumentLoader`.
//! Loaders fail fast: a missing or malformed source is a permanent error.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::document::{BlockDocument, DocumentError};
use super::LoadError;

/// Identity of a source document: a template path or a content hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    Path(PathBuf),
    Hash(String),
}

impl SourceId {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        SourceId::Path(path.into())
    }

    pub fn hash(hash: impl Into<String>) -> Self {
        SourceId::Hash(hash.into())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Path(path) => write!(f, "{}", path.display()),
            SourceId::Hash(hash) => write!(f, "#{}", hash),
        }
    }
}

/// Loads the block document for a source identity
pub trait DocumentLoader: Send + Sync {
    fn load(&self, source: &SourceId) -> Result<BlockDocument, LoadError>;
}

fn parse(source: &SourceId, text: &str) -> Result<BlockDocument, LoadError> {
    BlockDocument::from_json(text).map_err(|error| match error {
        DocumentError::Malformed(reason) => LoadError::Malformed {
            source_id: source.clone(),
            reason,
        },
        DocumentError::Tree(error) => LoadError::Tree {
            source_id: source.clone(),
            error,
        },
    })
}

/// Reads a template's sibling JSON data file
///
/// `views/page.blade.php` is backed by `views/page.blocks.json` (with the
/// default extension). A path that already ends in `.json` is read as-is.
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    data_extension: String,
}

impl JsonFileLoader {
    pub fn new(data_extension: impl Into<String>) -> Self {
        Self {
            data_extension: data_extension.into(),
        }
    }

    /// Data file backing a template path
    pub fn data_path(&self, template: &Path) -> PathBuf {
        if template.extension().is_some_and(|ext| ext == "json") {
            return template.to_path_buf();
        }
        let file_name = template
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = TEMPLATE_SUFFIXES
            .iter()
            .find_map(|suffix| file_name.strip_suffix(suffix))
            .or_else(|| file_name.rsplit_once('.').map(|(stem, _)| stem))
            .unwrap_or(file_name.as_str());
        template.with_file_name(format!("{}.{}", stem, self.data_extension))
    }
}

/// Template suffixes removed before the data extension is appended.
/// Longest first.
const TEMPLATE_SUFFIXES: &[&str] = &[".blade.php", ".php", ".html"];

impl Default for JsonFileLoader {
    fn default() -> Self {
        Self::new("blocks.json")
    }
}

impl DocumentLoader for JsonFileLoader {
    fn load(&self, source: &SourceId) -> Result<BlockDocument, LoadError> {
        let SourceId::Path(template) = source else {
            return Err(LoadError::NotFound(source.clone()));
        };
        let path = self.data_path(template);
        let text = std::fs::read_to_string(&path).map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(source.clone()),
            _ => LoadError::Io {
                source_id: source.clone(),
                error,
            },
        })?;
        parse(source, &text)
    }
}

/// In-memory JSON documents, keyed by source identity
#[derive(Debug, Default)]
pub struct MemoryLoader {
    documents: RwLock<HashMap<SourceId, String>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the JSON document for `source`
    pub fn insert(&self, source: SourceId, json: impl Into<String>) {
        self.documents.write().insert(source, json.into());
    }

    pub fn remove(&self, source: &SourceId) {
        self.documents.write().remove(source);
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, source: &SourceId) -> Result<BlockDocument, LoadError> {
        let documents = self.documents.read();
        let text = documents
            .get(source)
            .ok_or_else(|| LoadError::NotFound(source.clone()))?;
        parse(source, text)
    }
}
