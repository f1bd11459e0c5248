//! Compiled-template cache
//!
//! Compiled output is a pure function of the template content and the
//! render mode, so it is keyed by `(content_hash, mode)` and never expires
//! on its own.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::runtime::RenderMode;

type CacheKey = (String, RenderMode);

#[derive(Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<CacheKey, Arc<String>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, content_hash: &str, mode: RenderMode) -> Option<Arc<String>> {
        self.entries
            .read()
            .get(&(content_hash.to_string(), mode))
            .cloned()
    }

    /// Return the cached output or compile and store it.
    ///
    /// Failures are not cached.
    pub fn get_or_compile<E>(
        &self,
        content_hash: &str,
        mode: RenderMode,
        compile: impl FnOnce() -> Result<String, E>,
    ) -> Result<Arc<String>, E> {
        if let Some(hit) = self.get(content_hash, mode) {
            debug!(content_hash, ?mode, "compiled template cache hit");
            return Ok(hit);
        }

        let compiled = Arc::new(compile()?);
        let mut entries = self.entries.write();
        let entry = entries
            .entry((content_hash.to_string(), mode))
            .or_insert(compiled);
        Ok(entry.clone())
    }

    /// Drop every mode compiled for a content hash
    pub fn invalidate(&self, content_hash: &str) {
        self.entries.write().retain(|(hash, _), _| hash != content_hash);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
