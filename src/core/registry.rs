//! Schema Registry - Central registry for block schemas
//!
//! This module provides a thread-safe registry of block schemas keyed by
//! slug. It supports:
//! - Registration with an explicit duplicate policy
//! - Lookup by slug, type string, category or search query
//! - Accepted-children checks between registered types
//! - Directory discovery of declarative block manifests
//!
//! Registration is a bootstrap-phase activity. Once `seal` is called the
//! registry is read-only and further registrations fail.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::block::BlockHandler;
use super::manifest::ManifestBlock;
use super::schema::{BlockSchema, SchemaError, SchemaSummary};
use crate::categories::BlockCategory;

/// What happens when a slug is registered twice for the same type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail with `SchemaError::Duplicate`
    #[default]
    Reject,
    /// Replace the existing schema
    Replace,
}

/// Block schema registry
///
/// The registry uses `Arc<RwLock<BTreeMap>>` so clones share state and
/// listings come back sorted by slug.
#[derive(Clone)]
pub struct SchemaRegistry {
    schemas: Arc<RwLock<BTreeMap<String, Arc<BlockSchema>>>>,
    policy: DuplicatePolicy,
    sealed: Arc<AtomicBool>,
}

impl SchemaRegistry {
    /// Create a new empty registry that rejects duplicates
    ///
    /// # Example
    /// ```
    /// use block_builder::core::registry::SchemaRegistry;
    ///
    /// let registry = SchemaRegistry::new();
    /// assert_eq!(registry.count(), 0);
    /// ```
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::Reject)
    }

    /// Create a new empty registry with the given duplicate policy
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            schemas: Arc::new(RwLock::new(BTreeMap::new())),
            policy,
            sealed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Register a schema
    ///
    /// # Returns
    /// * `Ok(Arc<BlockSchema>)` with the stored schema
    /// * `Err(SchemaError::Duplicate)` when the slug exists and the policy rejects
    /// * `Err(SchemaError::SlugCollision)` when a different type owns the slug
    /// * `Err(SchemaError::Sealed)` after bootstrap
    pub fn register(&self, schema: BlockSchema) -> Result<Arc<BlockSchema>, SchemaError> {
        if self.is_sealed() {
            return Err(SchemaError::Sealed(schema.slug));
        }

        let mut schemas = self.schemas.write();
        if let Some(existing) = schemas.get(&schema.slug) {
            if existing.block_type != schema.block_type {
                return Err(SchemaError::SlugCollision {
                    slug: schema.slug.clone(),
                    existing: existing.block_type.clone(),
                    incoming: schema.block_type.clone(),
                });
            }
            match self.policy {
                DuplicatePolicy::Reject => return Err(SchemaError::Duplicate(schema.slug)),
                DuplicatePolicy::Replace => {
                    info!(slug = %schema.slug, "replacing registered block schema");
                }
            }
        }

        debug!(slug = %schema.slug, block_type = %schema.block_type, "registered block schema");
        let schema = Arc::new(schema);
        schemas.insert(schema.slug.clone(), schema.clone());
        Ok(schema)
    }

    /// Build a schema from a handler and register it
    pub fn register_handler(
        &self,
        handler: Arc<dyn BlockHandler>,
    ) -> Result<Arc<BlockSchema>, SchemaError> {
        self.register(BlockSchema::from_handler(handler)?)
    }

    /// Get a schema by slug
    pub fn get(&self, slug: &str) -> Result<Arc<BlockSchema>, SchemaError> {
        self.schemas
            .read()
            .get(slug)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(slug.to_string()))
    }

    /// Get a schema by its original type string (e.g. `"@vendor/hero"`)
    pub fn get_by_type(&self, block_type: &str) -> Result<Arc<BlockSchema>, SchemaError> {
        self.schemas
            .read()
            .values()
            .find(|s| s.block_type == block_type)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(block_type.to_string()))
    }

    /// Resolve either a slug or a type string
    pub fn resolve(&self, key: &str) -> Result<Arc<BlockSchema>, SchemaError> {
        self.get(key).or_else(|_| self.get_by_type(key))
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.schemas.read().contains_key(slug)
    }

    /// All schemas, sorted by slug
    pub fn all(&self) -> Vec<Arc<BlockSchema>> {
        self.schemas.read().values().cloned().collect()
    }

    /// Schemas in a category
    pub fn by_category(&self, category: &BlockCategory) -> Vec<Arc<BlockSchema>> {
        self.schemas
            .read()
            .values()
            .filter(|s| &s.category == category)
            .cloned()
            .collect()
    }

    /// Case-insensitive search over slug, name and description
    pub fn search(&self, query: &str) -> Vec<Arc<BlockSchema>> {
        let query = query.to_lowercase();
        self.schemas
            .read()
            .values()
            .filter(|s| {
                s.slug.contains(&query)
                    || s.name.to_lowercase().contains(&query)
                    || s.description.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// Whether `parent` accepts `child` as a direct child.
    /// Unknown parents accept nothing.
    pub fn accepts(&self, parent: &str, child: &str) -> bool {
        match self.resolve(parent) {
            Ok(schema) => schema.accepts.allows(child),
            Err(_) => false,
        }
    }

    /// Editor palette metadata for every schema
    pub fn summaries(&self) -> Vec<SchemaSummary> {
        self.schemas.read().values().map(|s| s.summary()).collect()
    }

    pub fn count(&self) -> usize {
        self.schemas.read().len()
    }

    /// End the bootstrap phase; the registry is read-only afterwards
    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::SeqCst) {
            info!(schemas = self.count(), "schema registry sealed");
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// Scan `directory` recursively for block manifests and register each.
    ///
    /// A malformed manifest or a failed registration is recorded in the
    /// report and the scan continues with the next file.
    pub fn discover(&self, namespace: &str, directory: impl AsRef<Path>) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        let mut files = Vec::new();
        collect_manifest_files(directory.as_ref(), &mut files, &mut report);
        files.sort();

        for path in files {
            let handler = match ManifestBlock::load(&path, namespace) {
                Ok(handler) => handler,
                Err(e) => {
                    report.push_warning(path, format!("{:#}", e));
                    continue;
                }
            };
            match self.register_handler(Arc::new(handler)) {
                Ok(schema) => report.registered.push(schema.slug.clone()),
                Err(e) => report.push_warning(path, e.to_string()),
            }
        }

        info!(
            namespace,
            registered = report.registered.len(),
            warnings = report.warnings.len(),
            "block discovery finished"
        );
        report
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_manifest_files(dir: &Path, files: &mut Vec<PathBuf>, report: &mut DiscoveryReport) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            report.push_warning(dir.to_path_buf(), format!("cannot read directory: {}", e));
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_manifest_files(&path, files, report);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("json") | Some("toml")
        ) {
            files.push(path);
        }
    }
}

/// A block definition that could not be registered during discovery
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Cannot register block from {}: {reason}", .path.display())]
pub struct RegistrationError {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a discovery scan
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Slugs registered, in scan order
    pub registered: Vec<String>,
    /// Non-fatal failures
    pub warnings: Vec<RegistrationError>,
}

impl DiscoveryReport {
    fn push_warning(&mut self, path: PathBuf, reason: String) {
        warn!(path = %path.display(), %reason, "skipping block definition");
        self.warnings.push(RegistrationError { path, reason });
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
