//! Block data store
//!
//! Process-wide map from source identity to its loaded block document.
//! Each identity owns a partition with its own lock, so loading is
//! single-flight per identity: the first caller loads while concurrent
//! callers for the same identity wait and then see the finished document.
//! Loads of different identities never contend. Failed loads leave the
//! partition empty so a later call retries.

pub mod document;
pub mod loader;
pub mod record;

pub use document::{BlockDocument, DocumentError, TreeInvariantError};
pub use loader::{DocumentLoader, JsonFileLoader, MemoryLoader, SourceId};
pub use record::{BlockRecord, Region};

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Loading a source identity failed
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("No block data for {0}")]
    NotFound(SourceId),

    #[error("Failed to read block data for {source_id}: {error}")]
    Io {
        source_id: SourceId,
        #[source]
        error: std::io::Error,
    },

    #[error("Malformed block data for {source_id}: {reason}")]
    Malformed { source_id: SourceId, reason: String },

    #[error("Invalid block tree in {source_id}: {error}")]
    Tree {
        source_id: SourceId,
        #[source]
        error: TreeInvariantError,
    },
}

#[derive(Default)]
struct Partition {
    slot: Mutex<Option<Arc<BlockDocument>>>,
    loads: AtomicUsize,
}

pub struct BlockStore {
    loader: Arc<dyn DocumentLoader>,
    partitions: RwLock<HashMap<SourceId, Arc<Partition>>>,
}

impl BlockStore {
    pub fn new(loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            loader,
            partitions: RwLock::new(HashMap::new()),
        }
    }

    fn partition(&self, source: &SourceId) -> Arc<Partition> {
        if let Some(partition) = self.partitions.read().get(source) {
            return partition.clone();
        }
        self.partitions
            .write()
            .entry(source.clone())
            .or_default()
            .clone()
    }

    fn loaded(&self, source: &SourceId) -> Option<Arc<BlockDocument>> {
        let partition = self.partitions.read().get(source).cloned()?;
        let slot = partition.slot.lock();
        slot.clone()
    }

    /// Load the document for `source` unless it is already loaded
    pub fn load_file(&self, source: &SourceId) -> Result<Arc<BlockDocument>, LoadError> {
        let partition = self.partition(source);
        let mut slot = partition.slot.lock();
        if let Some(document) = slot.as_ref() {
            debug!(source = %source, "block document already loaded");
            return Ok(document.clone());
        }

        let document = Arc::new(self.loader.load(source)?);
        partition.loads.fetch_add(1, Ordering::SeqCst);
        info!(source = %source, blocks = document.len(), "loaded block document");
        *slot = Some(document.clone());
        Ok(document)
    }

    /// Install an already-built document for `source`, replacing any loaded one
    pub fn insert(&self, source: SourceId, document: BlockDocument) -> Arc<BlockDocument> {
        let partition = self.partition(&source);
        let document = Arc::new(document);
        *partition.slot.lock() = Some(document.clone());
        document
    }

    /// Loaded document for `source`, without triggering a load
    pub fn document(&self, source: &SourceId) -> Option<Arc<BlockDocument>> {
        self.loaded(source)
    }

    /// Stored record merged over `defaults`.
    ///
    /// Only consults a loaded document. With nothing stored the defaults
    /// are returned (with `id` set) when given.
    pub fn get_block(
        &self,
        source: &SourceId,
        id: &str,
        defaults: Option<&BlockRecord>,
    ) -> Option<BlockRecord> {
        match self.loaded(source) {
            Some(document) => document.get_block(id, defaults),
            None => defaults.map(|d| BlockRecord {
                id: id.to_string(),
                ..d.clone()
            }),
        }
    }

    pub fn has_block(&self, source: &SourceId, id: &str) -> bool {
        self.loaded(source).is_some_and(|d| d.has_block(id))
    }

    /// All records of `source` in document order, loading it if needed
    pub fn get_blocks_array(&self, source: &SourceId) -> Result<Vec<BlockRecord>, LoadError> {
        Ok(self.load_file(source)?.blocks().to_vec())
    }

    pub fn is_loaded(&self, source: &SourceId) -> bool {
        self.loaded(source).is_some()
    }

    /// Number of times `source` was loaded since it was last cleared
    pub fn load_count(&self, source: &SourceId) -> usize {
        self.partitions
            .read()
            .get(source)
            .map(|p| p.loads.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Drop one partition
    pub fn forget(&self, source: &SourceId) {
        if self.partitions.write().remove(source).is_some() {
            debug!(source = %source, "block document forgotten");
        }
    }

    /// Drop every partition
    pub fn clear(&self) {
        let mut partitions = self.partitions.write();
        debug!(partitions = partitions.len(), "block store cleared");
        partitions.clear();
    }
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new(Arc::new(JsonFileLoader::default()))
    }
}
