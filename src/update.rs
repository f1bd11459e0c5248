//! Update reconciler
//!
//! Pure views over an editor update payload:
//!
//! ```json
//! {
//!   "blocks":  {"b1": {"id": "b1", "type": "text", ...}},
//!   "regions": [{"name": "main", "blocks": ["b1"]}],
//!   "changes": {"added": [], "updated": ["b1"], "removed": [], "moved": {}}
//! }
//! ```
//!
//! Nothing here mutates stored state. The caller applies the computed delta.
//! `moved` instructions are opaque and only reported.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::store::{BlockDocument, BlockRecord, DocumentError, Region};

/// Invalid update payloads
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpdateError {
    #[error("Malformed update payload: {0}")]
    Malformed(String),

    #[error("Invalid block '{id}' in update snapshot: {reason}")]
    InvalidBlock { id: String, reason: String },

    #[error("Changed block '{0}' is missing from the update snapshot")]
    MissingBlock(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Change sets of an update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub updated: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
    /// Block id to placement instruction
    #[serde(default)]
    pub moved: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Editor update payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Full current snapshot keyed by id
    #[serde(default)]
    pub blocks: Map<String, Value>,
    /// Ordered top-level placements
    #[serde(default)]
    pub regions: Vec<Value>,
    #[serde(default)]
    pub changes: Changes,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Net effect of an update
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDelta {
    /// Snapshot records to write (added or updated, not removed)
    pub upserts: Vec<BlockRecord>,
    pub removals: Vec<String>,
    /// Placement instructions, passed through untouched
    pub moved: Map<String, Value>,
    /// Blocks to re-render
    pub affected: Vec<String>,
}

fn push_unique<'a>(seen: &mut HashSet<&'a str>, out: &mut Vec<String>, id: &'a str) {
    if seen.insert(id) {
        out.push(id.to_string());
    }
}

impl UpdateRequest {
    /// Build from the wire form, checking every snapshot entry is a record
    pub fn from_json(value: Value) -> Result<Self, UpdateError> {
        let request: UpdateRequest =
            serde_json::from_value(value).map_err(|e| UpdateError::Malformed(e.to_string()))?;
        for (id, block) in &request.blocks {
            serde_json::from_value::<BlockRecord>(block.clone()).map_err(|e| {
                UpdateError::InvalidBlock {
                    id: id.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(request)
    }

    pub fn from_json_str(source: &str) -> Result<Self, UpdateError> {
        let value: Value =
            serde_json::from_str(source).map_err(|e| UpdateError::Malformed(e.to_string()))?;
        Self::from_json(value)
    }

    /// Wire form; unknown fields are written back
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn added(&self) -> &[String] {
        &self.changes.added
    }

    pub fn updated(&self) -> &[String] {
        &self.changes.updated
    }

    pub fn removed(&self) -> &[String] {
        &self.changes.removed
    }

    pub fn moved(&self) -> &Map<String, Value> {
        &self.changes.moved
    }

    pub fn moved_ids(&self) -> Vec<&str> {
        self.changes.moved.keys().map(String::as_str).collect()
    }

    /// Deduplicated union of added, updated, removed and moved ids, in
    /// that order of first appearance
    pub fn changed_blocks(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let ids = self
            .changes
            .added
            .iter()
            .chain(&self.changes.updated)
            .chain(&self.changes.removed)
            .chain(self.changes.moved.keys());
        for id in ids {
            push_unique(&mut seen, &mut out, id);
        }
        out
    }

    pub fn has_changes(&self) -> bool {
        !self.changed_blocks().is_empty()
    }

    /// Snapshot record by id
    pub fn block(&self, id: &str) -> Result<Option<BlockRecord>, UpdateError> {
        let Some(value) = self.blocks.get(id) else {
            return Ok(None);
        };
        let mut record: BlockRecord =
            serde_json::from_value(value.clone()).map_err(|e| UpdateError::InvalidBlock {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        if record.id.is_empty() {
            record.id = id.to_string();
        }
        Ok(Some(record))
    }

    /// Records to write: added and updated blocks that were not removed
    pub fn upserts(&self) -> Result<Vec<BlockRecord>, UpdateError> {
        let removed: HashSet<&str> = self.changes.removed.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for id in self.changes.added.iter().chain(&self.changes.updated) {
            if !removed.contains(id.as_str()) {
                push_unique(&mut seen, &mut ids, id);
            }
        }
        ids.into_iter()
            .map(|id| self.block(&id)?.ok_or(UpdateError::MissingBlock(id)))
            .collect()
    }

    /// Deduplicated removed ids
    pub fn removals(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for id in &self.changes.removed {
            push_unique(&mut seen, &mut out, id);
        }
        out
    }

    /// Changed ids followed by their ancestors in the snapshot.
    ///
    /// Re-rendering these covers every block whose output can differ.
    pub fn affected_blocks(&self) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        for id in self.changed_blocks() {
            let mut current = Some(id);
            while let Some(id) = current {
                if !seen.insert(id.clone()) {
                    break;
                }
                current = self
                    .blocks
                    .get(&id)
                    .and_then(|b| b.get("parentId"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                out.push(id);
            }
        }
        out
    }

    pub fn delta(&self) -> Result<UpdateDelta, UpdateError> {
        Ok(UpdateDelta {
            upserts: self.upserts()?,
            removals: self.removals(),
            moved: self.changes.moved.clone(),
            affected: self.affected_blocks(),
        })
    }

    /// Validated document of the snapshot
    pub fn document(&self) -> Result<BlockDocument, UpdateError> {
        let records = self
            .blocks
            .keys()
            .filter_map(|id| self.block(id).transpose())
            .collect::<Result<Vec<_>, _>>()?;
        let regions = self
            .regions
            .iter()
            .map(|r| {
                serde_json::from_value::<Region>(r.clone())
                    .map_err(|e| UpdateError::Malformed(format!("region: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BlockDocument::new(records, regions).map_err(DocumentError::from)?)
    }
}
