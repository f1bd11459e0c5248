//! Block documents
//!
//! A document is the full set of block records for one source identity,
//! plus its regions. The tree is validated when the document is built, so
//! a document that exists is always a well-formed forest.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use super::record::{BlockRecord, Region};

/// Violations of the block tree structure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeInvariantError {
    #[error("Duplicate block id '{0}'")]
    DuplicateId(String),

    #[error("Block '{id}' references missing parent '{parent}'")]
    MissingParent { id: String, parent: String },

    #[error("Block '{id}' lists missing child '{child}'")]
    MissingChild { id: String, child: String },

    #[error("Block '{child}' is listed as a child of both '{first}' and '{second}'")]
    MultipleParents {
        child: String,
        first: String,
        second: String,
    },

    #[error("Block '{child}' and parent '{parent}' disagree about their relation")]
    ParentMismatch { child: String, parent: String },

    #[error("Block '{0}' is part of a parent cycle")]
    Cycle(String),

    #[error("Region '{region}' references missing block '{id}'")]
    MissingRegionBlock { region: String, id: String },

    #[error("Region '{region}' places block '{id}', which is nested under '{parent}'")]
    NestedRegionBlock {
        region: String,
        id: String,
        parent: String,
    },

    #[error("Block '{id}' is placed by both region '{first}' and region '{second}'")]
    RepeatedRegionBlock {
        id: String,
        first: String,
        second: String,
    },
}

/// Errors building a document from JSON
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("Malformed block document: {0}")]
    Malformed(String),

    #[error(transparent)]
    Tree(#[from] TreeInvariantError),
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    blocks: RawBlocks,
    #[serde(default)]
    regions: Vec<Region>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBlocks {
    Keyed(Map<String, Value>),
    Listed(Vec<BlockRecord>),
}

impl Default for RawBlocks {
    fn default() -> Self {
        RawBlocks::Listed(Vec::new())
    }
}

/// Validated block records of one source
#[derive(Debug, Clone, Default)]
pub struct BlockDocument {
    records: Vec<BlockRecord>,
    index: HashMap<String, usize>,
    regions: Vec<Region>,
}

impl BlockDocument {
    /// Build a document, validating the tree
    pub fn new(records: Vec<BlockRecord>, regions: Vec<Region>) -> Result<Self, TreeInvariantError> {
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if index.insert(record.id.clone(), position).is_some() {
                return Err(TreeInvariantError::DuplicateId(record.id.clone()));
            }
        }

        let document = Self {
            records,
            index,
            regions,
        };
        document.validate()?;
        Ok(document)
    }

    /// Parse `{"blocks": ..., "regions": [...]}`.
    ///
    /// `blocks` may be an array of records or an object keyed by id; a keyed
    /// record without an `id` takes its key.
    pub fn from_json(source: &str) -> Result<Self, DocumentError> {
        let value: Value =
            serde_json::from_str(source).map_err(|e| DocumentError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let raw: RawDocument =
            serde_json::from_value(value).map_err(|e| DocumentError::Malformed(e.to_string()))?;

        let records = match raw.blocks {
            RawBlocks::Listed(records) => records,
            RawBlocks::Keyed(map) => map
                .into_iter()
                .map(|(key, value)| {
                    let mut record: BlockRecord = serde_json::from_value(value)
                        .map_err(|e| DocumentError::Malformed(format!("block '{}': {}", key, e)))?;
                    if record.id.is_empty() {
                        record.id = key;
                    } else if record.id != key {
                        return Err(DocumentError::Malformed(format!(
                            "block keyed '{}' has id '{}'",
                            key, record.id
                        )));
                    }
                    Ok(record)
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        if let Some(record) = records.iter().find(|r| r.id.is_empty()) {
            return Err(DocumentError::Malformed(format!(
                "block of type '{}' has no id",
                record.block_type
            )));
        }

        Ok(Self::new(records, raw.regions)?)
    }

    /// Wire form: blocks keyed by id plus regions
    pub fn to_json(&self) -> Value {
        let blocks: Map<String, Value> = self
            .records
            .iter()
            .map(|r| (r.id.clone(), serde_json::to_value(r).unwrap_or(Value::Null)))
            .collect();
        serde_json::json!({
            "blocks": blocks,
            "regions": self.regions,
        })
    }

    fn validate(&self) -> Result<(), TreeInvariantError> {
        for record in &self.records {
            if let Some(parent) = &record.parent_id {
                let parent_record = self.get(parent).ok_or_else(|| TreeInvariantError::MissingParent {
                    id: record.id.clone(),
                    parent: parent.clone(),
                })?;
                if !parent_record.children.is_empty() && !parent_record.children.contains(&record.id) {
                    return Err(TreeInvariantError::ParentMismatch {
                        child: record.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let mut listed_by: HashMap<&str, &str> = HashMap::new();
        for record in &self.records {
            for child in &record.children {
                let child_record = self.get(child).ok_or_else(|| TreeInvariantError::MissingChild {
                    id: record.id.clone(),
                    child: child.clone(),
                })?;
                if let Some(first) = listed_by.insert(child.as_str(), record.id.as_str()) {
                    return Err(TreeInvariantError::MultipleParents {
                        child: child.clone(),
                        first: first.to_string(),
                        second: record.id.clone(),
                    });
                }
                if child_record.parent_id.as_deref() != Some(record.id.as_str()) {
                    return Err(TreeInvariantError::ParentMismatch {
                        child: child.clone(),
                        parent: record.id.clone(),
                    });
                }
            }
        }

        // Parent pointers are known to resolve; walk each chain once.
        let mut acyclic: HashSet<&str> = HashSet::new();
        for record in &self.records {
            let mut path: HashSet<&str> = HashSet::new();
            let mut current = Some(record);
            while let Some(node) = current {
                if acyclic.contains(node.id.as_str()) {
                    break;
                }
                if !path.insert(node.id.as_str()) {
                    return Err(TreeInvariantError::Cycle(node.id.clone()));
                }
                current = node.parent_id.as_deref().and_then(|p| self.get(p));
            }
            acyclic.extend(path);
        }

        // Regions place top-level blocks, each at most once.
        let mut placed_by: HashMap<&str, &str> = HashMap::new();
        for region in &self.regions {
            for id in &region.blocks {
                let Some(record) = self.get(id) else {
                    return Err(TreeInvariantError::MissingRegionBlock {
                        region: region.name.clone(),
                        id: id.clone(),
                    });
                };
                if let Some(parent) = &record.parent_id {
                    return Err(TreeInvariantError::NestedRegionBlock {
                        region: region.name.clone(),
                        id: id.clone(),
                        parent: parent.clone(),
                    });
                }
                if let Some(first) = placed_by.insert(id.as_str(), region.name.as_str()) {
                    return Err(TreeInvariantError::RepeatedRegionBlock {
                        id: id.clone(),
                        first: first.to_string(),
                        second: region.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Stored record by id
    pub fn get(&self, id: &str) -> Option<&BlockRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Stored record merged over `defaults`.
    ///
    /// An unknown id yields the defaults (with `id` set) when given, else
    /// `None`.
    pub fn get_block(&self, id: &str, defaults: Option<&BlockRecord>) -> Option<BlockRecord> {
        match (self.get(id), defaults) {
            (Some(stored), Some(defaults)) => Some(stored.merged_over(defaults)),
            (Some(stored), None) => Some(stored.clone()),
            (None, Some(defaults)) => Some(BlockRecord {
                id: id.to_string(),
                ..defaults.clone()
            }),
            (None, None) => None,
        }
    }

    pub fn has_block(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All records in document order
    pub fn blocks(&self) -> &[BlockRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ordered children of a block.
    ///
    /// Uses the block's `children` list when present, otherwise the records
    /// pointing at it in document order.
    pub fn children_of(&self, id: &str) -> Vec<&BlockRecord> {
        match self.get(id) {
            Some(parent) if !parent.children.is_empty() => {
                parent.children.iter().filter_map(|c| self.get(c)).collect()
            }
            Some(_) => self
                .records
                .iter()
                .filter(|r| r.parent_id.as_deref() == Some(id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Records without a parent, in document order
    pub fn roots(&self) -> Vec<&BlockRecord> {
        self.records.iter().filter(|r| r.parent_id.is_none()).collect()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Top-level records of a region, in placement order
    pub fn region_blocks(&self, name: &str) -> Vec<&BlockRecord> {
        self.region(name)
            .map(|r| r.blocks.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn find_by_semantic_id(&self, semantic_id: &str) -> Option<&BlockRecord> {
        self.records
            .iter()
            .find(|r| r.semantic_id.as_deref() == Some(semantic_id))
    }
}
