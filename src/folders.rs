//! Folder tree over flat object keys
//!
//! Object stores only know flat keys such as `"a/b/c.txt"`. For display the
//! keys are split on `/` into a nested map of folders with the object record
//! at the last segment. [`FolderTree::build`] does this in one pass and
//! keeps a flat index of the records it placed, so the table view never has
//! to walk the tree back.
//!
//! When one key is a strict prefix of another at a segment boundary (the
//! file `a` and the file `a/b.txt`), the first record seen keeps the slot
//! and the later one is reported in [`FolderTree::conflicts`].

use crate::storage::ObjectRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Segment name → node. Sorted so the same input always yields the same shape.
pub type FolderMap = BTreeMap<String, FolderNode>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FolderNode {
    /// Terminal object. Listed first so untagged deserialization
    /// recognises records before falling back to folders.
    Object(ObjectRecord),
    Folder(FolderMap),
}

impl FolderNode {
    pub fn is_folder(&self) -> bool {
        matches!(self, FolderNode::Folder(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderTree {
    pub root: FolderMap,
    /// Records placed in the tree, in input order
    pub index: Vec<ObjectRecord>,
    /// Records dropped because their path collided with an earlier one
    pub conflicts: Vec<ObjectRecord>,
}

impl FolderTree {
    pub fn build<'a>(records: impl IntoIterator<Item = &'a ObjectRecord>) -> Self {
        let mut tree = FolderTree::default();
        for record in records {
            if insert(&mut tree.root, record) {
                tree.index.push(record.clone());
            } else {
                warn!(key = %record.key, "Key collides with an existing entry, skipping");
                tree.conflicts.push(record.clone());
            }
        }
        tree
    }

    pub fn into_root(self) -> FolderMap {
        self.root
    }
}

/// Walks/creates folders for every segment but the last. Returns false
/// when the path runs into an existing record or the slot is taken.
fn insert(root: &mut FolderMap, record: &ObjectRecord) -> bool {
    let mut parts: Vec<&str> = record.key.split('/').collect();
    let leaf = parts.pop().unwrap_or_default();

    let mut level = root;
    for part in parts {
        let node = level
            .entry(part.to_string())
            .or_insert_with(|| FolderNode::Folder(FolderMap::new()));
        level = match node {
            FolderNode::Folder(children) => children,
            FolderNode::Object(_) => return false,
        };
    }

    if level.contains_key(leaf) {
        return false;
    }
    level.insert(leaf.to_string(), FolderNode::Object(record.clone()));
    true
}

/// Nested folder map for a flat record list.
pub fn parse_folder_structure(records: &[ObjectRecord]) -> FolderMap {
    FolderTree::build(records).into_root()
}

/// Terminal records of `map`, depth first in segment order.
///
/// `path` is the prefix of the folder `map` was taken from; it is only
/// threaded through the recursion since records carry their full key.
pub fn flatten_folder_structure(map: &FolderMap, path: &str) -> Vec<ObjectRecord> {
    let mut flat = Vec::new();
    for (segment, node) in map {
        match node {
            FolderNode::Object(record) => flat.push(record.clone()),
            FolderNode::Folder(children) => {
                flat.extend(flatten_folder_structure(children, &format!("{}{}/", path, segment)));
            }
        }
    }
    flat
}
