//! Root nodes
//!
//! A root is the full key index of one commit, serialized with bincode
//! inside a checksummed frame. Every root links to the one before it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::DocInfo;
use crate::error::{Result, StoreError};
use crate::file::{FramePointer, StoreFile};

/// Committed metadata of one key plus where its record lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub info: DocInfo,
    pub record: FramePointer,
}

/// In-memory committed index, ordered by key
pub type DocIndex = BTreeMap<Vec<u8>, IndexEntry>;

/// On-disk snapshot of every document's current revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootNode {
    pub commit_seq: u64,
    pub update_seq: u64,
    /// Root of the previous commit, if any
    pub previous: Option<FramePointer>,
    /// Entries in ascending key order
    pub entries: Vec<IndexEntry>,
}

impl RootNode {
    /// Build a root from an index (iteration order is key order)
    pub fn from_index(
        commit_seq: u64,
        update_seq: u64,
        previous: Option<FramePointer>,
        index: &DocIndex,
    ) -> Self {
        Self {
            commit_seq,
            update_seq,
            previous,
            entries: index.values().cloned().collect(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a root payload and check that its entries are strictly ordered
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let root: RootNode = bincode::deserialize(payload)
            .map_err(|e| StoreError::Format(format!("Corrupt root node: {}", e)))?;

        let ordered = root
            .entries
            .windows(2)
            .all(|pair| pair[0].info.key < pair[1].info.key);
        if !ordered {
            return Err(StoreError::Format(format!(
                "Root for commit {} has unordered or duplicate keys",
                root.commit_seq
            )));
        }
        Ok(root)
    }

    /// Read the root frame at `ptr`
    pub fn load(file: &mut StoreFile, ptr: FramePointer) -> Result<Self> {
        let payload = file.read_frame(ptr)?;
        Self::decode(&payload)
    }

    pub fn into_index(self) -> DocIndex {
        self.entries
            .into_iter()
            .map(|entry| (entry.info.key.clone(), entry))
            .collect()
    }
}

/// Count live and deleted documents among `entries`
pub(crate) fn count_entries<'a>(entries: impl Iterator<Item = &'a IndexEntry>) -> (u64, u64) {
    entries.fold((0, 0), |(live, deleted), entry| {
        if entry.info.deleted {
            (live, deleted + 1)
        } else {
            (live + 1, deleted)
        }
    })
}
