//! Commit history
//!
//! Every root links to the root of the commit before it, so the file
//! holds every committed snapshot. This module walks that chain.

use tracing::debug;

use crate::commit::{DocIndex, RootNode};
use crate::document::{DocInfo, Document};
use crate::error::{Result, StoreError};
use crate::file::FramePointer;

use super::{read_document, Store};

/// One committed snapshot read back from the root chain
#[derive(Debug, Clone)]
pub struct Snapshot {
    commit_seq: u64,
    update_seq: u64,
    root: FramePointer,
    index: DocIndex,
}

/// A document changed in a newer snapshot, with its state in the older one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub current: DocInfo,
    pub previous: Option<DocInfo>,
}

impl Snapshot {
    fn from_root(ptr: FramePointer, root: RootNode) -> Self {
        Self {
            commit_seq: root.commit_seq,
            update_seq: root.update_seq,
            root: ptr,
            index: root.into_index(),
        }
    }

    pub fn commit_seq(&self) -> u64 {
        self.commit_seq
    }

    pub fn update_seq(&self) -> u64 {
        self.update_seq
    }

    /// Location of this snapshot's root frame
    pub fn root(&self) -> FramePointer {
        self.root
    }

    /// Live documents in this snapshot
    pub fn doc_count(&self) -> u64 {
        self.index.values().filter(|e| !e.info.deleted).count() as u64
    }

    pub fn get_info(&self, key: &[u8]) -> Option<&DocInfo> {
        self.index.get(key).map(|entry| &entry.info)
    }

    /// Metadata for every key, in key order
    pub fn all_docs(&self) -> impl Iterator<Item = &DocInfo> {
        self.index.values().map(|entry| &entry.info)
    }

    /// Documents changed after `since`, in update-sequence order
    pub fn changes_since(&self, since: u64) -> Vec<&DocInfo> {
        let mut changes: Vec<&DocInfo> = self.all_docs().filter(|info| info.db_seq > since).collect();
        changes.sort_by_key(|info| info.db_seq);
        changes
    }
}

/// Pair every change in `newer` since `older` with the key's state in `older`
pub fn changes_between(older: &Snapshot, newer: &Snapshot) -> Vec<Change> {
    newer
        .changes_since(older.update_seq)
        .into_iter()
        .map(|info| Change {
            current: info.clone(),
            previous: older.get_info(&info.key).cloned(),
        })
        .collect()
}

impl Store {
    /// Every committed snapshot, newest first
    pub fn history(&mut self) -> Result<Vec<Snapshot>> {
        let state = self.state_mut()?;
        let mut snapshots = Vec::new();
        let mut next = state.file.header().root;

        while let Some(ptr) = next {
            let root = RootNode::load(&mut state.file, ptr)?;

            // Roots are appended, so each predecessor sits strictly earlier
            if let Some(prev) = root.previous {
                if prev.end() > ptr.offset {
                    return Err(StoreError::Format(format!(
                        "Root at {} links forward to {}",
                        ptr.offset, prev.offset
                    )));
                }
            }

            next = root.previous;
            snapshots.push(Snapshot::from_root(ptr, root));
        }

        debug!(commits = snapshots.len(), "walked commit history");
        Ok(snapshots)
    }

    /// Read a document as it was in `snapshot`
    ///
    /// The snapshot must come from this store's [`history`](Self::history).
    pub fn get_at(&mut self, snapshot: &Snapshot, key: &[u8]) -> Result<Document> {
        let state = self.state_mut()?;
        let ptr = snapshot
            .index
            .get(key)
            .map(|entry| entry.record)
            .ok_or(StoreError::KeyNotFound)?;
        read_document(&mut state.file, ptr, key)
    }
}
