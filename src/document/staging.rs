//! Staging area
//!
//! BTreeMap of documents accepted by save but not yet committed.

use std::collections::BTreeMap;

use super::Document;

/// A staged document plus the position of its last save
#[derive(Debug, Clone)]
struct StagedEntry {
    doc: Document,
    order: u64,
}

/// In-memory staging area for uncommitted writes
///
/// A later save of the same key replaces the earlier one and moves the key
/// to the end of the save order, which is the order commit assigns update
/// sequences in.
#[derive(Debug, Default)]
pub struct Staging {
    entries: BTreeMap<Vec<u8>, StagedEntry>,
    next_order: u64,
}

impl Staging {
    /// Create a new empty staging area
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a document, superseding any staged record for the same key
    pub fn put(&mut self, doc: Document) {
        let order = self.next_order;
        self.next_order += 1;
        self.entries.insert(doc.key.clone(), StagedEntry { doc, order });
    }

    /// Get the staged document for a key
    pub fn get(&self, key: &[u8]) -> Option<&Document> {
        self.entries.get(key).map(|entry| &entry.doc)
    }

    /// Number of staged keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Staged documents ordered by their last save
    pub fn in_save_order(&self) -> Vec<&Document> {
        let mut entries: Vec<&StagedEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.order);
        entries.into_iter().map(|entry| &entry.doc).collect()
    }

    /// Clear all entries (after a successful commit)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
