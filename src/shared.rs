//! Shared store handle
//!
//! A [`Store`] behind `Arc<Mutex<_>>` for callers that write from several
//! threads. Every call holds the lock until it returns, so operations on
//! one store never interleave.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::commit::CommitInfo;
use crate::document::{DocInfo, Document};
use crate::error::Result;
use crate::store::{DbInfo, Store};

/// Cloneable, thread-safe handle to one store
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<Store>>,
}

impl SharedStore {
    pub fn new(store: Store) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn save(&self, key: &[u8], rev_seq: u64, rev_meta: &[u8], deleted: bool, value: &[u8]) -> Result<()> {
        self.inner.lock().save(key, rev_seq, rev_meta, deleted, value)
    }

    pub fn save_document(&self, doc: Document) -> Result<()> {
        self.inner.lock().save_document(doc)
    }

    pub fn get(&self, key: &[u8]) -> Result<Document> {
        self.inner.lock().get(key)
    }

    pub fn get_info(&self, key: &[u8]) -> Result<DocInfo> {
        self.inner.lock().get_info(key)
    }

    pub fn commit(&self) -> Result<CommitInfo> {
        self.inner.lock().commit()
    }

    pub fn info(&self) -> Result<DbInfo> {
        self.inner.lock().info()
    }

    /// Close the underlying store; every clone sees it closed
    pub fn close(&self) -> Result<()> {
        self.inner.lock().close()
    }

    /// Run several operations under one lock acquisition
    ///
    /// Use this when a sequence (for example save then commit) must not be
    /// interleaved with other threads.
    pub fn with<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
