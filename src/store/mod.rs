//! Store Module
//!
//! The document store handle that coordinates all components.
//!
//! ## Responsibilities
//! - Own the store file for the lifetime of the handle
//! - Validate and stage saves (last write wins per key)
//! - Serve lookups from staging first, then the committed index
//! - Drive commits and swap in the new committed state on success
//!
//! ## Handle States
//! ```text
//!   open ──► Open(clean) ──save──► Open(dirty) ──commit──► Open(clean)
//!                │                     │
//!                └────────close────────┴──────────► Closed (terminal)
//! ```

mod history;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codec::decode_record;
use crate::commit::{write_commit, CommitInfo, DocIndex, PreparedCommit, RootNode};
use crate::config::{Config, OpenMode, RevisionPolicy};
use crate::document::{DocInfo, Document, RevMeta, Staging};
use crate::error::{Result, StoreError};
use crate::file::{Backend, FramePointer, StoreFile};

pub use history::{changes_between, Change, Snapshot};

/// Summary of an open store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbInfo {
    pub path: PathBuf,
    pub commit_seq: u64,
    pub update_seq: u64,
    pub doc_count: u64,
    pub deleted_count: u64,
    pub staged_count: usize,
    pub file_size: u64,
}

/// State that only exists while the handle is open
struct OpenState {
    file: StoreFile,
    /// Committed index loaded from the current root
    index: DocIndex,
    /// Saves not yet committed
    staging: Staging,
}

/// Handle to one store file
///
/// ## Concurrency Model
/// Single-threaded: every operation takes `&mut self` or `&self` and runs
/// to completion. Share a handle across threads through
/// [`SharedStore`](crate::SharedStore).
pub struct Store {
    /// Handle configuration
    config: Config,

    /// `None` once closed
    state: Option<OpenState>,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On open:
    /// 1. Open/create the file according to the mode
    /// 2. Select the newest valid header slot
    /// 3. Load the committed root into the in-memory index
    pub fn open(config: Config) -> Result<Self> {
        let file = StoreFile::open(&config.path, config.mode, config.sync_strategy)?;
        Self::from_file(config, file)
    }

    /// Open with a path and mode (convenience method)
    ///
    /// Uses the default config otherwise.
    pub fn open_path(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let config = Config::builder().path(path.as_ref()).mode(mode).build();
        Self::open(config)
    }

    /// Open a store over a caller-supplied backend
    ///
    /// `config.path` is only used for messages.
    pub fn open_with_backend(config: Config, backend: Box<dyn Backend>) -> Result<Self> {
        let file = StoreFile::from_backend(
            config.path.clone(),
            backend,
            config.mode,
            config.sync_strategy,
        )?;
        Self::from_file(config, file)
    }

    fn from_file(config: Config, mut file: StoreFile) -> Result<Self> {
        let header = *file.header();

        let index = match header.root {
            Some(ptr) => {
                let root = RootNode::load(&mut file, ptr)?;
                if root.commit_seq != header.commit_seq {
                    return Err(StoreError::Format(format!(
                        "Header names commit {} but its root belongs to commit {}",
                        header.commit_seq, root.commit_seq
                    )));
                }
                root.into_index()
            }
            None => DocIndex::new(),
        };

        info!(
            path = %config.path.display(),
            commit_seq = header.commit_seq,
            documents = index.len(),
            mode = ?config.mode,
            "opened store"
        );

        Ok(Self {
            config,
            state: Some(OpenState {
                file,
                index,
                staging: Staging::new(),
            }),
        })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stage a document given as raw parts
    ///
    /// `rev_meta` must be exactly [`REV_META_SIZE`](crate::REV_META_SIZE) bytes.
    pub fn save(
        &mut self,
        key: &[u8],
        rev_seq: u64,
        rev_meta: &[u8],
        deleted: bool,
        value: &[u8],
    ) -> Result<()> {
        self.writable_state()?;
        let rev_meta = RevMeta::from_slice(rev_meta)?;
        self.save_document(Document {
            key: key.to_vec(),
            rev_seq,
            rev_meta,
            deleted,
            value: value.to_vec(),
        })
    }

    /// Stage a document, superseding any staged record for the same key
    ///
    /// Nothing is durable until [`commit`](Self::commit).
    pub fn save_document(&mut self, doc: Document) -> Result<()> {
        let policy = self.config.revision_policy;
        let state = self.writable_state()?;

        doc.validate()?;

        if policy == RevisionPolicy::Monotonic {
            let current = state
                .staging
                .get(&doc.key)
                .map(|staged| staged.rev_seq)
                .or_else(|| state.index.get(&doc.key).map(|entry| entry.info.rev_seq));

            if let Some(current) = current {
                if doc.rev_seq <= current {
                    return Err(StoreError::Validation(format!(
                        "revision {} is not newer than current revision {}",
                        doc.rev_seq, current
                    )));
                }
            }
        }

        debug!(
            key = %String::from_utf8_lossy(&doc.key),
            rev_seq = doc.rev_seq,
            deleted = doc.deleted,
            "staged document"
        );
        state.staging.put(doc);
        Ok(())
    }

    /// Stage a deletion: a new revision with the deleted flag and no value
    pub fn delete(&mut self, key: &[u8], rev_seq: u64, rev_meta: &[u8]) -> Result<()> {
        self.save(key, rev_seq, rev_meta, true, &[])
    }

    /// Make every staged document durable
    ///
    /// On failure the staged documents stay staged and the previous commit
    /// remains current, both in memory and on disk.
    pub fn commit(&mut self) -> Result<CommitInfo> {
        let state = self.writable_state()?;

        if state.staging.is_empty() {
            let header = state.file.header();
            debug!(commit_seq = header.commit_seq, "nothing staged, skipping commit");
            return Ok(CommitInfo {
                commit_seq: header.commit_seq,
                update_seq: header.update_seq,
                documents: 0,
                bytes_written: 0,
            });
        }

        let staged = state.staging.in_save_order();
        let PreparedCommit { index, info } =
            write_commit(&mut state.file, &state.index, &staged)?;

        state.index = index;
        state.staging.clear();
        Ok(info)
    }

    /// Close the handle and release the file
    ///
    /// Staged documents that were never committed are discarded. Every
    /// later call on this handle fails with `UseAfterClose`.
    pub fn close(&mut self) -> Result<()> {
        let state = self.state.take().ok_or(StoreError::UseAfterClose)?;
        if !state.staging.is_empty() {
            warn!(
                path = %self.config.path.display(),
                discarded = state.staging.len(),
                "closing with uncommitted documents"
            );
        }
        info!(path = %self.config.path.display(), "closed store");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a document by key
    ///
    /// Search order:
    /// 1. Staged documents (most recent saves)
    /// 2. Committed index
    ///
    /// Deleted documents are returned with `deleted` set.
    pub fn get(&mut self, key: &[u8]) -> Result<Document> {
        let state = self.state_mut()?;

        if let Some(doc) = state.staging.get(key) {
            return Ok(doc.clone());
        }

        let ptr = match state.index.get(key) {
            Some(entry) => entry.record,
            None => return Err(StoreError::KeyNotFound),
        };
        read_document(&mut state.file, ptr, key)
    }

    /// Committed metadata for a key
    pub fn get_info(&self, key: &[u8]) -> Result<DocInfo> {
        self.state()?
            .index
            .get(key)
            .map(|entry| entry.info.clone())
            .ok_or(StoreError::KeyNotFound)
    }

    /// Committed metadata for every key, in key order
    pub fn all_docs(&self) -> Result<Vec<DocInfo>> {
        Ok(self
            .state()?
            .index
            .values()
            .map(|entry| entry.info.clone())
            .collect())
    }

    /// Committed documents changed after `since`, in update-sequence order
    pub fn changes_since(&self, since: u64) -> Result<Vec<DocInfo>> {
        let mut changes: Vec<DocInfo> = self
            .state()?
            .index
            .values()
            .filter(|entry| entry.info.db_seq > since)
            .map(|entry| entry.info.clone())
            .collect();
        changes.sort_by_key(|info| info.db_seq);
        Ok(changes)
    }

    /// Summary of the committed state plus the staged count
    pub fn info(&mut self) -> Result<DbInfo> {
        let path = self.config.path.clone();
        let state = self.state_mut()?;
        let header = *state.file.header();

        Ok(DbInfo {
            path,
            commit_seq: header.commit_seq,
            update_seq: header.update_seq,
            doc_count: header.doc_count,
            deleted_count: header.deleted_count,
            staged_count: state.staging.len(),
            file_size: state.file.size()?,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Whether the handle has not been closed
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Whether there are saves waiting for a commit
    pub fn is_dirty(&self) -> bool {
        self.state
            .as_ref()
            .map_or(false, |state| !state.staging.is_empty())
    }

    /// Number of staged documents
    pub fn staged_count(&self) -> Result<usize> {
        Ok(self.state()?.staging.len())
    }

    /// Path of the store file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn state(&self) -> Result<&OpenState> {
        self.state.as_ref().ok_or(StoreError::UseAfterClose)
    }

    fn state_mut(&mut self) -> Result<&mut OpenState> {
        self.state.as_mut().ok_or(StoreError::UseAfterClose)
    }

    fn writable_state(&mut self) -> Result<&mut OpenState> {
        let writable = self.config.mode.is_writable();
        let state = self.state_mut()?;
        if !writable {
            return Err(StoreError::ReadOnly);
        }
        Ok(state)
    }
}

/// Read the record at `ptr` and check that it belongs to `key`
fn read_document(file: &mut StoreFile, ptr: FramePointer, key: &[u8]) -> Result<Document> {
    let doc = decode_record(&file.read_frame(ptr)?)?;
    if doc.key != key {
        return Err(StoreError::Format(format!(
            "Record at offset {} holds a different key",
            ptr.offset
        )));
    }
    Ok(doc)
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Some(state) = &self.state {
            if !state.staging.is_empty() {
                warn!(
                    path = %self.config.path.display(),
                    discarded = state.staging.len(),
                    "store dropped with uncommitted documents"
                );
            }
        }
    }
}
