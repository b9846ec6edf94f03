//! Tests for commit durability
//!
//! These tests verify:
//! - A failed data append leaves the previous snapshot current
//! - A torn header write leaves the previous snapshot current
//! - A failed header sync rolls the slot back to the previous commit
//! - Staged documents survive a failed commit and can be retried
//!
//! Failures are injected through a `Backend` that wraps a real file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use revstore::file::{Backend, DATA_START};
use revstore::{Config, OpenMode, RevMetaFields, Store, StoreError, SyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Fault Injection
// =============================================================================

const NO_FAULT: u8 = 0;
const FAIL_DATA: u8 = 1;
const FAIL_HEADER: u8 = 2;
const FAIL_SYNC: u8 = 3;
/// Fail the next sync after a header write, then clear the fault
const FAIL_HEADER_SYNC_ONCE: u8 = 4;
/// Fail every sync that follows a header write
const FAIL_HEADER_SYNC: u8 = 5;

/// Shared switch selecting which writes fail
#[derive(Clone, Default)]
struct Faults(Arc<AtomicU8>);

impl Faults {
    fn set(&self, mode: u8) {
        self.0.store(mode, Ordering::SeqCst);
    }

    fn get(&self) -> u8 {
        self.0.load(Ordering::SeqCst)
    }
}

/// File backend that writes half of a faulted write, then errors
struct FaultyFile {
    file: File,
    faults: Faults,
    /// Offset of the most recent write
    last_write: u64,
}

impl Backend for FaultyFile {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.read_exact_at(offset, buf)
    }

    fn write_all_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        let fail = match self.faults.get() {
            FAIL_DATA => offset >= DATA_START,
            FAIL_HEADER => offset < DATA_START,
            _ => false,
        };
        if fail {
            self.file.write_all_at(offset, &data[..data.len() / 2])?;
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
        }
        self.last_write = offset;
        self.file.write_all_at(offset, data)
    }

    fn size(&mut self) -> io::Result<u64> {
        self.file.size()
    }

    fn sync(&mut self) -> io::Result<()> {
        let after_header = self.last_write < DATA_START;
        let fail = match self.faults.get() {
            FAIL_SYNC => true,
            FAIL_HEADER_SYNC => after_header,
            FAIL_HEADER_SYNC_ONCE if after_header => {
                self.faults.set(NO_FAULT);
                true
            }
            _ => false,
        };
        if fail {
            return Err(io::Error::new(io::ErrorKind::Other, "injected sync failure"));
        }
        self.file.sync()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn meta(cas: u64) -> [u8; 16] {
    RevMetaFields::new(cas, 2, 3).encode()
}

fn open_faulty(path: &Path) -> (Store, Faults) {
    let faults = Faults::default();
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .unwrap();
    let backend = FaultyFile {
        file,
        faults: faults.clone(),
        last_write: 0,
    };
    let config = Config::builder()
        .path(path)
        .mode(OpenMode::Create)
        .sync_strategy(SyncStrategy::EveryCommit)
        .build();
    let store = Store::open_with_backend(config, Box::new(backend)).unwrap();
    (store, faults)
}

/// Store with one committed batch: foo@1 and bar@1
fn setup_committed() -> (TempDir, PathBuf, Store, Faults) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("faulty.rvs");
    let (mut store, faults) = open_faulty(&path);

    store.save(b"foo", 1, &meta(1), false, b"v1").unwrap();
    store.save(b"bar", 1, &meta(1), false, b"v1").unwrap();
    store.commit().unwrap();

    (temp, path, store, faults)
}

fn stage_second_batch(store: &mut Store) {
    store.save(b"foo", 2, &meta(2), false, b"v2").unwrap();
    store.save(b"baz", 1, &meta(1), false, b"v1").unwrap();
}

fn assert_first_snapshot(path: &Path) {
    let mut store = Store::open_path(path, OpenMode::ReadOnly).unwrap();
    let info = store.info().unwrap();
    assert_eq!(info.commit_seq, 1);
    assert_eq!(info.doc_count, 2);

    let foo = store.get(b"foo").unwrap();
    assert_eq!(foo.rev_seq, 1);
    assert_eq!(foo.value, b"v1");
    assert!(store.get(b"bar").is_ok());
    assert!(matches!(store.get(b"baz"), Err(StoreError::KeyNotFound)));
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_failed_data_append_keeps_previous_root() {
    let (_temp, path, mut store, faults) = setup_committed();
    stage_second_batch(&mut store);

    faults.set(FAIL_DATA);
    let err = store.commit().unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));

    // In memory: committed state unchanged, batch still staged
    assert_eq!(store.get_info(b"foo").unwrap().rev_seq, 1);
    assert_eq!(store.staged_count().unwrap(), 2);
    assert_eq!(store.get(b"foo").unwrap().rev_seq, 2);

    drop(store);
    assert_first_snapshot(&path);
}

#[test]
fn test_torn_header_write_keeps_previous_root() {
    let (_temp, path, mut store, faults) = setup_committed();
    stage_second_batch(&mut store);

    faults.set(FAIL_HEADER);
    assert!(matches!(store.commit(), Err(StoreError::Io(_))));
    assert_eq!(store.info().unwrap().commit_seq, 1);

    drop(store);
    assert_first_snapshot(&path);
}

#[test]
fn test_failed_data_sync_keeps_previous_root() {
    let (_temp, path, mut store, faults) = setup_committed();
    stage_second_batch(&mut store);

    faults.set(FAIL_SYNC);
    assert!(matches!(store.commit(), Err(StoreError::Io(_))));

    drop(store);
    assert_first_snapshot(&path);
}

#[test]
fn test_failed_header_sync_restores_previous_slot() {
    let (_temp, path, mut store, faults) = setup_committed();
    stage_second_batch(&mut store);

    // The header bytes land, only the sync after them fails
    faults.set(FAIL_HEADER_SYNC_ONCE);
    assert!(matches!(store.commit(), Err(StoreError::Io(_))));
    assert_eq!(store.info().unwrap().commit_seq, 1);
    assert_eq!(store.staged_count().unwrap(), 2);

    drop(store);
    assert_first_snapshot(&path);
}

#[test]
fn test_header_sync_failing_throughout_still_restores_slot() {
    let (_temp, path, mut store, faults) = setup_committed();
    stage_second_batch(&mut store);

    faults.set(FAIL_HEADER_SYNC);
    assert!(matches!(store.commit(), Err(StoreError::Io(_))));

    drop(store);
    assert_first_snapshot(&path);
}

#[test]
fn test_retry_after_failed_header_sync() {
    let (_temp, path, mut store, faults) = setup_committed();
    stage_second_batch(&mut store);

    faults.set(FAIL_HEADER_SYNC_ONCE);
    assert!(store.commit().is_err());

    let info = store.commit().unwrap();
    assert_eq!(info.commit_seq, 2);
    drop(store);

    let mut store = Store::open_path(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(store.info().unwrap().commit_seq, 2);
    assert_eq!(store.get(b"baz").unwrap().value, b"v1");
    assert_eq!(store.history().unwrap().len(), 2);
}

#[test]
fn test_first_commit_failure_leaves_empty_store() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("faulty.rvs");
    let (mut store, faults) = open_faulty(&path);
    store.save(b"foo", 1, &meta(1), false, b"v1").unwrap();

    faults.set(FAIL_HEADER);
    assert!(store.commit().is_err());
    drop(store);

    let mut store = Store::open_path(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(store.info().unwrap().commit_seq, 0);
    assert!(store.all_docs().unwrap().is_empty());
}

#[test]
fn test_retry_after_failure() {
    let (_temp, path, mut store, faults) = setup_committed();
    stage_second_batch(&mut store);

    faults.set(FAIL_DATA);
    assert!(store.commit().is_err());

    faults.set(NO_FAULT);
    let info = store.commit().unwrap();
    assert_eq!(info.commit_seq, 2);
    assert_eq!(info.documents, 2);
    store.close().unwrap();

    let mut store = Store::open_path(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(store.get(b"foo").unwrap().value, b"v2");
    assert_eq!(store.get(b"baz").unwrap().value, b"v1");
    assert_eq!(store.get(b"bar").unwrap().value, b"v1");
    assert_eq!(store.history().unwrap().len(), 2);
}

#[test]
fn test_retry_after_torn_header() {
    let (_temp, path, mut store, faults) = setup_committed();
    stage_second_batch(&mut store);

    faults.set(FAIL_HEADER);
    assert!(store.commit().is_err());

    faults.set(NO_FAULT);
    store.commit().unwrap();
    drop(store);

    let mut store = Store::open_path(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(store.info().unwrap().commit_seq, 2);
    assert_eq!(store.get(b"foo").unwrap().rev_seq, 2);
}
