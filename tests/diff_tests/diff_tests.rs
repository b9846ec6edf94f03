//! Tests for store diffs
//!
//! These tests verify:
//! - The fixture pair produces the expected difference report
//! - Differences are reported in key order
//! - Identical and empty stores
//! - Diffing a closed store fails

use revstore::diff::{diff_stores, DiffEntry};
use revstore::fixture::write_fixture;
use revstore::{OpenMode, RevMetaFields, Store, StoreError};
use tempfile::TempDir;

fn keys<'a>(docs: impl Iterator<Item = &'a revstore::DocInfo>) -> Vec<String> {
    docs.map(|d| String::from_utf8(d.key.clone()).unwrap())
        .collect()
}

#[test]
fn test_fixture_diff() {
    let temp = TempDir::new().unwrap();
    let (first, second) = write_fixture(temp.path()).unwrap();
    let a = Store::open_path(&first, OpenMode::ReadOnly).unwrap();
    let b = Store::open_path(&second, OpenMode::ReadOnly).unwrap();

    let report = diff_stores(&a, &b).unwrap();

    assert_eq!(keys(report.only_in_first()), vec!["bar", "car", "zzbag", "zzhuh"]);
    assert_eq!(keys(report.only_in_second()), vec!["breeze", "fear", "shelf"]);
    let differing: Vec<_> = report.differing().collect();
    assert_eq!(differing.len(), 1);
    let (in_first, in_second) = differing[0];
    assert_eq!(in_first.key, b"neat");
    assert_eq!((in_first.rev_seq, in_second.rev_seq), (1, 8));
    assert_eq!(report.same, 3);
    assert_eq!(report.total_differences(), 8);
}

#[test]
fn test_fixture_diff_in_key_order() {
    let temp = TempDir::new().unwrap();
    let (first, second) = write_fixture(temp.path()).unwrap();
    let a = Store::open_path(&first, OpenMode::ReadOnly).unwrap();
    let b = Store::open_path(&second, OpenMode::ReadOnly).unwrap();

    let report = diff_stores(&a, &b).unwrap();
    let order: Vec<(String, &str)> = report
        .entries
        .iter()
        .map(|entry| {
            let side = match entry {
                DiffEntry::OnlyInFirst(_) => "first",
                DiffEntry::OnlyInSecond(_) => "second",
                DiffEntry::Differs { .. } => "both",
            };
            (String::from_utf8(entry.key().to_vec()).unwrap(), side)
        })
        .collect();

    let expected = [
        ("bar", "first"),
        ("breeze", "second"),
        ("car", "first"),
        ("fear", "second"),
        ("neat", "both"),
        ("shelf", "second"),
        ("zzbag", "first"),
        ("zzhuh", "first"),
    ];
    assert_eq!(order.len(), expected.len());
    for ((key, side), (want_key, want_side)) in order.iter().zip(expected) {
        assert_eq!((key.as_str(), *side), (want_key, want_side));
    }
}

#[test]
fn test_fixture_rerun_is_deterministic() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path()).unwrap();
    let (first, second) = write_fixture(temp.path()).unwrap();

    let mut a = Store::open_path(&first, OpenMode::ReadOnly).unwrap();
    let b = Store::open_path(&second, OpenMode::ReadOnly).unwrap();
    assert_eq!(a.info().unwrap().commit_seq, 1);
    assert_eq!(diff_stores(&a, &b).unwrap().total_differences(), 8);
}

#[test]
fn test_store_is_identical_to_itself() {
    let temp = TempDir::new().unwrap();
    let (first, _) = write_fixture(temp.path()).unwrap();
    let a = Store::open_path(&first, OpenMode::ReadOnly).unwrap();
    let b = Store::open_path(&first, OpenMode::ReadOnly).unwrap();

    let report = diff_stores(&a, &b).unwrap();
    assert!(report.is_identical());
    assert_eq!(report.same, 8);
}

#[test]
fn test_empty_against_populated() {
    let temp = TempDir::new().unwrap();
    let meta = RevMetaFields::new(1, 0, 0).encode();

    let empty = Store::open_path(temp.path().join("empty.rvs"), OpenMode::Create).unwrap();
    let mut full = Store::open_path(temp.path().join("full.rvs"), OpenMode::Create).unwrap();
    full.save(b"a", 1, &meta, false, b"v").unwrap();
    full.save(b"b", 1, &meta, false, b"v").unwrap();
    full.commit().unwrap();

    let report = diff_stores(&empty, &full).unwrap();
    assert_eq!(report.only_in_first().count(), 0);
    assert_eq!(report.only_in_second().count(), 2);
    assert_eq!(report.total_differences(), 2);
}

#[test]
fn test_staged_documents_are_not_diffed() {
    let temp = TempDir::new().unwrap();
    let meta = RevMetaFields::new(1, 0, 0).encode();

    let a = Store::open_path(temp.path().join("a.rvs"), OpenMode::Create).unwrap();
    let mut b = Store::open_path(temp.path().join("b.rvs"), OpenMode::Create).unwrap();
    b.save(b"pending", 1, &meta, false, b"v").unwrap();

    assert!(diff_stores(&a, &b).unwrap().is_identical());
}

#[test]
fn test_diff_closed_store() {
    let temp = TempDir::new().unwrap();
    let (first, second) = write_fixture(temp.path()).unwrap();
    let a = Store::open_path(&first, OpenMode::ReadOnly).unwrap();
    let mut b = Store::open_path(&second, OpenMode::ReadOnly).unwrap();
    b.close().unwrap();

    assert!(matches!(diff_stores(&a, &b), Err(StoreError::UseAfterClose)));
}
