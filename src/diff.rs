//! Store Diff
//!
//! Compares the committed metadata of two stores key by key.
//!
//! Both sides are walked in key order in a single merge pass. Two entries
//! for the same key match when their revision sequence and cas agree;
//! values are not compared.

use std::cmp::Ordering;

use tracing::debug;

use crate::document::DocInfo;
use crate::error::Result;
use crate::store::Store;

/// One key that differs between two stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEntry {
    OnlyInFirst(DocInfo),
    OnlyInSecond(DocInfo),
    /// Present in both with a different revision or cas
    Differs { first: DocInfo, second: DocInfo },
}

impl DiffEntry {
    pub fn key(&self) -> &[u8] {
        match self {
            DiffEntry::OnlyInFirst(info) | DiffEntry::OnlyInSecond(info) => &info.key,
            DiffEntry::Differs { first, .. } => &first.key,
        }
    }
}

/// Result of comparing two stores
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    /// Differences in key order
    pub entries: Vec<DiffEntry>,
    /// Keys present in both with matching revision and cas
    pub same: u64,
}

impl DiffReport {
    pub fn only_in_first(&self) -> impl Iterator<Item = &DocInfo> {
        self.entries.iter().filter_map(|entry| match entry {
            DiffEntry::OnlyInFirst(info) => Some(info),
            _ => None,
        })
    }

    pub fn only_in_second(&self) -> impl Iterator<Item = &DocInfo> {
        self.entries.iter().filter_map(|entry| match entry {
            DiffEntry::OnlyInSecond(info) => Some(info),
            _ => None,
        })
    }

    /// Keys in both stores whose revisions differ: (first, second)
    pub fn differing(&self) -> impl Iterator<Item = (&DocInfo, &DocInfo)> {
        self.entries.iter().filter_map(|entry| match entry {
            DiffEntry::Differs { first, second } => Some((first, second)),
            _ => None,
        })
    }

    pub fn total_differences(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_identical(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether two versions of a key carry the same revision
pub fn same_revision(a: &DocInfo, b: &DocInfo) -> bool {
    a.rev_seq == b.rev_seq && a.rev_meta.fields().cas == b.rev_meta.fields().cas
}

/// Diff the committed state of two stores
pub fn diff_stores(first: &Store, second: &Store) -> Result<DiffReport> {
    let left = first.all_docs()?;
    let right = second.all_docs()?;
    debug!(first = left.len(), second = right.len(), "diffing stores");
    Ok(diff_infos(left, right))
}

/// Merge-diff two key-ordered metadata lists
pub fn diff_infos(left: Vec<DocInfo>, right: Vec<DocInfo>) -> DiffReport {
    let mut report = DiffReport::default();
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let order = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => a.key.cmp(&b.key),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };

        match order {
            Ordering::Less => report.entries.extend(left.next().map(DiffEntry::OnlyInFirst)),
            Ordering::Greater => report.entries.extend(right.next().map(DiffEntry::OnlyInSecond)),
            Ordering::Equal => {
                if let (Some(first), Some(second)) = (left.next(), right.next()) {
                    if same_revision(&first, &second) {
                        report.same += 1;
                    } else {
                        report.entries.push(DiffEntry::Differs { first, second });
                    }
                }
            }
        }
    }

    report
}
