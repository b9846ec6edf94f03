//! Commit writer
//!
//! Appends staged records and a new root, then publishes the header.

use bytes::BytesMut;
use tracing::{debug, info};

use crate::codec::{encode_frame, encode_record};
use crate::document::Document;
use crate::error::{Result, StoreError};
use crate::file::{FramePointer, Header, StoreFile};

use super::root::{count_entries, DocIndex, IndexEntry, RootNode};

/// Outcome of a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitInfo {
    /// Commit sequence now current (unchanged for an empty commit)
    pub commit_seq: u64,
    /// Highest update sequence assigned so far
    pub update_seq: u64,
    /// Documents written by this commit
    pub documents: usize,
    /// Bytes appended by this commit (records + root)
    pub bytes_written: u64,
}

/// Everything the store swaps in once a commit is on disk
pub(crate) struct PreparedCommit {
    pub index: DocIndex,
    pub info: CommitInfo,
}

/// Write `staged` (in save order) as a new commit on top of `index`
///
/// Neither `index` nor the caller's staging is touched. On error the file
/// may hold unreferenced bytes past the previous root, but its current
/// header is unchanged.
pub(crate) fn write_commit(
    file: &mut StoreFile,
    index: &DocIndex,
    staged: &[&Document],
) -> Result<PreparedCommit> {
    let previous = *file.header();
    let commit_seq = previous.commit_seq + 1;
    let base = file.end_offset()?;

    // Step 1: Frame every record and assign update sequences in save order
    let mut buf = BytesMut::new();
    let mut new_index = index.clone();
    let mut update_seq = previous.update_seq;

    for doc in staged {
        update_seq += 1;
        let offset = base + buf.len() as u64;
        encode_frame(&encode_record(doc), &mut buf)?;
        let len = frame_len(base + buf.len() as u64 - offset)?;

        new_index.insert(
            doc.key.clone(),
            IndexEntry {
                info: doc.info(update_seq),
                record: FramePointer::new(offset, len),
            },
        );
    }

    // Step 2: Root frame for the new index, linked to the previous root.
    // An index too large for one frame fails here, before anything is written.
    let root = RootNode::from_index(commit_seq, update_seq, previous.root, &new_index);
    let root_offset = base + buf.len() as u64;
    encode_frame(&root.encode()?, &mut buf)?;
    let root_ptr = FramePointer::new(root_offset, frame_len(base + buf.len() as u64 - root_offset)?);

    // Step 3: Append everything in one write and make it durable
    file.append(base, &buf)?;
    file.sync_data()?;
    debug!(
        commit_seq,
        offset = base,
        bytes = buf.len(),
        "appended records and root"
    );

    // Step 4: Publish the header (final step)
    let (doc_count, deleted_count) = count_entries(new_index.values());
    let header = Header {
        commit_seq,
        update_seq,
        root: Some(root_ptr),
        doc_count,
        deleted_count,
    };
    file.publish_header(header)?;

    info!(
        commit_seq,
        documents = staged.len(),
        doc_count,
        deleted_count,
        "commit complete"
    );

    Ok(PreparedCommit {
        index: new_index,
        info: CommitInfo {
            commit_seq,
            update_seq,
            documents: staged.len(),
            bytes_written: buf.len() as u64,
        },
    })
}

fn frame_len(len: u64) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        StoreError::Validation(format!("frame of {} bytes exceeds 4 GiB", len))
    })
}
