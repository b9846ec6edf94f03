//! Header slots
//!
//! ## Slot Layout (64 bytes)
//! ```text
//! ┌──────────┬────────────┬──────────────┬───────────────┬───────────────┐
//! │Magic (4) │ Version (2)│ Reserved (2) │ CommitSeq (8) │ UpdateSeq (8) │
//! ├──────────┴────────────┴──────────────┼───────────────┴───────────────┤
//! │ RootOffset (8) | RootLen (4)         │ DocCount (8) | DeletedCount (8)│
//! ├──────────────────────────────────────┴───────────────────────────────┤
//! │ CRC32 over bytes 0..52 (4) | zero padding (8)                        │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//! A root offset of zero means "no commit yet".

use bytes::{Buf, BufMut};

use crate::error::{Result, StoreError};

use super::FramePointer;

/// Magic bytes identifying a revstore file
pub const MAGIC: &[u8; 4] = b"RVST";

/// Current file format version
pub const FORMAT_VERSION: u16 = 1;

/// Size of one header slot
pub const HEADER_SLOT_SIZE: usize = 64;

/// Number of header slots at the start of the file
pub const HEADER_SLOT_COUNT: usize = 2;

/// Bytes covered by the slot checksum
const CHECKSUMMED_SIZE: usize = 52;

/// One committed state of the store, as recorded in a header slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    /// Number of commits so far (0 for a fresh file)
    pub commit_seq: u64,
    /// Highest `db_seq` assigned so far
    pub update_seq: u64,
    /// Root frame of this commit
    pub root: Option<FramePointer>,
    /// Documents whose current revision is live
    pub doc_count: u64,
    /// Documents whose current revision is a tombstone
    pub deleted_count: u64,
}

impl Header {
    /// Header of a freshly created file
    pub fn empty() -> Self {
        Self::default()
    }

    /// Slot this header is published into
    pub fn slot(&self) -> usize {
        (self.commit_seq % HEADER_SLOT_COUNT as u64) as usize
    }

    /// File offset of a slot
    pub fn slot_offset(slot: usize) -> u64 {
        (slot * HEADER_SLOT_SIZE) as u64
    }

    pub fn encode(&self) -> [u8; HEADER_SLOT_SIZE] {
        let mut out = [0u8; HEADER_SLOT_SIZE];
        let root = self.root.unwrap_or(FramePointer::new(0, 0));
        {
            let mut buf = &mut out[..CHECKSUMMED_SIZE];
            buf.put_slice(MAGIC);
            buf.put_u16(FORMAT_VERSION);
            buf.put_u16(0);
            buf.put_u64(self.commit_seq);
            buf.put_u64(self.update_seq);
            buf.put_u64(root.offset);
            buf.put_u32(root.len);
            buf.put_u64(self.doc_count);
            buf.put_u64(self.deleted_count);
        }
        let crc = crc32fast::hash(&out[..CHECKSUMMED_SIZE]);
        (&mut out[CHECKSUMMED_SIZE..CHECKSUMMED_SIZE + 4]).put_u32(crc);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SLOT_SIZE {
            return Err(StoreError::Format(format!(
                "Header slot truncated: expected {} bytes, got {}",
                HEADER_SLOT_SIZE,
                bytes.len()
            )));
        }

        if &bytes[0..4] != MAGIC {
            return Err(StoreError::Format(format!(
                "Invalid header magic: expected RVST, got {:?}",
                &bytes[0..4]
            )));
        }

        let stored_crc = (&bytes[CHECKSUMMED_SIZE..CHECKSUMMED_SIZE + 4]).get_u32();
        let actual_crc = crc32fast::hash(&bytes[..CHECKSUMMED_SIZE]);
        if stored_crc != actual_crc {
            return Err(StoreError::Format(format!(
                "Header checksum mismatch: expected {:08x}, got {:08x}",
                stored_crc, actual_crc
            )));
        }

        let mut buf = &bytes[4..CHECKSUMMED_SIZE];
        let version = buf.get_u16();
        if version != FORMAT_VERSION {
            return Err(StoreError::Format(format!(
                "Unsupported format version: {}",
                version
            )));
        }
        let _reserved = buf.get_u16();

        let commit_seq = buf.get_u64();
        let update_seq = buf.get_u64();
        let root_offset = buf.get_u64();
        let root_len = buf.get_u32();
        let doc_count = buf.get_u64();
        let deleted_count = buf.get_u64();

        let root = if root_offset == 0 {
            None
        } else {
            Some(FramePointer::new(root_offset, root_len))
        };

        if root.is_none() && commit_seq != 0 {
            return Err(StoreError::Format(format!(
                "Header for commit {} has no root",
                commit_seq
            )));
        }

        Ok(Self {
            commit_seq,
            update_seq,
            root,
            doc_count,
            deleted_count,
        })
    }
}
