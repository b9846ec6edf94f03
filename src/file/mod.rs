//! File/Header Manager Module
//!
//! Owns the single store file: creation, header slots, appends and reads.
//!
//! ## Responsibilities
//! - Open or create the store file according to [`OpenMode`](crate::config::OpenMode)
//! - Validate and select the newest header slot on open
//! - Append bytes past the last committed data (never rewriting them)
//! - Publish a new header as the final step of a commit
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header Slot A (64 bytes, even commit sequences)         │
//! ├─────────────────────────────────────────────────────────┤
//! │ Header Slot B (64 bytes, odd commit sequences)          │
//! ├─────────────────────────────────────────────────────────┤
//! │ Commit 1: [record frame] ... [record frame] [root frame]│
//! ├─────────────────────────────────────────────────────────┤
//! │ Commit 2: [record frame] ... [record frame] [root frame]│
//! │ ... append-only ...                                     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Each header slot points at the root frame of its commit. A torn slot
//! fails its CRC and the other slot (the previous commit) is used.

mod backend;
mod header;
mod manager;

use serde::{Deserialize, Serialize};

pub use backend::Backend;
pub use header::{Header, FORMAT_VERSION, HEADER_SLOT_COUNT, HEADER_SLOT_SIZE, MAGIC};
pub use manager::StoreFile;

/// First byte after the header slots
pub const DATA_START: u64 = (HEADER_SLOT_SIZE * HEADER_SLOT_COUNT) as u64;

/// Location of a frame in the file (offset of its first byte, total length)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePointer {
    pub offset: u64,
    pub len: u32,
}

impl FramePointer {
    pub fn new(offset: u64, len: u32) -> Self {
        Self { offset, len }
    }

    /// Offset just past this frame
    pub fn end(&self) -> u64 {
        self.offset + self.len as u64
    }
}
