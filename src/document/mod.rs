//! Document Module
//!
//! Document types and the in-memory staging area.
//!
//! ## Responsibilities
//! - Validate documents before they are staged
//! - Keep revision metadata opaque at the storage layer
//! - Hold staged writes until commit (last write wins per key)

mod staging;

use serde::{Deserialize, Serialize};

use crate::codec::{RevMetaFields, MAX_FRAME_PAYLOAD};
use crate::error::{Result, StoreError};

pub use staging::Staging;

/// Size of the revision metadata blob carried by every document
pub const REV_META_SIZE: usize = 16;

/// Record bytes besides key and value: key_len + rev_seq + rev_meta + deleted + value_len
const RECORD_OVERHEAD: usize = 4 + 8 + REV_META_SIZE + 1 + 4;

/// Opaque, fixed-size revision metadata
///
/// The store never interprets these bytes. Callers that follow the
/// (cas, expiry, flags) convention convert through [`RevMetaFields`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevMeta([u8; REV_META_SIZE]);

impl RevMeta {
    /// Wrap an exact-size array
    pub const fn new(bytes: [u8; REV_META_SIZE]) -> Self {
        Self(bytes)
    }

    /// Copy metadata out of a caller-supplied slice
    ///
    /// Fails with `Validation` unless the slice is exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; REV_META_SIZE] = bytes.try_into().map_err(|_| {
            StoreError::Validation(format!(
                "revision metadata must be {} bytes, got {}",
                REV_META_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; REV_META_SIZE] {
        &self.0
    }

    /// Interpret the blob as (cas, expiry, flags)
    pub fn fields(&self) -> RevMetaFields {
        RevMetaFields::from_bytes(&self.0)
    }
}

impl From<RevMetaFields> for RevMeta {
    fn from(fields: RevMetaFields) -> Self {
        Self(fields.encode())
    }
}

/// A full document: key, revision, metadata, deleted flag and value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub key: Vec<u8>,
    pub rev_seq: u64,
    pub rev_meta: RevMeta,
    pub deleted: bool,
    pub value: Vec<u8>,
}

impl Document {
    pub fn new(key: impl Into<Vec<u8>>, rev_seq: u64, rev_meta: RevMeta, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            rev_seq,
            rev_meta,
            deleted: false,
            value: value.into(),
        }
    }

    /// A deletion marker: deleted flag set, empty value
    pub fn tombstone(key: impl Into<Vec<u8>>, rev_seq: u64, rev_meta: RevMeta) -> Self {
        Self {
            key: key.into(),
            rev_seq,
            rev_meta,
            deleted: true,
            value: Vec::new(),
        }
    }

    /// Check the invariants a document must hold before it is staged
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(StoreError::Validation("key must not be empty".to_string()));
        }
        let record_size = self.key.len() + self.value.len() + RECORD_OVERHEAD;
        if record_size > MAX_FRAME_PAYLOAD as usize {
            return Err(StoreError::Validation(format!(
                "document of {} bytes exceeds the {} byte record limit",
                record_size, MAX_FRAME_PAYLOAD
            )));
        }
        Ok(())
    }

    /// Metadata view of this document with the given update sequence
    pub fn info(&self, db_seq: u64) -> DocInfo {
        DocInfo {
            key: self.key.clone(),
            db_seq,
            rev_seq: self.rev_seq,
            rev_meta: self.rev_meta,
            deleted: self.deleted,
            value_len: self.value.len() as u32,
        }
    }
}

/// Document metadata without the value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocInfo {
    pub key: Vec<u8>,
    /// Store-wide update sequence assigned at commit
    pub db_seq: u64,
    pub rev_seq: u64,
    pub rev_meta: RevMeta,
    pub deleted: bool,
    pub value_len: u32,
}
