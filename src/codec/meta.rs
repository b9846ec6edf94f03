//! (cas, expiry, flags) revision metadata codec
//!
//! An optional interpretation of the opaque 16-byte revision metadata.

use bytes::{Buf, BufMut};

use crate::document::REV_META_SIZE;
use crate::error::{Result, StoreError};

/// Structured view of revision metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RevMetaFields {
    pub cas: u64,
    pub expiry: u32,
    pub flags: u32,
}

impl RevMetaFields {
    pub const fn new(cas: u64, expiry: u32, flags: u32) -> Self {
        Self { cas, expiry, flags }
    }

    /// Pack as cas (8) + expiry (4) + flags (4), big-endian
    pub fn encode(&self) -> [u8; REV_META_SIZE] {
        let mut out = [0u8; REV_META_SIZE];
        let mut buf = &mut out[..];
        buf.put_u64(self.cas);
        buf.put_u32(self.expiry);
        buf.put_u32(self.flags);
        out
    }

    /// Unpack a blob produced by [`encode`](Self::encode)
    ///
    /// Fails with `Format` unless the blob is exactly 16 bytes.
    pub fn decode(blob: &[u8]) -> Result<Self> {
        let bytes: &[u8; REV_META_SIZE] = blob.try_into().map_err(|_| {
            StoreError::Format(format!(
                "revision metadata blob must be {} bytes, got {}",
                REV_META_SIZE,
                blob.len()
            ))
        })?;
        Ok(Self::from_bytes(bytes))
    }

    pub(crate) fn from_bytes(bytes: &[u8; REV_META_SIZE]) -> Self {
        let mut buf = &bytes[..];
        Self {
            cas: buf.get_u64(),
            expiry: buf.get_u32(),
            flags: buf.get_u32(),
        }
    }
}
