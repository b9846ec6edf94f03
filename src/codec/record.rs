//! Document record codec
//!
//! Encodes a [`Document`] into a frame payload and back.

use bytes::{Buf, BufMut, BytesMut};

use crate::document::{Document, RevMeta, REV_META_SIZE};
use crate::error::{Result, StoreError};

/// Fixed part of a record: key_len (4) + rev_seq (8) + rev_meta + deleted (1) + value_len (4)
const FIXED_SIZE: usize = 4 + 8 + REV_META_SIZE + 1 + 4;

/// Encode a document as a record payload
///
/// Format: key_len (4) + key + rev_seq (8) + rev_meta (16) + deleted (1) + value_len (4) + value
pub fn encode_record(doc: &Document) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(FIXED_SIZE + doc.key.len() + doc.value.len());
    buf.put_u32(doc.key.len() as u32);
    buf.put_slice(&doc.key);
    buf.put_u64(doc.rev_seq);
    buf.put_slice(doc.rev_meta.as_bytes());
    buf.put_u8(doc.deleted as u8);
    buf.put_u32(doc.value.len() as u32);
    buf.put_slice(&doc.value);
    buf.to_vec()
}

/// Decode a record payload back into a document
pub fn decode_record(payload: &[u8]) -> Result<Document> {
    let mut buf = payload;

    let key_len = read_u32(&mut buf, "key length")? as usize;
    let key = read_bytes(&mut buf, key_len, "key")?;
    if key.is_empty() {
        return Err(StoreError::Format("Record has an empty key".to_string()));
    }

    let rev_seq = read_u64(&mut buf, "revision sequence")?;

    let meta_bytes = read_bytes(&mut buf, REV_META_SIZE, "revision metadata")?;
    let mut rev_meta = [0u8; REV_META_SIZE];
    rev_meta.copy_from_slice(&meta_bytes);

    ensure_remaining(&buf, 1, "deleted flag")?;
    let deleted = match buf.get_u8() {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::Format(format!(
                "Invalid deleted flag: 0x{:02x}",
                other
            )))
        }
    };

    let value_len = read_u32(&mut buf, "value length")? as usize;
    let value = read_bytes(&mut buf, value_len, "value")?;

    if buf.has_remaining() {
        return Err(StoreError::Format(format!(
            "Record has {} trailing bytes",
            buf.remaining()
        )));
    }

    Ok(Document {
        key,
        rev_seq,
        rev_meta: RevMeta::new(rev_meta),
        deleted,
        value,
    })
}

// =============================================================================
// Private Helpers
// =============================================================================

fn ensure_remaining(buf: &&[u8], needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(StoreError::Format(format!(
            "Record truncated reading {}: need {} bytes, have {}",
            what,
            needed,
            buf.remaining()
        )));
    }
    Ok(())
}

fn read_u32(buf: &mut &[u8], what: &str) -> Result<u32> {
    ensure_remaining(buf, 4, what)?;
    Ok(buf.get_u32())
}

fn read_u64(buf: &mut &[u8], what: &str) -> Result<u64> {
    ensure_remaining(buf, 8, what)?;
    Ok(buf.get_u64())
}

fn read_bytes(buf: &mut &[u8], len: usize, what: &str) -> Result<Vec<u8>> {
    ensure_remaining(buf, len, what)?;
    let bytes = buf[..len].to_vec();
    buf.advance(len);
    Ok(bytes)
}
