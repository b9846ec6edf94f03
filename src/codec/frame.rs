//! Checksummed frames
//!
//! `[len: u32][crc32: u32][payload]`, big-endian.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, StoreError};

/// Length (4) + CRC (4)
pub const FRAME_HEADER_SIZE: usize = 8;

/// Largest payload a frame may carry (1 GiB)
pub const MAX_FRAME_PAYLOAD: u32 = 1024 * 1024 * 1024;

/// Append a framed payload to `out`
///
/// Fails with `Validation` if the payload exceeds [`MAX_FRAME_PAYLOAD`],
/// leaving `out` untouched.
pub fn encode_frame(payload: &[u8], out: &mut BytesMut) -> Result<()> {
    check_payload_len(payload.len(), MAX_FRAME_PAYLOAD)?;
    out.reserve(FRAME_HEADER_SIZE + payload.len());
    out.put_u32(payload.len() as u32);
    out.put_u32(crc32fast::hash(payload));
    out.put_slice(payload);
    Ok(())
}

fn check_payload_len(len: usize, max: u32) -> Result<()> {
    if len > max as usize {
        return Err(StoreError::Validation(format!(
            "Frame payload of {} bytes exceeds the {} byte limit",
            len, max
        )));
    }
    Ok(())
}

/// Decode a complete frame held in memory, returning its payload
pub fn decode_frame(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(StoreError::Format(format!(
            "Incomplete frame header: expected {} bytes, got {}",
            FRAME_HEADER_SIZE,
            bytes.len()
        )));
    }

    let (len, crc) = parse_frame_header(&bytes[..FRAME_HEADER_SIZE])?;
    let payload = &bytes[FRAME_HEADER_SIZE..];
    if payload.len() != len as usize {
        return Err(StoreError::Format(format!(
            "Frame length mismatch: header says {}, got {}",
            len,
            payload.len()
        )));
    }

    verify_payload(payload, crc)?;
    Ok(payload)
}

/// Parse `(len, crc)` out of the first 8 bytes of a frame
pub(crate) fn parse_frame_header(mut header: &[u8]) -> Result<(u32, u32)> {
    if header.len() < FRAME_HEADER_SIZE {
        return Err(StoreError::Format("Incomplete frame header".to_string()));
    }
    let len = header.get_u32();
    let crc = header.get_u32();

    if len > MAX_FRAME_PAYLOAD {
        return Err(StoreError::Format(format!(
            "Frame payload too large: {} bytes (max {})",
            len, MAX_FRAME_PAYLOAD
        )));
    }
    Ok((len, crc))
}

pub(crate) fn verify_payload(payload: &[u8], expected: u32) -> Result<()> {
    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(StoreError::Format(format!(
            "Frame checksum mismatch: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }
    Ok(())
}
