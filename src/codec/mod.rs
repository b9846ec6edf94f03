//! Record Codec Module
//!
//! Binary encodings for everything written after the header.
//!
//! ## Frame Format
//! Every record and every root is wrapped in a checksummed frame:
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Len (4)  │ CRC (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ## Document Record Payload
//! ```text
//! ┌────────────┬─────┬────────────┬─────────────┬─────────────┬────────────┬───────┐
//! │ KeyLen (4) │ Key │ RevSeq (8) │ RevMeta (16)│ Deleted (1) │ ValLen (4) │ Value │
//! └────────────┴─────┴────────────┴─────────────┴─────────────┴────────────┴───────┘
//! ```
//!
//! ## Revision Metadata Convention
//! ```text
//! ┌──────────┬────────────┬───────────┐
//! │ CAS (8)  │ Expiry (4) │ Flags (4) │
//! └──────────┴────────────┴───────────┘
//! ```
//!
//! All integers are big-endian.

mod frame;
mod meta;
mod record;

pub use frame::{decode_frame, encode_frame, FRAME_HEADER_SIZE, MAX_FRAME_PAYLOAD};
pub(crate) use frame::{parse_frame_header, verify_payload};
pub use meta::RevMetaFields;
pub use record::{decode_record, encode_record};
