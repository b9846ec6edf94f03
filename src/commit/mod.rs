//! Commit/Durability Module
//!
//! Turns staged documents into a durable snapshot.
//!
//! ## Commit Sequence
//! ```text
//!   staged docs ──► record frames ─┐
//!                                  ├──► one append at end of file ──► sync
//!   new index  ──► root frame ─────┘                                   │
//!                                                                      ▼
//!                                        header slot (commit_seq % 2) ──► sync
//! ```
//!
//! The header write is the last step. Until it lands, the other slot still
//! names the previous root, so a crash or failed write at any point leaves
//! the previous snapshot intact.

mod root;
mod writer;

pub use root::{DocIndex, IndexEntry, RootNode};
pub use writer::CommitInfo;
pub(crate) use writer::{write_commit, PreparedCommit};
