//! # revstore
//!
//! A single-file, append-only, versioned document store with:
//! - Key-based lookup of the latest revision of each document
//! - Explicit commits that atomically publish a new snapshot
//! - Crash safety through dual checksummed header slots
//! - A full commit history (every root links to its predecessor)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Store                                │
//! │           (open / save / get / commit / close)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Staging   │          │   Commit    │
//!   │ (BTreeMap)  │─────────►│(records+root│
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  StoreFile  │
//!                           │(header slots│
//!                           │  + appends) │
//!                           └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use revstore::{OpenMode, RevMetaFields, Store};
//!
//! let mut store = Store::open_path("data.rvs", OpenMode::Create)?;
//! let meta = RevMetaFields::new(1, 2, 3).encode();
//! store.save(b"foo", 1, &meta, false, b"v")?;
//! store.commit()?;
//! store.close()?;
//! # Ok::<(), revstore::StoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod document;
pub mod file;
pub mod commit;
pub mod store;
pub mod shared;
pub mod diff;
pub mod fixture;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{Config, OpenMode, RevisionPolicy, SyncStrategy};
pub use codec::RevMetaFields;
pub use commit::CommitInfo;
pub use document::{DocInfo, Document, RevMeta, REV_META_SIZE};
pub use store::{DbInfo, Store};
pub use shared::SharedStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of revstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
