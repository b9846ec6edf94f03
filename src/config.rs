//! Configuration for revstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a revstore handle
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // File Configuration
    // -------------------------------------------------------------------------
    /// Path of the single store file
    pub path: PathBuf,

    /// How the file is opened
    pub mode: OpenMode,

    // -------------------------------------------------------------------------
    // Commit Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: when commit calls fsync
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Document Configuration
    // -------------------------------------------------------------------------
    /// Whether save checks revision sequences per key
    pub revision_policy: RevisionPolicy,
}

/// How a store file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file if it is missing; read-write
    Create,

    /// The file must already exist; read-write
    ReadWrite,

    /// The file must already exist; save and commit are rejected
    ReadOnly,
}

impl OpenMode {
    /// Whether this mode allows save/delete/commit
    pub fn is_writable(self) -> bool {
        !matches!(self, OpenMode::ReadOnly)
    }
}

/// Commit sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync appended data before publishing the header, then fsync the header
    EveryCommit,

    /// Never fsync (tests and throwaway data only)
    Never,
}

/// Revision sequence validation on save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionPolicy {
    /// Accept any revision sequence
    Unchecked,

    /// Reject a save whose revision is not greater than the current one for the key
    Monotonic,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./store.rvs"),
            mode: OpenMode::Create,
            sync_strategy: SyncStrategy::EveryCommit,
            revision_policy: RevisionPolicy::Unchecked,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the open mode
    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the commit sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the revision policy
    pub fn revision_policy(mut self, policy: RevisionPolicy) -> Self {
        self.config.revision_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
