//! Test fixture
//!
//! Writes the pair of small stores used to exercise the diff and history
//! tools: overlapping keys, one key saved twice with a lower revision the
//! second time, and one key only written late.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::codec::RevMetaFields;
use crate::config::{Config, OpenMode, SyncStrategy};
use crate::error::Result;
use crate::store::Store;

/// File name of the first fixture store
pub const FIRST_FILE: &str = "file1.rvs";

/// File name of the second fixture store
pub const SECOND_FILE: &str = "file2.rvs";

/// Value stored under every fixture key
pub const FIXTURE_VALUE: &[u8] = b"this would be a value";

/// Metadata stored with every fixture key
pub const FIXTURE_META: RevMetaFields = RevMetaFields::new(1, 2, 3);

/// Which fixture store a save goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    First,
    Second,
}

/// Saves in the order they are issued: (store, key, revision)
const SAVES: &[(Target, &str, u64)] = &[
    (Target::First, "foo", 1),
    (Target::First, "bar", 1),
    (Target::First, "baz", 1),
    (Target::First, "neat", 1),
    (Target::First, "car", 1),
    (Target::Second, "shelf", 9),
    (Target::First, "zoop", 1),
    (Target::First, "zzhuh", 1),
    (Target::Second, "foo", 1),
    (Target::Second, "shelf", 8),
    (Target::Second, "baz", 1),
    (Target::Second, "breeze", 1),
    (Target::Second, "neat", 8),
    (Target::Second, "fear", 1),
    (Target::Second, "zoop", 1),
    (Target::First, "zzbag", 2),
];

/// Create both fixture stores in `dir`, commit and close them
///
/// Returns the paths of the first and second store.
pub fn write_fixture(dir: &Path) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let first_path = dir.join(FIRST_FILE);
    let second_path = dir.join(SECOND_FILE);

    // Start from empty files so reruns produce the same stores
    for path in [&first_path, &second_path] {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
    }

    let mut first = open(&first_path)?;
    let mut second = open(&second_path)?;
    let meta = FIXTURE_META.encode();

    for (target, key, rev) in SAVES {
        let store = match target {
            Target::First => &mut first,
            Target::Second => &mut second,
        };
        store.save(key.as_bytes(), *rev, &meta, false, FIXTURE_VALUE)?;
    }

    first.commit()?;
    second.commit()?;
    first.close()?;
    second.close()?;

    info!(dir = %dir.display(), "wrote fixture stores");
    Ok((first_path, second_path))
}

fn open(path: &Path) -> Result<Store> {
    Store::open(
        Config::builder()
            .path(path)
            .mode(OpenMode::Create)
            .sync_strategy(SyncStrategy::EveryCommit)
            .build(),
    )
}
