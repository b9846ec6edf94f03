//! revstore CLI
//!
//! Generates fixture stores and inspects, compares and replays store files.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use revstore::diff::{diff_stores, DiffEntry};
use revstore::fixture::write_fixture;
use revstore::store::{changes_between, Change};
use revstore::{DocInfo, Document, OpenMode, Result, Store};

/// revstore CLI
#[derive(Parser, Debug)]
#[command(name = "revstore")]
#[command(about = "Append-only versioned document store tools")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the two fixture stores into a directory
    Fixture {
        /// Output directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Print every document in a store
    Dump {
        /// Store file
        path: PathBuf,

        /// Also print document values
        #[arg(short, long)]
        bodies: bool,
    },

    /// Print one document
    Get {
        /// Store file
        path: PathBuf,

        /// The key to get
        key: String,
    },

    /// Compare the metadata of two stores
    Diff {
        /// First store file
        first: PathBuf,

        /// Second store file
        second: PathBuf,

        /// Also print document values
        #[arg(short, long)]
        bodies: bool,
    },

    /// Print the changes made by every commit, newest first
    History {
        /// Store file
        path: PathBuf,

        /// Also print document values
        #[arg(short, long)]
        bodies: bool,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,revstore=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Fixture { dir } => {
            let (first, second) = write_fixture(&dir)?;
            println!("Wrote {}", first.display());
            println!("Wrote {}", second.display());
        }
        Commands::Dump { path, bodies } => {
            let mut store = open_read_only(&path)?;
            let info = store.info()?;
            println!(
                "{}: commit {}, {} documents, {} deleted",
                path.display(),
                info.commit_seq,
                info.doc_count,
                info.deleted_count
            );
            for doc_info in store.all_docs()? {
                let doc = if bodies {
                    Some(store.get(&doc_info.key)?)
                } else {
                    None
                };
                print_doc(&doc_info, doc.as_ref());
            }
            store.close()?;
        }
        Commands::Get { path, key } => {
            let mut store = open_read_only(&path)?;
            let doc_info = store.get_info(key.as_bytes())?;
            let doc = store.get(key.as_bytes())?;
            print_doc(&doc_info, Some(&doc));
            store.close()?;
        }
        Commands::Diff {
            first,
            second,
            bodies,
        } => {
            let mut a = open_read_only(&first)?;
            let mut b = open_read_only(&second)?;
            let report = diff_stores(&a, &b)?;

            println!("Found {} entries in {}", a.all_docs()?.len(), first.display());
            println!("Found {} entries in {}\n", b.all_docs()?.len(), second.display());

            for entry in &report.entries {
                match entry {
                    DiffEntry::OnlyInFirst(doc_info) => {
                        println!("Entry only in {}", first.display());
                        let doc = read_body(&mut a, doc_info, bodies)?;
                        print_doc(doc_info, doc.as_ref());
                    }
                    DiffEntry::OnlyInSecond(doc_info) => {
                        println!("Entry only in {}", second.display());
                        let doc = read_body(&mut b, doc_info, bodies)?;
                        print_doc(doc_info, doc.as_ref());
                    }
                    DiffEntry::Differs {
                        first: in_first,
                        second: in_second,
                    } => {
                        println!("(+-) Entry differs between files");
                        println!("  in {}:", first.display());
                        let doc = read_body(&mut a, in_first, bodies)?;
                        print_doc(in_first, doc.as_ref());
                        println!("  in {}:", second.display());
                        let doc = read_body(&mut b, in_second, bodies)?;
                        print_doc(in_second, doc.as_ref());
                    }
                }
            }

            println!("{} entries only in {}", report.only_in_first().count(), first.display());
            println!("{} entries only in {}", report.only_in_second().count(), second.display());
            println!("{} entries in both files differed", report.differing().count());
            println!("{} entries were similar", report.same);
            println!("{} total differences", report.total_differences());

            a.close()?;
            b.close()?;
        }
        Commands::History { path, bodies } => {
            let mut store = open_read_only(&path)?;
            let snapshots = store.history()?;

            for (i, newer) in snapshots.iter().enumerate() {
                let older = snapshots.get(i + 1);
                println!(
                    "commit {} (root at {}): update seq {} -> {}",
                    newer.commit_seq(),
                    newer.root().offset,
                    older.map_or(0, |s| s.update_seq()),
                    newer.update_seq()
                );

                let changes = match older {
                    Some(older) => changes_between(older, newer),
                    None => newer
                        .changes_since(0)
                        .into_iter()
                        .map(|current| Change {
                            current: current.clone(),
                            previous: None,
                        })
                        .collect(),
                };

                for change in changes {
                    let doc = if bodies {
                        Some(store.get_at(newer, &change.current.key)?)
                    } else {
                        None
                    };
                    print_doc(&change.current, doc.as_ref());

                    if let (Some(previous), Some(older)) = (&change.previous, older) {
                        println!("   previously:");
                        let doc = if bodies {
                            Some(store.get_at(older, &previous.key)?)
                        } else {
                            None
                        };
                        print_doc(previous, doc.as_ref());
                    }
                }
            }
            println!("Total headers found: {}", snapshots.len());
            store.close()?;
        }
    }
    Ok(())
}

fn open_read_only(path: &Path) -> Result<Store> {
    Store::open_path(path, OpenMode::ReadOnly)
}

fn read_body(store: &mut Store, info: &DocInfo, bodies: bool) -> Result<Option<Document>> {
    if !bodies {
        return Ok(None);
    }
    store.get(&info.key).map(Some)
}

fn print_doc(info: &DocInfo, doc: Option<&Document>) {
    let fields = info.rev_meta.fields();
    println!("  Doc ID: {}", String::from_utf8_lossy(&info.key));
    println!("     seq: {}", info.db_seq);
    println!("     rev: {}", info.rev_seq);
    println!(
        "     cas: {}, expiry: {}, flags: {}",
        fields.cas, fields.expiry, fields.flags
    );
    if info.deleted {
        println!("     doc deleted");
    }
    if let Some(doc) = doc {
        println!("     data: {}", String::from_utf8_lossy(&doc.value));
    }
    println!();
}
