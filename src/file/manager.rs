//! Store File Manager
//!
//! Opens the store file, selects the current header and performs all
//! positional I/O on behalf of the store.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::codec::{parse_frame_header, verify_payload, FRAME_HEADER_SIZE};
use crate::config::{OpenMode, SyncStrategy};
use crate::error::{Result, StoreError};

use super::{Backend, FramePointer, Header, DATA_START, HEADER_SLOT_COUNT, HEADER_SLOT_SIZE};

/// An open store file and its current header
pub struct StoreFile {
    /// Path the file was opened from (for messages)
    path: PathBuf,
    /// Positional I/O
    backend: Box<dyn Backend>,
    /// Header of the latest commit visible in this file
    header: Header,
    /// When to fsync
    sync_strategy: SyncStrategy,
}

impl StoreFile {
    /// Open the file at `path` according to `mode`
    ///
    /// - `Create`: create if missing; an empty file is initialized
    /// - `ReadWrite` / `ReadOnly`: missing file fails with `NotFound`
    /// - An existing file without a valid header fails with `Io(InvalidData)`
    pub fn open(path: &Path, mode: OpenMode, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(mode.is_writable())
            .create(mode == OpenMode::Create)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
                _ => StoreError::Io(e),
            })?;

        Self::from_backend(path, Box::new(file), mode, sync_strategy)
    }

    /// Open a store over an arbitrary backend
    pub fn from_backend(
        path: impl Into<PathBuf>,
        mut backend: Box<dyn Backend>,
        mode: OpenMode,
        sync_strategy: SyncStrategy,
    ) -> Result<Self> {
        let path = path.into();
        let size = backend.size()?;

        let header = if size == 0 {
            if mode != OpenMode::Create {
                return Err(StoreError::invalid_file(&path, "file is empty"));
            }
            Self::initialize(&mut *backend)?;
            debug!(path = %path.display(), "initialized new store file");
            Header::empty()
        } else if size < DATA_START {
            return Err(StoreError::invalid_file(&path, "file too short for header"));
        } else {
            Self::read_current_header(&path, &mut *backend)?
        };

        Ok(Self {
            path,
            backend,
            header,
            sync_strategy,
        })
    }

    // =========================================================================
    // Header Handling
    // =========================================================================

    /// Write an empty header into slot A and zero slot B
    fn initialize(backend: &mut dyn Backend) -> Result<()> {
        let mut region = vec![0u8; DATA_START as usize];
        region[..HEADER_SLOT_SIZE].copy_from_slice(&Header::empty().encode());
        backend.write_all_at(0, &region)?;
        backend.sync()?;
        Ok(())
    }

    /// Pick the valid slot with the highest commit sequence
    fn read_current_header(path: &Path, backend: &mut dyn Backend) -> Result<Header> {
        let mut region = vec![0u8; DATA_START as usize];
        backend.read_exact_at(0, &mut region)?;

        let mut best: Option<Header> = None;
        for slot in 0..HEADER_SLOT_COUNT {
            let start = slot * HEADER_SLOT_SIZE;
            let bytes = &region[start..start + HEADER_SLOT_SIZE];

            match Header::decode(bytes) {
                Ok(header) => {
                    if best.map_or(true, |b| header.commit_seq > b.commit_seq) {
                        best = Some(header);
                    }
                }
                Err(e) if bytes.iter().any(|&b| b != 0) => {
                    warn!(path = %path.display(), slot, error = %e, "ignoring invalid header slot");
                }
                Err(_) => {}
            }
        }

        best.ok_or_else(|| StoreError::invalid_file(path, "no valid header slot"))
    }

    /// Publish a header into its slot as the final step of a commit
    ///
    /// The in-memory header only changes once the slot write (and sync, if
    /// configured) succeeded. If either fails, the slot's previous bytes are
    /// written back so the file keeps naming the previous commit.
    pub fn publish_header(&mut self, header: Header) -> Result<()> {
        let offset = Header::slot_offset(header.slot());
        let mut previous = [0u8; HEADER_SLOT_SIZE];
        self.backend.read_exact_at(offset, &mut previous)?;

        if let Err(e) = self.write_slot(offset, &header.encode()) {
            match self.write_slot(offset, &previous) {
                Ok(()) => debug!(
                    commit_seq = header.commit_seq,
                    slot = header.slot(),
                    "restored header slot after failed publish"
                ),
                Err(restore) => warn!(
                    path = %self.path.display(),
                    slot = header.slot(),
                    error = %restore,
                    "could not restore header slot after failed publish"
                ),
            }
            return Err(e);
        }

        debug!(
            commit_seq = header.commit_seq,
            slot = header.slot(),
            "published header"
        );
        self.header = header;
        Ok(())
    }

    fn write_slot(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.backend.write_all_at(offset, bytes)?;
        if self.sync_strategy == SyncStrategy::EveryCommit {
            self.backend.sync()?;
        }
        Ok(())
    }

    /// Header of the latest commit
    pub fn header(&self) -> &Header {
        &self.header
    }

    // =========================================================================
    // Data I/O
    // =========================================================================

    /// Offset at which the next commit's bytes are appended
    ///
    /// Bytes past the current root left behind by a failed commit are
    /// unreferenced; appending after them keeps every committed byte intact.
    pub fn end_offset(&mut self) -> Result<u64> {
        Ok(self.backend.size()?.max(DATA_START))
    }

    /// Append bytes at `offset` (must not precede the data region)
    pub fn append(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        if offset < DATA_START {
            return Err(StoreError::Validation(format!(
                "append at {} would overwrite the header region",
                offset
            )));
        }
        self.backend.write_all_at(offset, bytes)?;
        Ok(())
    }

    /// Sync appended data if the strategy asks for it
    pub fn sync_data(&mut self) -> Result<()> {
        if self.sync_strategy == SyncStrategy::EveryCommit {
            self.backend.sync()?;
        }
        Ok(())
    }

    /// Read and verify the frame at `ptr`, returning its payload
    pub fn read_frame(&mut self, ptr: FramePointer) -> Result<Vec<u8>> {
        if ptr.offset < DATA_START || (ptr.len as usize) < FRAME_HEADER_SIZE {
            return Err(StoreError::Format(format!(
                "Invalid frame pointer: offset {}, len {}",
                ptr.offset, ptr.len
            )));
        }

        let mut bytes = vec![0u8; ptr.len as usize];
        self.backend.read_exact_at(ptr.offset, &mut bytes)?;

        let (len, crc) = parse_frame_header(&bytes[..FRAME_HEADER_SIZE])?;
        if len as usize != bytes.len() - FRAME_HEADER_SIZE {
            return Err(StoreError::Format(format!(
                "Frame at {} has length {}, pointer expects {}",
                ptr.offset,
                len,
                bytes.len() - FRAME_HEADER_SIZE
            )));
        }
        verify_payload(&bytes[FRAME_HEADER_SIZE..], crc)?;

        bytes.drain(..FRAME_HEADER_SIZE);
        Ok(bytes)
    }

    /// Current file size
    pub fn size(&mut self) -> Result<u64> {
        Ok(self.backend.size()?)
    }
}
