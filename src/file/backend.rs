//! Storage backend
//!
//! Positional I/O used by [`StoreFile`](super::StoreFile).

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Positional byte storage underneath a store file
///
/// Implemented for [`std::fs::File`]. Other implementations can wrap a file
/// to inject failures or count I/O.
pub trait Backend: Send {
    /// Fill `buf` from `offset`; fails if the range runs past the end
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Write all of `data` at `offset`, extending the file if needed
    fn write_all_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()>;

    /// Current length in bytes
    fn size(&mut self) -> io::Result<u64>;

    /// Flush written data to durable storage
    fn sync(&mut self) -> io::Result<()>;
}

impl Backend for File {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }

    fn write_all_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(data)?;
        self.flush()
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}
