//! Chunked file view: a file on disk addressed in fixed-size chunks, with
//! positioned reads that zero-pad short reads and EOF so every chunk is
//! always exactly [`crate::config::CHUNK`] bytes. Segments are sized by
//! real chunk count, not padded out to a full segment — the trailing
//! segment of a file is however many chunks remain, which keeps the
//! two-level segment tree re-associating to the same root a flat tree over
//! the file's real chunks would produce (see `file::segment`).

pub mod downloader;
pub mod iterator;
pub mod segment;
pub mod submission;
pub mod uploader;

use std::fs;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::config::{CHUNK, SEG_CHUNKS};
use crate::error::Result;

pub use iterator::SegmentIterator;

/// A file opened for chunked, positioned reading.
pub struct File {
    inner: fs::File,
    size: u64,
}

impl File {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = fs::File::open(path)?;
        let size = inner.metadata()?.len();
        Ok(Self { inner, size })
    }

    /// Total size of the file in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of [`CHUNK`]-sized chunks the file decomposes into. A
    /// zero-byte file still has exactly one (all-zero) chunk, so it always
    /// has a well-defined root.
    pub fn num_chunks(&self) -> u64 {
        self.size.div_ceil(CHUNK as u64).max(1)
    }

    /// Number of [`SEG_CHUNKS`]-chunk segments the file decomposes into.
    pub fn num_segments(&self) -> u64 {
        self.num_chunks().div_ceil(SEG_CHUNKS as u64)
    }

    /// Iterate over the file's segments. Every segment but the last is
    /// exactly `SEG_CHUNKS * CHUNK` bytes; the last is however many real
    /// chunks remain (only the final chunk's tail, if any, is zero-padded
    /// to a chunk boundary — no whole extra chunks or segments are
    /// fabricated).
    pub fn segments(&self) -> SegmentIterator<'_> {
        SegmentIterator::new(self, SEG_CHUNKS as u64)
    }

    /// Read `count_chunks` chunks starting at chunk `offset_chunks`,
    /// zero-padding any portion past end-of-file.
    pub fn read_chunks(&self, offset_chunks: u64, count_chunks: u64) -> Result<Vec<u8>> {
        let want = (count_chunks as usize) * CHUNK;
        let mut buf = vec![0u8; want];
        let byte_offset = offset_chunks * CHUNK as u64;
        if byte_offset < self.size {
            let available = (self.size - byte_offset).min(want as u64) as usize;
            self.read_at_fill(&mut buf[..available], byte_offset)?;
        }
        Ok(buf)
    }

    fn read_at_fill(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let mut total = 0usize;
        while total < buf.len() {
            match self.inner.read_at(&mut buf[total..], offset + total as u64) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}
