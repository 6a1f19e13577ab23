//! Positioned, batch-sized iteration over a [`super::File`]'s chunks.

use crate::error::Result;

use super::File;

/// Yields successive batches of up to `batch_chunks` chunks each (the
/// trailing batch holds whatever real chunks remain, never padded out to a
/// full batch) until the file's chunks are exhausted.
pub struct SegmentIterator<'a> {
    file: &'a File,
    batch_chunks: u64,
    next_chunk: u64,
    total_chunks: u64,
}

impl<'a> SegmentIterator<'a> {
    pub fn new(file: &'a File, batch_chunks: u64) -> Self {
        Self {
            file,
            batch_chunks: batch_chunks.max(1),
            next_chunk: 0,
            total_chunks: file.num_chunks(),
        }
    }

    /// Same iteration, but with an explicit batch size in chunks — used by
    /// the submission builder to walk a sub-tree's chunk range at
    /// segment-sized granularity regardless of the default segment size.
    pub fn with_batch_size(file: &'a File, batch_chunks: u64) -> Self {
        Self::new(file, batch_chunks)
    }
}

impl Iterator for SegmentIterator<'_> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_chunk >= self.total_chunks {
            return None;
        }
        let remaining = self.total_chunks - self.next_chunk;
        let take = remaining.min(self.batch_chunks);
        let result = self.file.read_chunks(self.next_chunk, take);
        self.next_chunk += take;
        Some(result)
    }
}
