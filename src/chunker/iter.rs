//! ChunkIter - lending chunk sequence over a blocking source.
//!
//! The sequence rents a single buffer from its pool on the first call to
//! [`ChunkIter::next_chunk`] and reuses it for every emission. The buffer
//! goes back to the pool exactly once: when the sequence reports
//! exhaustion, when a read fails, or when the sequence is dropped early.
//!
//! Emission policy, driven by [`BlockingSource::available`]:
//!
//! - nothing available at the first call: no chunks at all
//! - at most one chunk's worth: a single chunk holding whatever one read of
//!   that many bytes reports, short reads included, never topped up
//! - more: one chunk per read of up to `chunk_size` bytes, until the source
//!   reports nothing available. A zero-length read from a source that still
//!   reports bytes available is emitted as an empty chunk.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::buffer::{BufferPool, PooledBuffer};
use crate::chunk::Chunk;
use crate::error::ChunkError;
use crate::source::BlockingSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Streaming,
    Done,
}

/// A lazy, finite sequence of chunks read from a [`BlockingSource`].
///
/// `ChunkIter` is a *lending* sequence: every [`Chunk`] borrows the
/// sequence's buffer, which the next read overwrites. It therefore does not
/// implement [`Iterator`]; drive it with [`next_chunk`](ChunkIter::next_chunk)
/// or [`for_each_chunk`](ChunkIter::for_each_chunk), or switch to
/// [`copied`](ChunkIter::copied) when owned chunks are worth one copy each.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use chunkex::chunked;
///
/// let data: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
/// let mut chunks = chunked(Cursor::new(&data), 300)?;
///
/// let mut rebuilt = Vec::new();
/// while let Some(chunk) = chunks.next_chunk() {
///     rebuilt.extend_from_slice(&chunk?);
/// }
/// assert_eq!(rebuilt, data);
/// # Ok::<(), chunkex::ChunkError>(())
/// ```
#[derive(Debug)]
pub struct ChunkIter<'p, S> {
    source: S,
    pool: &'p BufferPool,
    buffer: Option<PooledBuffer<'p>>,
    chunk_size: usize,
    offset: u64,
    emitted: usize,
    state: State,
}

impl<'p, S: BlockingSource> ChunkIter<'p, S> {
    /// Creates a new chunk sequence. Size validation is the caller's job.
    pub(crate) fn new(source: S, pool: &'p BufferPool, chunk_size: usize) -> Self {
        Self {
            source,
            pool,
            buffer: None,
            chunk_size,
            offset: 0,
            emitted: 0,
            state: State::Fresh,
        }
    }

    /// Advances the sequence and returns the next chunk.
    ///
    /// Returns `None` once the source is exhausted; the pooled buffer has
    /// been released by then. A read error is returned once and ends the
    /// sequence.
    pub fn next_chunk(&mut self) -> Option<Result<Chunk<'_>, ChunkError>> {
        let len = match self.advance() {
            Ok(Some(len)) => len,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };

        let offset = self.offset;
        self.offset += len as u64;
        self.emitted += 1;
        trace!(len, offset, "chunk emitted");

        let buffer = self.buffer.as_deref()?;
        Some(Ok(Chunk::new(buffer, len, offset)))
    }

    /// Feeds every remaining chunk to `f`, stopping at the first read error.
    pub fn for_each_chunk<F>(mut self, mut f: F) -> Result<(), ChunkError>
    where
        F: FnMut(Chunk<'_>),
    {
        while let Some(chunk) = self.next_chunk() {
            f(chunk?);
        }
        Ok(())
    }

    /// Converts into a standard iterator of owned chunks.
    ///
    /// Each item is copied out of the pooled buffer; the sequence itself
    /// still rents only one buffer.
    pub fn copied(self) -> Copied<'p, S> {
        Copied { inner: self }
    }

    /// Returns the maximum number of bytes per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the number of bytes emitted so far.
    pub fn bytes_emitted(&self) -> u64 {
        self.offset
    }

    /// Returns true once the sequence has ended and released its buffer.
    pub fn is_finished(&self) -> bool {
        self.state == State::Done && self.buffer.is_none()
    }

    fn advance(&mut self) -> Result<Option<usize>, ChunkError> {
        let step = self.step();
        if !matches!(step, Ok(Some(_))) {
            self.finish();
        }
        step
    }

    fn step(&mut self) -> Result<Option<usize>, ChunkError> {
        match self.state {
            State::Done => Ok(None),
            State::Fresh => {
                let available = self.source.available()?;
                if available == 0 {
                    return Ok(None);
                }

                let buffer = self.buffer.insert(self.pool.acquire());
                if available <= self.chunk_size {
                    self.state = State::Done;
                    let n = self.source.read(&mut buffer[..available])?;
                    Ok(Some(n))
                } else {
                    self.state = State::Streaming;
                    self.read_next()
                }
            }
            State::Streaming => {
                if self.source.available()? == 0 {
                    return Ok(None);
                }
                self.read_next()
            }
        }
    }

    fn read_next(&mut self) -> Result<Option<usize>, ChunkError> {
        let Some(buffer) = self.buffer.as_deref_mut() else {
            return Ok(None);
        };
        let n = self.source.read(&mut buffer[..self.chunk_size])?;
        Ok(Some(n))
    }

    fn finish(&mut self) {
        self.state = State::Done;
        if self.buffer.take().is_some() {
            debug!(
                chunks = self.emitted,
                bytes = self.offset,
                "chunk sequence finished, buffer released"
            );
        }
    }
}

/// Iterator of owned chunks, created by [`ChunkIter::copied`].
#[derive(Debug)]
pub struct Copied<'p, S> {
    inner: ChunkIter<'p, S>,
}

impl<S: BlockingSource> Iterator for Copied<'_, S> {
    type Item = Result<Bytes, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next_chunk()
            .map(|chunk| chunk.map(|chunk| chunk.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::source::BufSource;
    use std::io::{self, Cursor};

    fn pool() -> BufferPool {
        BufferPool::new(PoolConfig::new(1024, 2).unwrap())
    }

    fn lengths<S: BlockingSource>(mut iter: ChunkIter<'_, S>) -> Vec<usize> {
        let mut lens = Vec::new();
        while let Some(chunk) = iter.next_chunk() {
            lens.push(chunk.unwrap().len());
        }
        lens
    }

    /// Reports more bytes than its reads deliver.
    struct ShortReader {
        claimed: usize,
        delivered: usize,
        reads: usize,
    }

    impl BlockingSource for ShortReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            let n = self.delivered.min(buf.len());
            buf[..n].fill(0x5A);
            self.delivered -= n;
            Ok(n)
        }

        fn available(&mut self) -> io::Result<usize> {
            Ok(self.claimed)
        }
    }

    /// Holds `data`, but one read returns nothing while bytes remain.
    struct StallingReader {
        data: Vec<u8>,
        pos: usize,
        reads: usize,
        stall_at: usize,
    }

    impl BlockingSource for StallingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.reads == self.stall_at {
                return Ok(0);
            }
            let n = (self.data.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }

        fn available(&mut self) -> io::Result<usize> {
            Ok(self.data.len() - self.pos)
        }
    }

    /// Fails on the second read.
    struct FailingReader {
        reads: usize,
    }

    impl BlockingSource for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.reads > 1 {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            buf.fill(1);
            Ok(buf.len())
        }

        fn available(&mut self) -> io::Result<usize> {
            Ok(usize::MAX)
        }
    }

    #[test]
    fn test_exact_split() {
        let pool = pool();
        let data = vec![7u8; 1000];
        let iter = ChunkIter::new(BufSource::new(&data[..]), &pool, 300);
        assert_eq!(lengths(iter), [300, 300, 300, 100]);
    }

    #[test]
    fn test_multiple_of_chunk_size() {
        let pool = pool();
        let data = vec![7u8; 900];
        let iter = ChunkIter::new(Cursor::new(data), &pool, 300);
        assert_eq!(lengths(iter), [300, 300, 300]);
    }

    #[test]
    fn test_small_source_single_chunk() {
        let pool = pool();
        let data = vec![7u8; 250];
        let iter = ChunkIter::new(&data[..], &pool, 300);
        assert_eq!(lengths(iter), [250]);
    }

    #[test]
    fn test_source_equal_to_chunk_size() {
        let pool = pool();
        let data = vec![7u8; 300];
        let iter = ChunkIter::new(&data[..], &pool, 300);
        assert_eq!(lengths(iter), [300]);
    }

    #[test]
    fn test_empty_source_yields_nothing() {
        let pool = pool();
        let mut iter = ChunkIter::new(&b""[..], &pool, 300);
        assert!(iter.next_chunk().is_none());
        assert!(iter.is_finished());
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.idle(), 0, "an empty source never rents a buffer");
    }

    #[test]
    fn test_short_first_read_is_passed_through_once() {
        let pool = pool();
        let mut source = ShortReader {
            claimed: 200,
            delivered: 120,
            reads: 0,
        };
        let iter = ChunkIter::new(&mut source, &pool, 300);
        assert_eq!(lengths(iter), [120]);
        assert_eq!(source.reads, 1, "no refill after a short read");
    }

    #[test]
    fn test_offsets_are_cumulative() {
        let pool = pool();
        let data: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
        let mut iter = ChunkIter::new(&data[..], &pool, 300);

        let mut expected = 0u64;
        while let Some(chunk) = iter.next_chunk() {
            let chunk = chunk.unwrap();
            assert_eq!(chunk.offset(), expected);
            assert_eq!(chunk.data(), &data[expected as usize..chunk.end() as usize]);
            expected = chunk.end();
        }
        assert_eq!(iter.bytes_emitted(), 1000);
    }

    #[test]
    fn test_single_buffer_reused_across_emissions() {
        let pool = pool();
        let data = vec![1u8; 1000];
        let mut iter = ChunkIter::new(&data[..], &pool, 100);

        let mut first_ptr = None;
        while let Some(chunk) = iter.next_chunk() {
            let ptr = chunk.unwrap().data().as_ptr();
            assert_eq!(*first_ptr.get_or_insert(ptr), ptr);
            assert_eq!(pool.in_use(), 1);
        }
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_abandoned_sequence_returns_buffer() {
        let pool = pool();
        let data = vec![1u8; 1000];
        {
            let mut iter = ChunkIter::new(&data[..], &pool, 100);
            assert!(iter.next_chunk().is_some());
            assert_eq!(pool.in_use(), 1);
        }
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_stalled_read_emits_empty_chunk_and_continues() {
        let pool = pool();
        let data: Vec<u8> = (0..1000).map(|i| (i % 251) as u8).collect();
        let mut source = StallingReader {
            data: data.clone(),
            pos: 0,
            reads: 0,
            stall_at: 2,
        };

        let mut iter = ChunkIter::new(&mut source, &pool, 300);
        let mut lens = Vec::new();
        let mut rebuilt = Vec::new();
        while let Some(chunk) = iter.next_chunk() {
            let chunk = chunk.unwrap();
            assert_eq!(chunk.offset(), rebuilt.len() as u64);
            lens.push(chunk.len());
            rebuilt.extend_from_slice(&chunk);
        }
        drop(iter);

        assert_eq!(lens, [300, 0, 300, 300, 100]);
        assert_eq!(rebuilt, data);
        assert_eq!(source.available().unwrap(), 0);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_read_error_terminates_and_releases() {
        let pool = pool();
        let mut iter = ChunkIter::new(FailingReader { reads: 0 }, &pool, 64);

        assert_eq!(iter.next_chunk().unwrap().unwrap().len(), 64);
        let err = iter.next_chunk().unwrap().unwrap_err();
        assert!(matches!(err, ChunkError::SourceRead(_)));
        assert_eq!(pool.in_use(), 0);
        assert!(iter.next_chunk().is_none());
        assert!(iter.is_finished());
    }

    #[test]
    fn test_for_each_chunk_propagates_error() {
        let pool = pool();
        let iter = ChunkIter::new(FailingReader { reads: 0 }, &pool, 64);
        let mut seen = 0;
        let result = iter.for_each_chunk(|_| seen += 1);
        assert!(result.is_err());
        assert_eq!(seen, 1);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_copied_yields_owned_chunks() {
        let pool = pool();
        let chunks: Vec<Bytes> = ChunkIter::new(&b"hello world"[..], &pool, 4)
            .copied()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(chunks, ["hell", "o wo", "rld"]);
    }
}
