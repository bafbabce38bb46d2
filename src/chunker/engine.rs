//! Chunker - validated entry point for chunk sequences.
//!
//! A [`Chunker`] pairs a chunk size with the pool that backs every
//! sequence it starts. Validation happens once, here, before any source
//! is touched:
//!
//! - a zero chunk size is rejected with [`ChunkError::InvalidConfig`]
//! - a chunk size above the pool's buffer capacity is rejected with
//!   [`ChunkError::CapacityExceeded`]
//!
//! # Example
//!
//! ```
//! use chunkex::{BufferPool, Chunker, PoolConfig};
//!
//! let pool = BufferPool::new(PoolConfig::new(1024, 4)?);
//! let chunker = Chunker::with_pool(&pool, 300)?;
//!
//! let data = vec![0xABu8; 1000];
//! let mut lens = Vec::new();
//! chunker.chunk_buf(&data[..]).for_each_chunk(|chunk| lens.push(chunk.len()))?;
//! assert_eq!(lens, [300, 300, 300, 100]);
//! # Ok::<(), chunkex::ChunkError>(())
//! ```

use bytes::Buf;

use crate::buffer::BufferPool;
use crate::error::ChunkError;
use crate::source::{BlockingSource, BufSource};

use super::ChunkIter;

#[cfg(feature = "async-io")]
use crate::async_stream::ChannelChunks;
#[cfg(feature = "async-io")]
use crate::source::ChannelSource;

/// Starts chunk sequences of one fixed size from one pool.
///
/// `Chunker` is `Copy`; each call to [`chunk`](Chunker::chunk),
/// [`chunk_buf`](Chunker::chunk_buf) or
/// [`chunk_channel`](Chunker::chunk_channel) starts an independent sequence
/// that rents its own buffer on first use.
#[derive(Debug, Clone, Copy)]
pub struct Chunker<'p> {
    pool: &'p BufferPool,
    chunk_size: usize,
}

impl Chunker<'static> {
    /// Creates a chunker backed by [`BufferPool::global`].
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidConfig`] for a zero `chunk_size` and
    /// [`ChunkError::CapacityExceeded`] if it exceeds the global pool's capacity.
    pub fn new(chunk_size: usize) -> Result<Self, ChunkError> {
        Self::with_pool(BufferPool::global(), chunk_size)
    }
}

impl<'p> Chunker<'p> {
    /// Creates a chunker backed by `pool`.
    ///
    /// # Errors
    ///
    /// Same as [`Chunker::new`], checked against `pool`.
    pub fn with_pool(pool: &'p BufferPool, chunk_size: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidConfig {
                message: "chunk size must be non-zero",
            });
        }
        pool.check_capacity(chunk_size)?;

        Ok(Self { pool, chunk_size })
    }

    /// Returns the maximum number of bytes per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the pool backing this chunker's sequences.
    pub fn pool(&self) -> &'p BufferPool {
        self.pool
    }

    /// Creates a lazy chunk sequence over a blocking source.
    pub fn chunk<S: BlockingSource>(self, source: S) -> ChunkIter<'p, S> {
        ChunkIter::new(source, self.pool, self.chunk_size)
    }

    /// Creates a lazy chunk sequence over an in-memory buffer.
    pub fn chunk_buf<B: Buf>(self, buf: B) -> ChunkIter<'p, BufSource<B>> {
        self.chunk(BufSource::new(buf))
    }

    /// Creates a lazy chunk sequence over a channel-like source.
    #[cfg(feature = "async-io")]
    pub fn chunk_channel<C: ChannelSource>(self, source: C) -> ChannelChunks<'p, C> {
        ChannelChunks::new(source, self.pool, self.chunk_size)
    }
}

/// Chunks a blocking source into pieces of at most `chunk_size` bytes,
/// backed by the global pool.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use chunkex::chunked;
///
/// let mut chunks = chunked(Cursor::new(vec![1u8; 250]), 300)?;
/// let only = chunks.next_chunk().unwrap()?;
/// assert_eq!(only.len(), 250);
/// assert!(chunks.next_chunk().is_none());
/// # Ok::<(), chunkex::ChunkError>(())
/// ```
pub fn chunked<S: BlockingSource>(
    source: S,
    chunk_size: usize,
) -> Result<ChunkIter<'static, S>, ChunkError> {
    Ok(Chunker::new(chunk_size)?.chunk(source))
}

/// Chunks an in-memory buffer into pieces of at most `chunk_size` bytes,
/// backed by the global pool.
pub fn chunked_buf<B: Buf>(
    buf: B,
    chunk_size: usize,
) -> Result<ChunkIter<'static, BufSource<B>>, ChunkError> {
    Ok(Chunker::new(chunk_size)?.chunk_buf(buf))
}
