//! Async chunk sequence over a channel-like source.
//!
//! # Example
//!
//! ```ignore
//! use chunkex::{chunk_async, AsyncReadSource};
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead + Unpin>(reader: R) -> Result<(), chunkex::ChunkError> {
//!     let mut chunks = chunk_async(AsyncReadSource::new(reader), 4096)?;
//!
//!     while let Some(chunk) = chunks.next_chunk().await {
//!         let chunk = chunk?;
//!         println!("Chunk: {} bytes", chunk.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::future::poll_fn;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use tracing::{debug, trace};

use crate::buffer::{BufferPool, PooledBuffer};
use crate::chunk::Chunk;
use crate::chunker::Chunker;
use crate::error::ChunkError;
use crate::source::ChannelSource;

pin_project! {
    /// A lazy chunk sequence over a [`ChannelSource`].
    ///
    /// Production suspends whenever the channel has nothing to read and
    /// resumes when it does. Like [`ChunkIter`](crate::ChunkIter), every
    /// [`Chunk`] borrows the sequence's single pooled buffer and is
    /// overwritten by the next read.
    ///
    /// The sequence ends when the channel is closed for reading. A read
    /// that returns zero bytes while the channel still reports open is
    /// emitted as one empty chunk; a zero-byte read after which the channel
    /// reports closed ends the sequence without an emission.
    ///
    /// The buffer is rented on the first poll and released on completion,
    /// on error, or when the sequence is dropped.
    pub struct ChannelChunks<'p, C> {
        #[pin]
        source: C,
        pool: &'p BufferPool,
        buffer: Option<PooledBuffer<'p>>,
        chunk_size: usize,
        offset: u64,
        emitted: usize,
        finished: bool,
    }
}

impl<'p, C: ChannelSource> ChannelChunks<'p, C> {
    /// Creates a new sequence. Size validation is the caller's job.
    pub(crate) fn new(source: C, pool: &'p BufferPool, chunk_size: usize) -> Self {
        Self {
            source,
            pool,
            buffer: None,
            chunk_size,
            offset: 0,
            emitted: 0,
            finished: false,
        }
    }

    /// Polls for the next chunk.
    ///
    /// The returned chunk borrows the pinned sequence until it is dropped.
    pub fn poll_next_chunk<'a>(
        mut self: Pin<&'a mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Chunk<'a>, ChunkError>>> {
        let len = match ready!(self.as_mut().poll_fill(cx)) {
            Some(Ok(len)) => len,
            Some(Err(e)) => return Poll::Ready(Some(Err(e))),
            None => return Poll::Ready(None),
        };

        let this = self.project();
        let offset = *this.offset - len as u64;
        let buffer: &'a Option<PooledBuffer<'p>> = this.buffer;
        match buffer.as_deref() {
            Some(buffer) => Poll::Ready(Some(Ok(Chunk::new(buffer, len, offset)))),
            None => Poll::Ready(None),
        }
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
        self.finished && self.buffer.is_none()
    }

    /// Reads the next chunk into the pooled buffer and returns its length.
    fn poll_fill(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<usize, ChunkError>>> {
        let mut this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }

        if this.source.is_closed_for_read() {
            finish(this.finished, this.buffer, *this.emitted, *this.offset);
            return Poll::Ready(None);
        }

        let pool = *this.pool;
        let buffer = this.buffer.get_or_insert_with(|| pool.acquire());
        let read = this
            .source
            .as_mut()
            .poll_read_available(cx, &mut buffer[..*this.chunk_size]);

        match ready!(read) {
            Ok(0) if this.source.is_closed_for_read() => {
                finish(this.finished, this.buffer, *this.emitted, *this.offset);
                Poll::Ready(None)
            }
            Ok(len) => {
                trace!(len, offset = *this.offset, "chunk emitted");
                *this.offset += len as u64;
                *this.emitted += 1;
                Poll::Ready(Some(Ok(len)))
            }
            Err(e) => {
                finish(this.finished, this.buffer, *this.emitted, *this.offset);
                Poll::Ready(Some(Err(ChunkError::SourceRead(e))))
            }
        }
    }
}

impl<C: ChannelSource + Unpin> ChannelChunks<'_, C> {
    /// Waits for the next chunk.
    ///
    /// Returns `None` once the channel is closed for reading.
    pub async fn next_chunk(&mut self) -> Option<Result<Chunk<'_>, ChunkError>> {
        let len = match poll_fn(|cx| Pin::new(&mut *self).poll_fill(cx)).await? {
            Ok(len) => len,
            Err(e) => return Some(Err(e)),
        };

        let offset = self.offset - len as u64;
        let buffer = self.buffer.as_deref()?;
        Some(Ok(Chunk::new(buffer, len, offset)))
    }

    /// Feeds every remaining chunk to `f`, stopping at the first read error.
    pub async fn for_each_chunk<F>(mut self, mut f: F) -> Result<(), ChunkError>
    where
        F: FnMut(Chunk<'_>),
    {
        while let Some(chunk) = self.next_chunk().await {
            f(chunk?);
        }
        Ok(())
    }
}

fn finish(finished: &mut bool, buffer: &mut Option<PooledBuffer<'_>>, emitted: usize, bytes: u64) {
    *finished = true;
    if buffer.take().is_some() {
        debug!(
            chunks = emitted,
            bytes, "channel chunk sequence finished, buffer released"
        );
    }
}

/// Creates a chunk sequence over a channel, backed by the global pool.
///
/// # Errors
///
/// Fails before touching `source` if `chunk_size` is zero or exceeds the
/// global pool's buffer capacity.
///
/// # Runtime Compatibility
///
/// For tokio users, you can use `tokio_util::compat` to convert
/// `tokio::io::AsyncRead` to `futures_io::AsyncRead`:
///
/// ```ignore
/// use tokio_util::compat::TokioAsyncReadCompatExt;
/// use chunkex::{chunk_async, AsyncReadSource};
///
/// let tokio_reader = tokio::fs::File::open("file").await?;
/// let chunks = chunk_async(AsyncReadSource::new(tokio_reader.compat()), 8192)?;
/// ```
pub fn chunk_async<C: ChannelSource>(
    source: C,
    chunk_size: usize,
) -> Result<ChannelChunks<'static, C>, ChunkError> {
    Ok(Chunker::new(chunk_size)?.chunk_channel(source))
}
