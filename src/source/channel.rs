//! Channel-like sources for asynchronous chunking.
//!
//! A channel has no known length up front. It can only be asked to read
//! whatever is available (waiting for data if none is) and whether it has
//! been closed for reading.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Buf, Bytes};
use futures_core::Stream;
use futures_io::AsyncRead;
use pin_project_lite::pin_project;

use crate::util::copy_available;

/// An asynchronous, potentially unbounded byte source.
///
/// `poll_read_available` waits until at least one byte is available or the
/// channel closes, then copies up to `buf.len()` bytes. A read may return
/// `0` without the channel being closed; callers must consult
/// [`ChannelSource::is_closed_for_read`] to tell the two apart.
pub trait ChannelSource {
    /// Attempts to read up to `buf.len()` bytes into `buf`.
    fn poll_read_available(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>>;

    /// Returns true once no further bytes will ever be read.
    fn is_closed_for_read(&self) -> bool;
}

impl<S: ChannelSource + Unpin + ?Sized> ChannelSource for &mut S {
    fn poll_read_available(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut **self).poll_read_available(cx, buf)
    }

    fn is_closed_for_read(&self) -> bool {
        (**self).is_closed_for_read()
    }
}

pin_project! {
    /// Adapts a `futures_io::AsyncRead` into a [`ChannelSource`].
    ///
    /// The reader counts as closed after its first zero-length read into a
    /// non-empty buffer.
    ///
    /// For tokio readers, go through `tokio_util::compat` first:
    ///
    /// ```ignore
    /// use tokio_util::compat::TokioAsyncReadCompatExt;
    /// use chunkex::AsyncReadSource;
    ///
    /// let file = tokio::fs::File::open("data.bin").await?;
    /// let source = AsyncReadSource::new(file.compat());
    /// ```
    #[derive(Debug)]
    pub struct AsyncReadSource<R> {
        #[pin]
        reader: R,
        eof: bool,
    }
}

impl<R: AsyncRead> AsyncReadSource<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader, eof: false }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead> ChannelSource for AsyncReadSource<R> {
    fn poll_read_available(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.project();
        if *this.eof {
            return Poll::Ready(Ok(0));
        }

        let n = ready!(this.reader.poll_read(cx, buf))?;
        if n == 0 && !buf.is_empty() {
            *this.eof = true;
        }
        Poll::Ready(Ok(n))
    }

    fn is_closed_for_read(&self) -> bool {
        self.eof
    }
}

pin_project! {
    /// Adapts a stream of byte frames into a [`ChannelSource`].
    ///
    /// Frames are copied out across as many reads as they need; a read
    /// never spans two frames. The source is closed once the stream has
    /// ended and the last frame has been drained. Empty frames are skipped.
    #[derive(Debug)]
    pub struct ByteStreamSource<S> {
        #[pin]
        stream: S,
        pending: Bytes,
        ended: bool,
    }
}

impl<S> ByteStreamSource<S>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    /// Wraps `stream`.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: Bytes::new(),
            ended: false,
        }
    }
}

impl<S> ChannelSource for ByteStreamSource<S>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    fn poll_read_available(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let mut this = self.project();
        loop {
            if this.pending.has_remaining() {
                return Poll::Ready(Ok(copy_available(this.pending, buf)));
            }
            if *this.ended {
                return Poll::Ready(Ok(0));
            }

            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(frame)) => *this.pending = frame,
                Some(Err(e)) => return Poll::Ready(Err(e)),
                None => *this.ended = true,
            }
        }
    }

    fn is_closed_for_read(&self) -> bool {
        self.ended && self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::poll_fn;
    use futures_util::stream;

    async fn read<C: ChannelSource + Unpin>(source: &mut C, buf: &mut [u8]) -> io::Result<usize> {
        poll_fn(|cx| Pin::new(&mut *source).poll_read_available(cx, buf)).await
    }

    #[tokio::test]
    async fn test_async_read_source_closes_on_eof() {
        let mut source = AsyncReadSource::new(&b"abc"[..]);
        let mut buf = [0u8; 8];

        assert_eq!(read(&mut source, &mut buf).await.unwrap(), 3);
        assert!(!source.is_closed_for_read());
        assert_eq!(read(&mut source, &mut buf).await.unwrap(), 0);
        assert!(source.is_closed_for_read());
    }

    #[tokio::test]
    async fn test_byte_stream_source_splits_frames() {
        let frames = vec![
            Ok(Bytes::from_static(b"hello")),
            Ok(Bytes::new()),
            Ok(Bytes::from_static(b"!")),
        ];
        let mut source = ByteStreamSource::new(stream::iter(frames));
        let mut buf = [0u8; 3];

        assert_eq!(read(&mut source, &mut buf).await.unwrap(), 3);
        assert_eq!(&buf, b"hel");
        assert_eq!(read(&mut source, &mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"lo");
        assert_eq!(read(&mut source, &mut buf).await.unwrap(), 1);
        assert!(!source.is_closed_for_read());
        assert_eq!(read(&mut source, &mut buf).await.unwrap(), 0);
        assert!(source.is_closed_for_read());
    }

    #[tokio::test]
    async fn test_byte_stream_source_propagates_errors() {
        let frames = vec![Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))];
        let mut source = ByteStreamSource::new(stream::iter(frames));
        let mut buf = [0u8; 3];

        let err = read(&mut source, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
