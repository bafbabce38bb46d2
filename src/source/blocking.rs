//! Blocking sources: bounded buffers and synchronous streams.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek};

use bytes::Buf;

use crate::util::copy_available;

/// A synchronous byte source.
///
/// `read` follows [`std::io::Read`]: it fills a prefix of `buf` and returns
/// how many bytes it wrote. `available` reports how many bytes are left; a
/// source is exhausted once it reports `0`. A chunk sequence consults it
/// before its first read, to pick the single-chunk or the streaming path,
/// and before every streaming read. A zero-length read while bytes remain
/// is not treated as exhaustion.
pub trait BlockingSource {
    /// Reads up to `buf.len()` bytes into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Returns the number of bytes currently available.
    fn available(&mut self) -> io::Result<usize>;
}

impl<S: BlockingSource + ?Sized> BlockingSource for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn available(&mut self) -> io::Result<usize> {
        (**self).available()
    }
}

impl BlockingSource for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn available(&mut self) -> io::Result<usize> {
        Ok(self.len())
    }
}

impl<T: AsRef<[u8]>> BlockingSource for Cursor<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn available(&mut self) -> io::Result<usize> {
        let len = self.get_ref().as_ref().len() as u64;
        Ok(len.saturating_sub(self.position()) as usize)
    }
}

impl BlockingSource for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn available(&mut self) -> io::Result<usize> {
        let len = self.metadata()?.len();
        let position = self.stream_position()?;
        Ok(usize::try_from(len.saturating_sub(position)).unwrap_or(usize::MAX))
    }
}

/// Adapts an in-memory [`Buf`] into a [`BlockingSource`].
///
/// Availability is [`Buf::remaining`]; reads copy across the buffer's
/// segments, so chained and non-contiguous buffers work too.
#[derive(Debug, Clone)]
pub struct BufSource<B> {
    inner: B,
}

impl<B: Buf> BufSource<B> {
    /// Wraps `inner`.
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    /// Returns the wrapped buffer, advanced past everything read so far.
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: Buf> BlockingSource for BufSource<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(copy_available(&mut self.inner, buf))
    }

    fn available(&mut self) -> io::Result<usize> {
        Ok(self.inner.remaining())
    }
}
