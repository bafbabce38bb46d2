//! The Chunk type - one bounded slice of a larger byte source.

use bytes::Bytes;
use std::fmt;
use std::ops::Deref;

/// One emission of a chunk sequence.
///
/// A `Chunk` is a view over the sequence's pooled buffer plus the number of
/// valid bytes the last read placed in it. The buffer is overwritten by the
/// next read, so a chunk borrows its sequence mutably: the compiler rejects
/// any attempt to hold it across the next advance. Copy out what must
/// outlive the step with [`Chunk::to_bytes`].
///
/// # Example
///
/// ```
/// use chunkex::chunked_buf;
///
/// let mut chunks = chunked_buf(&b"hello world"[..], 4)?;
/// let mut kept = Vec::new();
/// while let Some(chunk) = chunks.next_chunk() {
///     kept.push(chunk?.to_bytes());
/// }
/// assert_eq!(kept, ["hell", "o wo", "rld"]);
/// # Ok::<(), chunkex::ChunkError>(())
/// ```
#[derive(Clone, Copy)]
pub struct Chunk<'a> {
    buffer: &'a [u8],
    len: usize,
    offset: u64,
}

impl<'a> Chunk<'a> {
    /// Creates a chunk over `buffer` whose first `len` bytes are valid.
    ///
    /// `len` is clamped to the buffer length.
    pub fn new(buffer: &'a [u8], len: usize, offset: u64) -> Self {
        Self {
            buffer,
            len: len.min(buffer.len()),
            offset,
        }
    }

    /// Returns the valid bytes.
    pub fn data(&self) -> &'a [u8] {
        &self.buffer[..self.len]
    }

    /// Returns the number of valid bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the read behind this chunk produced no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the capacity of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the offset of the first valid byte in the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the end offset (exclusive).
    pub fn end(&self) -> u64 {
        self.offset + self.len as u64
    }

    /// Returns the chunk as a range of source offsets.
    pub fn range(&self) -> std::ops::Range<u64> {
        self.offset..self.end()
    }

    /// Copies the valid bytes into an owned [`Bytes`].
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.data())
    }
}

impl Deref for Chunk<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data()
    }
}

impl AsRef<[u8]> for Chunk<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}

impl fmt::Debug for Chunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("offset", &self.offset)
            .finish()
    }
}

impl fmt::Display for Chunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chunk({} bytes @ {})", self.len, self.offset)
    }
}
