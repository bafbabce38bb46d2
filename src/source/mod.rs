//! Byte sources a chunk sequence can draw from.
//!
//! - [`BlockingSource`] - Synchronous "read up to N" plus "bytes available now"
//! - [`BufSource`] - Adapts any in-memory [`bytes::Buf`] with a known remaining length
//! - [`ChannelSource`] - Asynchronous "read up to N" plus "closed for reading"
//!   (requires `async-io`)
//! - [`AsyncReadSource`], [`ByteStreamSource`] - Channel adapters for
//!   `futures_io::AsyncRead` and streams of byte frames (requires `async-io`)

mod blocking;

#[cfg(feature = "async-io")]
mod channel;

pub use blocking::{BlockingSource, BufSource};

#[cfg(feature = "async-io")]
pub use channel::{AsyncReadSource, ByteStreamSource, ChannelSource};
