//! chunkex
//!
//! Pooled-buffer chunking and ECDH share keys for Rust.
//!
//! `chunkex` provides the two primitives a secure byte transport is
//! bootstrapped from:
//!
//! - a chunker that turns byte sources (in-memory buffers, blocking
//!   readers, asynchronous channels) into bounded-size chunks without an
//!   allocation per chunk
//! - an ECDH key exchange that turns a local key pair and a peer public key
//!   into a 16-byte share key, degrading to an explicit stub key pair when
//!   no curve provider is usable
//!
//! The crate intentionally:
//! - does NOT encrypt anything with the share key
//! - does NOT frame or transport chunks
//! - does NOT spawn threads or tasks
//!
//! # Sync
//!
//! ```no_run
//! use std::fs::File;
//! use chunkex::{chunked, ChunkError};
//!
//! fn main() -> Result<(), ChunkError> {
//!     let file = File::open("data.bin")?;
//!     let mut chunks = chunked(file, 8192)?;
//!
//!     while let Some(chunk) = chunks.next_chunk() {
//!         let chunk = chunk?;
//!         println!("chunk {} bytes @ {}", chunk.len(), chunk.offset());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use chunkex::{chunk_async, AsyncReadSource};
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead + Unpin>(reader: R) -> Result<(), chunkex::ChunkError> {
//!     let mut chunks = chunk_async(AsyncReadSource::new(reader), 8192)?;
//!
//!     while let Some(chunk) = chunks.next_chunk().await {
//!         let chunk = chunk?;
//!         println!("chunk {}", chunk.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Key exchange (feature = "ecdh")
//!
//! ```
//! use chunkex::{Ecdh, KeyExchange};
//!
//! let exchange = KeyExchange::new();
//! let local = Ecdh::new(exchange.clone());
//! let remote = Ecdh::new(exchange);
//!
//! if let (Some(local_pub), Some(remote_pub)) = (local.public_key(), remote.public_key()) {
//!     let k1 = local.calculate_share_key_by_peer_public_key(remote_pub)?;
//!     let k2 = remote.calculate_share_key_by_peer_public_key(local_pub)?;
//!     assert_eq!(k1, k2);
//! }
//! # Ok::<(), chunkex::KeyExchangeError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod chunker;
mod config;
mod error;
mod source;

mod buffer; // internal (shared buffer pool)
mod util; // internal (bounded Buf copy)

#[cfg(feature = "async-io")]
mod async_stream;

#[cfg(feature = "ecdh")]
mod ecdh;
#[cfg(feature = "ecdh")]
mod hash; // internal blake3 share-key digest

//
// Public surface
//

pub use buffer::{BufferPool, PooledBuffer};
pub use chunk::Chunk;
pub use chunker::{ChunkIter, Chunker, Copied, chunked, chunked_buf};
pub use config::{DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_IDLE, PoolConfig};
pub use error::{ChunkError, KeyExchangeError};
pub use source::{BlockingSource, BufSource};

#[cfg(feature = "async-io")]
pub use async_stream::{ChannelChunks, chunk_async};
#[cfg(feature = "async-io")]
pub use source::{AsyncReadSource, ByteStreamSource, ChannelSource};

#[cfg(feature = "ecdh")]
pub use ecdh::{
    CurveProvider, Ecdh, EcdhKeyPair, KeyExchange, KeyPair, P256_INITIAL_PUBLIC_KEY,
    P256Provider, PrivateKey, PublicKey, ShareKey,
};
