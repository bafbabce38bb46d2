//! Chunking engine for bounded and blocking sources.
//!
//! - [`Chunker`] - Validated chunk size bound to a [`BufferPool`](crate::BufferPool)
//! - [`ChunkIter`] - Lending sequence of chunks over a [`BlockingSource`](crate::BlockingSource)

mod engine;
mod iter;

pub use engine::{Chunker, chunked, chunked_buf};
pub use iter::{ChunkIter, Copied};
