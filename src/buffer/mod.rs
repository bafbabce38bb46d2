//! Buffer management for allocation-free chunking.
//!
//! This module provides a shared pool of fixed-capacity buffers. A chunk
//! sequence rents one buffer for its whole lifetime and overwrites it for
//! every emission, so producing chunks costs no allocation per chunk.

mod pool;

pub use pool::{BufferPool, PooledBuffer};
