//! Async chunking for channel-like sources.
//!
//! This module provides asynchronous chunking over [`ChannelSource`]s,
//! runtime-agnostic through `futures-io`:
//!
//! - [`ChannelChunks`] - Lending chunk sequence over a channel
//! - [`chunk_async`] - Creates one, backed by the global pool
//!
//! This module requires the `async-io` feature to be enabled.
//!
//! [`ChannelSource`]: crate::ChannelSource

mod stream;

pub use stream::{ChannelChunks, chunk_async};
