//! Chunk types.
//!
//! - [`Chunk`] - Borrowed view of one emission: pooled buffer, valid length, offset

mod data;

pub use data::Chunk;
