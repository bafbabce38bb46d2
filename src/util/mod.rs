//! Internal utility functions and helpers.
//!
//! This module contains small helper functions used throughout the crate.
//! It is an implementation detail and not part of the public API.

use bytes::Buf;

/// Copies up to `dst.len()` bytes out of `src`, advancing it.
///
/// Unlike [`Buf::copy_to_slice`] this never panics on a short source; it
/// reports how many bytes were actually copied.
pub(crate) fn copy_available<B: Buf>(src: &mut B, dst: &mut [u8]) -> usize {
    let n = src.remaining().min(dst.len());
    src.copy_to_slice(&mut dst[..n]);
    n
}
