//! Share-key digest.
//!
//! Raw ECDH output is variable-length curve material; it is never used as a
//! key directly. This module condenses it into a fixed 128-bit
//! [`ShareKey`](crate::ShareKey) with BLAKE3, truncated to 16 bytes.
//!
//! - [`Blake3Hasher`] - BLAKE3 digest producing share keys

mod blake3;

pub use blake3::Blake3Hasher;
