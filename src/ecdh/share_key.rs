//! Share key type.

use std::fmt;
use std::hash::{Hash as StdHash, Hasher};

/// A 16-byte symmetric key agreed through ECDH.
///
/// Deterministic in (private key, peer public key) and symmetric across the
/// two parties. `Debug` does not print the key; use
/// [`to_hex`](ShareKey::to_hex) where rendering is intended.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ShareKey([u8; 16]);

impl ShareKey {
    /// The size of the key in bytes.
    pub const SIZE: usize = 16;

    /// Creates a share key from a byte array.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Creates a share key from a slice.
    ///
    /// Returns `None` if the slice is not exactly 16 bytes.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 16] = slice.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns the key as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a key from a 32-character hex string.
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(hex_str, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl From<[u8; 16]> for ShareKey {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ShareKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl StdHash for ShareKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(&self.0);
    }
}

impl fmt::Debug for ShareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShareKey(..)")
    }
}
