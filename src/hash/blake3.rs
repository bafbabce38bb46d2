//! BLAKE3-based share-key derivation.

use crate::ecdh::ShareKey;

/// A hasher that condenses key material into a [`ShareKey`].
///
/// The share key is the first 16 bytes of the BLAKE3 output, which is the
/// same as requesting a 16-byte BLAKE3 XOF output.
#[derive(Debug, Clone)]
pub struct Blake3Hasher {
    state: blake3::Hasher,
}

impl Blake3Hasher {
    /// Creates a new hasher.
    pub fn new() -> Self {
        Self {
            state: blake3::Hasher::new(),
        }
    }

    /// Updates the hasher with more data.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Finalizes and returns the share key.
    pub fn finalize(&self) -> ShareKey {
        let mut key = [0u8; ShareKey::SIZE];
        self.state.finalize_xof().fill(&mut key);
        ShareKey::new(key)
    }

    /// Convenience method to derive a share key in one shot.
    pub fn hash(data: &[u8]) -> ShareKey {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}
