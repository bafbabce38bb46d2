//! Error types for chunkex.

/// Errors that can occur while producing chunks.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// The underlying source reported a read failure.
    ///
    /// The sequence that hit it is terminated and its buffer released. No
    /// retry is attempted.
    #[error("source read error: {0}")]
    SourceRead(#[from] std::io::Error),

    /// The requested chunk size exceeds the pool's buffer capacity.
    #[error("chunk size {requested} exceeds pool buffer capacity {capacity}")]
    CapacityExceeded {
        /// The chunk size that was requested.
        requested: usize,
        /// The fixed capacity of every pooled buffer.
        capacity: usize,
    },

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },
}

/// Errors surfaced by the key exchange.
///
/// An unusable provider during probing is never reported through this type;
/// it degrades to a stub key pair instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyExchangeError {
    /// No working curve provider; the key pair in hand is a stub.
    #[error("key agreement unavailable: no usable curve provider")]
    ProviderUnavailable,

    /// Encoded key bytes were malformed or belong to another curve.
    #[error("key parse error: {0}")]
    KeyParse(String),

    /// The raw ECDH derivation failed.
    #[error("key agreement failed: {0}")]
    Agreement(String),

    /// Key pair generation failed.
    #[error("key generation failed: {0}")]
    Generation(String),
}
