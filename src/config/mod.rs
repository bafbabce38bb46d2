//! Configuration for buffer pooling.
//!
//! - [`PoolConfig`] - Buffer capacity and idle-buffer retention of a [`BufferPool`]
//!
//! # Example
//!
//! ```
//! use chunkex::PoolConfig;
//!
//! // Custom capacity, default retention
//! let config = PoolConfig::new(16 * 1024, 8)?;
//!
//! // Builder pattern
//! let config = PoolConfig::default()
//!     .with_buffer_capacity(8192)
//!     .with_max_idle(4);
//! config.validate()?;
//! # Ok::<(), chunkex::ChunkError>(())
//! ```
//!
//! [`BufferPool`]: crate::BufferPool

use crate::error::ChunkError;

/// Default capacity of every pooled buffer (64 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Default number of idle buffers a pool keeps for reuse.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Configuration for a [`BufferPool`](crate::BufferPool).
///
/// - `buffer_capacity` - Uniform size of every buffer; upper bound for chunk sizes
/// - `max_idle` - How many released buffers are retained for reuse
///
/// Acquisitions beyond `max_idle` concurrent buffers still succeed; the
/// extra buffers are freed instead of retained when they come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolConfig {
    buffer_capacity: usize,
    max_idle: usize,
}

impl PoolConfig {
    /// Creates a new configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidConfig`] if `buffer_capacity` or
    /// `max_idle` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use chunkex::PoolConfig;
    ///
    /// let config = PoolConfig::new(4096, 2)?;
    /// assert_eq!(config.buffer_capacity(), 4096);
    /// # Ok::<(), chunkex::ChunkError>(())
    /// ```
    pub fn new(buffer_capacity: usize, max_idle: usize) -> Result<Self, ChunkError> {
        if buffer_capacity == 0 {
            return Err(ChunkError::InvalidConfig {
                message: "buffer capacity must be non-zero",
            });
        }

        if max_idle == 0 {
            return Err(ChunkError::InvalidConfig {
                message: "max_idle must be non-zero",
            });
        }

        Ok(Self {
            buffer_capacity,
            max_idle,
        })
    }

    /// Sets the buffer capacity.
    ///
    /// Note: This does not validate the configuration. Use [`PoolConfig::validate`]
    /// to check if the configuration is valid.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Sets how many idle buffers are retained.
    ///
    /// Note: This does not validate the configuration.
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Returns the capacity of every pooled buffer.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// Returns the idle-buffer retention limit.
    pub fn max_idle(&self) -> usize {
        self.max_idle
    }

    /// Validates the current configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use chunkex::PoolConfig;
    ///
    /// let config = PoolConfig::default().with_buffer_capacity(0);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ChunkError> {
        Self::new(self.buffer_capacity, self.max_idle).map(|_| ())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_idle: DEFAULT_MAX_IDLE,
        }
    }
}
