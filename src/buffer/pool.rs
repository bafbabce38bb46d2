//! Shared buffer pool for efficient memory reuse.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::config::PoolConfig;
use crate::error::ChunkError;

static GLOBAL_POOL: LazyLock<BufferPool> = LazyLock::new(|| BufferPool::new(PoolConfig::default()));

/// A pool of reusable byte buffers of one fixed capacity.
///
/// Buffers are allocated lazily, handed out behind a [`PooledBuffer`] guard
/// and returned when the guard drops, whatever the exit path. The pool is
/// `Sync`: unrelated producers on different threads or tasks may acquire
/// concurrently, and no two live guards ever share a buffer.
///
/// When more buffers are in use than the pool retains, acquisition still
/// succeeds with a freshly allocated buffer; on release the surplus is
/// freed rather than kept.
///
/// # Example
///
/// ```
/// use chunkex::{BufferPool, PoolConfig};
///
/// let pool = BufferPool::new(PoolConfig::new(1024, 2)?);
/// let sum = pool.with_buffer(|buf| {
///     buf[..3].copy_from_slice(b"abc");
///     buf[..3].iter().map(|&b| b as u32).sum::<u32>()
/// });
/// assert_eq!(sum, 294);
/// assert_eq!(pool.in_use(), 0);
/// # Ok::<(), chunkex::ChunkError>(())
/// ```
pub struct BufferPool {
    capacity: usize,
    max_idle: usize,
    idle: Mutex<Vec<Box<[u8]>>>,
    in_use: AtomicUsize,
}

impl BufferPool {
    /// Creates a new, empty pool.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            capacity: config.buffer_capacity(),
            max_idle: config.max_idle(),
            idle: Mutex::new(Vec::new()),
            in_use: AtomicUsize::new(0),
        }
    }

    /// Returns the process-wide pool, created on first use with
    /// [`PoolConfig::default`].
    pub fn global() -> &'static BufferPool {
        &GLOBAL_POOL
    }

    /// Takes a buffer from the pool or allocates a new one.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let reused = self.idle.lock().pop();
        let data = reused.unwrap_or_else(|| vec![0u8; self.capacity].into_boxed_slice());

        let in_use = self.in_use.fetch_add(1, Ordering::AcqRel) + 1;
        if in_use > self.max_idle {
            debug!(
                in_use,
                max_idle = self.max_idle,
                "buffer pool exhausted, allocating overflow buffer"
            );
        }

        PooledBuffer {
            pool: self,
            data: Some(data),
        }
    }

    /// Runs `scope` with exclusive access to one pooled buffer.
    ///
    /// The buffer is returned to the pool when `scope` finishes, including
    /// on early return through `?` inside the closure and on unwinding.
    pub fn with_buffer<R>(&self, scope: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut buffer = self.acquire();
        scope(&mut buffer)
    }

    /// Fails fast if `requested` bytes do not fit in one pooled buffer.
    ///
    /// # Example
    ///
    /// ```
    /// use chunkex::{BufferPool, ChunkError, PoolConfig};
    ///
    /// let pool = BufferPool::new(PoolConfig::new(512, 1)?);
    /// assert!(pool.check_capacity(512).is_ok());
    /// assert!(matches!(
    ///     pool.check_capacity(513),
    ///     Err(ChunkError::CapacityExceeded { requested: 513, capacity: 512 })
    /// ));
    /// # Ok::<(), chunkex::ChunkError>(())
    /// ```
    pub fn check_capacity(&self, requested: usize) -> Result<(), ChunkError> {
        if requested > self.capacity {
            return Err(ChunkError::CapacityExceeded {
                requested,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Returns the fixed capacity of every buffer in this pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of buffers currently handed out.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Returns the number of buffers waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, data: Box<[u8]>) {
        {
            let mut idle = self.idle.lock();
            if idle.len() < self.max_idle {
                idle.push(data);
            }
        }
        self.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.capacity)
            .field("max_idle", &self.max_idle)
            .field("in_use", &self.in_use())
            .field("idle", &self.idle())
            .finish()
    }
}

/// A buffer borrowed from a [`BufferPool`].
///
/// Dereferences to a `[u8]` of exactly the pool's capacity. Contents are
/// whatever the previous holder left behind; callers track their own valid
/// length.
pub struct PooledBuffer<'p> {
    pool: &'p BufferPool,
    data: Option<Box<[u8]>>,
}

impl PooledBuffer<'_> {
    /// Returns the capacity of this buffer.
    pub fn capacity(&self) -> usize {
        self.pool.capacity
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.data.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            self.pool.release(data);
        }
    }
}

impl fmt::Debug for PooledBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn small_pool(max_idle: usize) -> BufferPool {
        BufferPool::new(PoolConfig::new(64, max_idle).unwrap())
    }

    #[test]
    fn test_buffer_take() {
        let pool = small_pool(2);
        let buf = pool.acquire();
        assert_eq!(buf.len(), 64);
        assert_eq!(buf.capacity(), 64);
        assert_eq!(pool.in_use(), 1);
    }

    #[test]
    fn test_buffer_reuse() {
        let pool = small_pool(2);
        let first_ptr = {
            let mut buf = pool.acquire();
            buf[..9].copy_from_slice(b"test data");
            buf.as_ptr()
        };

        // The buffer should be returned to the pool
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.idle(), 1);

        let buf2 = pool.acquire();
        assert_eq!(buf2.as_ptr(), first_ptr);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_with_buffer_releases_on_error_path() {
        let pool = small_pool(2);
        let result: Result<(), &str> = pool.with_buffer(|buf| {
            buf[0] = 1;
            Err("early exit")
        });
        assert!(result.is_err());
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_with_buffer_releases_on_panic() {
        let pool = small_pool(2);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pool.with_buffer(|_| panic!("scope failed"))
        }));
        assert!(outcome.is_err());
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_overflow_is_freed_not_retained() {
        let pool = small_pool(1);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
            let _c = pool.acquire();
            assert_eq!(pool.in_use(), 3);
        }
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_check_capacity() {
        let pool = small_pool(1);
        assert!(pool.check_capacity(0).is_ok());
        assert!(pool.check_capacity(64).is_ok());
        assert!(matches!(
            pool.check_capacity(65),
            Err(ChunkError::CapacityExceeded {
                requested: 65,
                capacity: 64
            })
        ));
    }

    #[test]
    fn test_concurrent_acquisitions_are_exclusive() {
        let pool = Arc::new(small_pool(4));
        let handles: Vec<_> = (0..8u8)
            .map(|id| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        pool.with_buffer(|buf| {
                            buf.fill(id);
                            std::thread::yield_now();
                            assert!(buf.iter().all(|&b| b == id));
                        });
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pool.in_use(), 0);
        assert!(pool.idle() <= 4);
    }

    #[test]
    fn test_global_pool_defaults() {
        let pool = BufferPool::global();
        assert_eq!(pool.capacity(), crate::config::DEFAULT_BUFFER_CAPACITY);
        assert!(std::ptr::eq(pool, BufferPool::global()));
    }
}
