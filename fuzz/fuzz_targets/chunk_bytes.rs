#![no_main]

use libfuzzer_sys::fuzz_target;
use chunkex::{BufferPool, Chunker, PoolConfig};

fuzz_target!(|data: Vec<u8>| {
    let pool = BufferPool::new(PoolConfig::new(4096, 2).unwrap());

    // First two bytes pick the chunk size, the rest is the payload
    let (size, payload) = match data.split_first_chunk::<2>() {
        Some((head, rest)) => (usize::from(u16::from_le_bytes(*head)) % 4096 + 1, rest),
        None => (1, &data[..]),
    };

    for size in [1, 7, 64, size, 4096] {
        let chunker = Chunker::with_pool(&pool, size).unwrap();
        let mut iter = chunker.chunk_buf(payload);
        let mut rebuilt = Vec::with_capacity(payload.len());
        let mut count = 0;

        while let Some(chunk) = iter.next_chunk() {
            let chunk = chunk.unwrap();

            // Verify: bounded, non-empty, contiguous
            assert!(!chunk.is_empty());
            assert!(chunk.len() <= size);
            assert_eq!(chunk.offset(), rebuilt.len() as u64);
            rebuilt.extend_from_slice(&chunk);
            count += 1;
        }

        // Verify: reconstruction and chunk count
        assert_eq!(rebuilt, payload);
        assert_eq!(count, payload.len().div_ceil(size));
        assert_eq!(pool.in_use(), 0);
    }

    // Oversized chunk sizes are rejected up front
    assert!(Chunker::with_pool(&pool, 4097).is_err());
});
