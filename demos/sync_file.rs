//! Chunk a file from disk with the global pool.
//!
//! Run with:
//!     cargo run --example sync_file -- <path> [chunk_size]

use std::env;
use std::fs::File;
use std::process::ExitCode;

use chunkex::{BufferPool, ChunkError, chunked};

fn run(path: &str, chunk_size: usize) -> Result<(), ChunkError> {
    let file = File::open(path)?;
    let mut chunks = chunked(file, chunk_size)?;

    while let Some(chunk) = chunks.next_chunk() {
        let chunk = chunk?;
        println!("{chunk}");
    }

    println!(
        "{} bytes total, pool: {} idle / {} in use",
        chunks.bytes_emitted(),
        BufferPool::global().idle(),
        BufferPool::global().in_use()
    );
    Ok(())
}

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: sync_file <path> [chunk_size]");
        return ExitCode::FAILURE;
    };
    let chunk_size = args.next().and_then(|s| s.parse().ok()).unwrap_or(8192);

    match run(&path, chunk_size) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
