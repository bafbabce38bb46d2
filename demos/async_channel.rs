//! Chunk a stream of incoming frames as they arrive.
//!
//! Run with:
//!     cargo run --example async_channel

use std::io;
use std::time::Duration;

use bytes::Bytes;
use chunkex::{ByteStreamSource, ChunkError, chunk_async};
use futures_core::Stream;
use futures_util::StreamExt;

/// Simulated network frames, delayed and irregularly sized.
fn frames() -> impl Stream<Item = io::Result<Bytes>> + Unpin {
    let payloads = [
        "GET /chunks HTTP/1.1\r\n",
        "Host: example.org\r\n",
        "\r\n",
        "frames arrive in irregular sizes",
    ];
    futures_util::stream::iter(payloads)
        .then(|payload| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Bytes::from_static(payload.as_bytes()))
        })
        .boxed()
}

#[tokio::main]
async fn main() -> Result<(), ChunkError> {
    let mut chunks = chunk_async(ByteStreamSource::new(frames()), 16)?;

    while let Some(chunk) = chunks.next_chunk().await {
        let chunk = chunk?;
        println!("{chunk}: {:?}", String::from_utf8_lossy(&chunk));
    }
    Ok(())
}
