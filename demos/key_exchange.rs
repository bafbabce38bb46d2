//! Two parties agree on a share key over P-256.
//!
//! Run with:
//!     cargo run --example key_exchange

use chunkex::{Ecdh, KeyExchange, KeyExchangeError};

fn main() -> Result<(), KeyExchangeError> {
    let exchange = KeyExchange::new();
    if !exchange.is_available() {
        println!("no curve provider, falling back to plaintext bootstrap");
        return Ok(());
    }

    let server = Ecdh::new(exchange.clone());
    let client = Ecdh::new(exchange.clone());

    let (Some(server_public), Some(client_public)) = (server.public_key(), client.public_key())
    else {
        return Err(KeyExchangeError::ProviderUnavailable);
    };
    println!("server public key: {}", server_public.to_hex());
    println!("client public key: {}", client_public.to_hex());

    // Keys cross the wire as bytes
    let received = exchange.construct_public_key(client_public.as_bytes())?;
    let server_key = server.calculate_share_key_by_peer_public_key(&received)?;
    let client_key = client.calculate_share_key_by_peer_public_key(server_public)?;

    assert_eq!(server_key, client_key);
    println!("share key: {}", server_key.to_hex());

    if let Some(initial) = client.initial_share_key() {
        println!("client initial share key: {}", initial.to_hex());
    }
    Ok(())
}
