//! ECDH key exchange producing 16-byte share keys.
//!
//! - [`KeyExchange`] - Provider probing, key pair generation and share-key derivation
//! - [`Ecdh`] - One session: an exchange bound to the key pair it holds
//! - [`EcdhKeyPair`] - Either a real [`KeyPair`] or the explicit stub
//! - [`CurveProvider`] - Elliptic-curve backend; [`P256Provider`] ships built in
//! - [`ShareKey`] - The agreed 128-bit key
//!
//! When the provider cannot be used, the exchange does not fail. It hands
//! out [`EcdhKeyPair::Stub`] and reports `false` from
//! [`KeyExchange::is_available`], so callers can pick a fallback path.

mod exchange;
mod provider;
mod share_key;

pub use exchange::{Ecdh, EcdhKeyPair, KeyExchange, KeyPair};
pub use provider::{CurveProvider, P256_INITIAL_PUBLIC_KEY, P256Provider, PrivateKey, PublicKey};
pub use share_key::ShareKey;
