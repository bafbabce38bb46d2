//! Curve provider capability and key handles.
//!
//! A [`CurveProvider`] is the elliptic-curve backend: it generates key
//! pairs, parses encoded public keys and performs the raw ECDH scalar
//! multiplication. Keys travel between the provider and the exchange as
//! opaque byte-bearing handles, [`PrivateKey`] and [`PublicKey`].
//!
//! [`P256Provider`] implements the capability for the NIST P-256 named
//! curve on top of the `p256` crate.

use std::fmt;

use bytes::Bytes;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::DecodePublicKey;
use rand_core::OsRng;

use crate::error::KeyExchangeError;

/// First byte of a DER `SEQUENCE`, which every SubjectPublicKeyInfo starts with.
const DER_SEQUENCE_TAG: u8 = 0x30;

/// Pinned bootstrap peer key for P-256, uncompressed SEC1.
///
/// Used to derive a key pair's initial share key before any real peer key
/// is known.
pub const P256_INITIAL_PUBLIC_KEY: [u8; 65] = [
    0x04, 0x48, 0xb6, 0x1d, 0x0f, 0xb9, 0x60, 0x9a, 0x48, 0x77, 0xde, 0x84,
    0xfd, 0x77, 0x97, 0x22, 0xbd, 0x72, 0x54, 0x3d, 0xe7, 0xaf, 0x8d, 0x52,
    0x2b, 0x6a, 0x46, 0x05, 0x33, 0xd5, 0xbe, 0x84, 0xb9, 0xb2, 0x71, 0x83,
    0x50, 0x47, 0xe4, 0xcf, 0x1a, 0x7d, 0x13, 0xb1, 0x18, 0xc9, 0x8c, 0x3c,
    0x10, 0x5d, 0xa3, 0x55, 0x7f, 0xd1, 0xfe, 0xe6, 0x56, 0x6b, 0x12, 0xd8,
    0xf3, 0xde, 0x19, 0xfb, 0xda,
];

/// Elliptic-curve backend used by a [`KeyExchange`](crate::KeyExchange).
///
/// Implementations must be usable from several threads at once. Every
/// method may fail; failures while probing a provider turn it into an
/// unavailable one rather than an error for callers.
pub trait CurveProvider: Send + Sync {
    /// Encoded public key of the pinned bootstrap peer.
    const INITIAL_PUBLIC_KEY: &'static [u8];

    /// Generates a fresh random key pair.
    fn generate_key_pair(&self) -> Result<(PrivateKey, PublicKey), KeyExchangeError>;

    /// Computes the public half of `private`.
    fn derive_public_key(&self, private: &PrivateKey) -> Result<PublicKey, KeyExchangeError>;

    /// Parses an encoded public key.
    fn parse_public_key(&self, encoded: &[u8]) -> Result<PublicKey, KeyExchangeError>;

    /// Performs the raw ECDH derivation and returns the shared secret bytes.
    fn diffie_hellman(
        &self,
        private: &PrivateKey,
        public: &PublicKey,
    ) -> Result<Vec<u8>, KeyExchangeError>;
}

/// Private key material in the provider's native encoding.
///
/// `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(Box<[u8]>);

impl PrivateKey {
    /// Wraps raw private key bytes. Validity is checked by the provider on use.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// An encoded public key accepted by its provider.
///
/// Obtain one from [`KeyExchange::construct_public_key`] or a generated
/// key pair; providers normalise the encoding, so two handles for the same
/// point compare equal.
///
/// [`KeyExchange::construct_public_key`]: crate::KeyExchange::construct_public_key
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey(Bytes);

impl PublicKey {
    /// Wraps an encoding produced by a provider, without validating it.
    pub fn from_encoded(encoded: impl Into<Bytes>) -> Self {
        Self(encoded.into())
    }

    /// Returns the encoded key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the encoded key as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

/// ECDH on the NIST P-256 curve.
///
/// Public keys are normalised to uncompressed SEC1. Parsing accepts SEC1
/// (compressed or uncompressed) and X.509 SubjectPublicKeyInfo DER.
/// Private keys are 32-byte big-endian scalars.
#[derive(Debug, Clone, Copy, Default)]
pub struct P256Provider;

impl CurveProvider for P256Provider {
    const INITIAL_PUBLIC_KEY: &'static [u8] = &P256_INITIAL_PUBLIC_KEY;

    fn generate_key_pair(&self) -> Result<(PrivateKey, PublicKey), KeyExchangeError> {
        let secret = p256::SecretKey::random(&mut OsRng);
        let public = encode_public(&secret.public_key());
        Ok((PrivateKey::from_slice(&secret.to_bytes()), public))
    }

    fn derive_public_key(&self, private: &PrivateKey) -> Result<PublicKey, KeyExchangeError> {
        Ok(encode_public(&decode_secret(private)?.public_key()))
    }

    fn parse_public_key(&self, encoded: &[u8]) -> Result<PublicKey, KeyExchangeError> {
        let key = if encoded.first() == Some(&DER_SEQUENCE_TAG) {
            p256::PublicKey::from_public_key_der(encoded)
                .map_err(|e| KeyExchangeError::KeyParse(format!("invalid P-256 SPKI: {e}")))?
        } else {
            decode_public(encoded)?
        };
        Ok(encode_public(&key))
    }

    fn diffie_hellman(
        &self,
        private: &PrivateKey,
        public: &PublicKey,
    ) -> Result<Vec<u8>, KeyExchangeError> {
        let secret = decode_secret(private)?;
        let public = decode_public(public.as_bytes())?;
        let shared = p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
        Ok(shared.raw_secret_bytes().to_vec())
    }
}

fn decode_secret(private: &PrivateKey) -> Result<p256::SecretKey, KeyExchangeError> {
    p256::SecretKey::from_slice(private.as_bytes())
        .map_err(|e| KeyExchangeError::KeyParse(format!("invalid P-256 private key: {e}")))
}

/// Only the standard SEC1 tags are accepted: `0x02`/`0x03` compressed
/// (33 bytes) and `0x04` uncompressed (65 bytes).
fn decode_public(encoded: &[u8]) -> Result<p256::PublicKey, KeyExchangeError> {
    match (encoded.first(), encoded.len()) {
        (Some(0x02 | 0x03), 33) | (Some(0x04), 65) => {}
        (Some(tag), len) => {
            return Err(KeyExchangeError::KeyParse(format!(
                "unsupported P-256 SEC1 encoding: tag {tag:#04x}, {len} bytes"
            )));
        }
        (None, _) => {
            return Err(KeyExchangeError::KeyParse("empty P-256 public key".into()));
        }
    }

    p256::PublicKey::from_sec1_bytes(encoded)
        .map_err(|e| KeyExchangeError::KeyParse(format!("invalid P-256 SEC1 point: {e}")))
}

fn encode_public(key: &p256::PublicKey) -> PublicKey {
    PublicKey::from_encoded(Bytes::copy_from_slice(key.to_encoded_point(false).as_bytes()))
}
