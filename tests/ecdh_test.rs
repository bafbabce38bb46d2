// Integration tests for the ECDH share-key exchange
// Tests cover: symmetry, determinism, known answers, encodings, stub degradation

#![cfg(feature = "ecdh")]

use chunkex::{
    CurveProvider, Ecdh, EcdhKeyPair, KeyExchange, KeyExchangeError, P256_INITIAL_PUBLIC_KEY,
    PrivateKey, PublicKey, ShareKey,
};

const A_PRIVATE: &str = "1111111111111111111111111111111111111111111111111111111111111111";
const B_PRIVATE: &str = "2222222222222222222222222222222222222222222222222222222222222222";
const B_PUBLIC: &str = "04d65a93977caa3d1b081852ff57a79e465f1660577304baead505dd3a48589cf350185e895372df6221ea3a137557e473fddb6755f05bd507c3c533fce9c91285";
const A_B_SHARED: &str = "ccfc261f58193c98ca4ad4a53bbac6f0ee29bc4d48438090446908622ca79af6";

fn private(hex_str: &str) -> PrivateKey {
    PrivateKey::from_slice(&hex::decode(hex_str).unwrap())
}

fn expected_share_key(raw_hex: &str) -> ShareKey {
    let hash = blake3::hash(&hex::decode(raw_hex).unwrap());
    ShareKey::from_slice(&hash.as_bytes()[..ShareKey::SIZE]).unwrap()
}

// ============================================================================
// Agreement
// ============================================================================

#[test]
fn test_share_keys_are_symmetric() {
    let exchange = KeyExchange::new();
    assert!(exchange.is_available());

    for _ in 0..8 {
        let a = exchange.generate_key_pair().into_real().unwrap();
        let b = exchange.generate_key_pair().into_real().unwrap();

        let k_ab = exchange
            .calculate_share_key(a.private_key(), b.public_key())
            .unwrap();
        let k_ba = exchange
            .calculate_share_key(b.private_key(), a.public_key())
            .unwrap();
        assert_eq!(k_ab, k_ba);
        assert_eq!(k_ab.as_bytes().len(), 16);
    }
}

#[test]
fn test_share_key_is_deterministic() {
    let exchange = KeyExchange::new();
    let a = exchange.generate_key_pair().into_real().unwrap();
    let b = exchange.generate_key_pair().into_real().unwrap();

    let first = exchange
        .calculate_share_key(a.private_key(), b.public_key())
        .unwrap();
    let second = exchange
        .calculate_share_key(a.private_key(), b.public_key())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_known_answer_share_key() {
    let exchange = KeyExchange::new();
    let a = exchange.import_key_pair(private(A_PRIVATE)).unwrap();
    let b = exchange.import_key_pair(private(B_PRIVATE)).unwrap();
    assert_eq!(b.public_key().to_hex(), B_PUBLIC);

    let key = exchange
        .calculate_share_key(a.private_key(), b.public_key())
        .unwrap();
    assert_eq!(key, expected_share_key(A_B_SHARED));
}

#[test]
fn test_imported_pair_initial_share_key() {
    let exchange = KeyExchange::new();
    let pair = exchange.import_key_pair(private(A_PRIVATE)).unwrap();

    let initial = exchange.initial_public_key().unwrap();
    assert_eq!(initial.as_bytes(), &P256_INITIAL_PUBLIC_KEY[..]);
    assert_eq!(
        pair.initial_share_key(),
        exchange
            .calculate_share_key(pair.private_key(), &initial)
            .unwrap()
    );
}

#[test]
fn test_distinct_pairs_have_distinct_initial_keys() {
    let exchange = KeyExchange::new();
    let a = exchange.generate_key_pair();
    let b = exchange.generate_key_pair();
    assert_ne!(a.public_key(), b.public_key());
    assert_ne!(a.initial_share_key(), b.initial_share_key());
}

// ============================================================================
// Public Key Encodings
// ============================================================================

#[test]
fn test_peer_key_round_trips_through_bytes() {
    let exchange = KeyExchange::new();
    let a = exchange.generate_key_pair().into_real().unwrap();
    let b = exchange.generate_key_pair().into_real().unwrap();

    let received = exchange
        .construct_public_key(b.public_key().as_bytes())
        .unwrap();
    assert_eq!(&received, b.public_key());
    assert_eq!(
        exchange.calculate_share_key(a.private_key(), &received),
        exchange.calculate_share_key(a.private_key(), b.public_key())
    );
}

#[test]
fn test_construct_public_key_rejects_garbage() {
    let exchange = KeyExchange::new();
    let cases: [&[u8]; 5] = [b"", b"not a key", &[0x04; 65], &[0x05; 33], &[0x03; 65]];
    for bad in cases {
        assert!(matches!(
            exchange.construct_public_key(bad),
            Err(KeyExchangeError::KeyParse(_))
        ));
    }
}

#[test]
fn test_import_rejects_invalid_scalar() {
    let exchange = KeyExchange::new();
    let err = exchange
        .import_key_pair(PrivateKey::from_slice(&[0u8; 32]))
        .unwrap_err();
    assert!(matches!(err, KeyExchangeError::KeyParse(_)));
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn test_sessions_agree() {
    let server = Ecdh::default();
    let client = Ecdh::new(KeyExchange::new());
    assert!(!server.key_pair().is_stub());

    let k1 = server
        .calculate_share_key_by_peer_public_key(client.public_key().unwrap())
        .unwrap();
    let k2 = client
        .calculate_share_key_by_peer_public_key(server.public_key().unwrap())
        .unwrap();
    assert_eq!(k1, k2);
}

#[test]
fn test_session_from_imported_pair() {
    let exchange = KeyExchange::new();
    let pair = exchange.import_key_pair(private(A_PRIVATE)).unwrap();
    let session = Ecdh::from_key_pair(exchange.clone(), pair);

    let peer = exchange.construct_public_key(&hex::decode(B_PUBLIC).unwrap()).unwrap();
    assert_eq!(
        session.calculate_share_key_by_peer_public_key(&peer).unwrap(),
        expected_share_key(A_B_SHARED)
    );
}

// ============================================================================
// Degradation
// ============================================================================

/// Provider standing in for a platform without elliptic-curve support.
struct UnsupportedPlatform;

impl CurveProvider for UnsupportedPlatform {
    const INITIAL_PUBLIC_KEY: &'static [u8] = &P256_INITIAL_PUBLIC_KEY;

    fn generate_key_pair(&self) -> Result<(PrivateKey, PublicKey), KeyExchangeError> {
        Err(KeyExchangeError::Generation("EC not supported".into()))
    }

    fn derive_public_key(&self, _: &PrivateKey) -> Result<PublicKey, KeyExchangeError> {
        Err(KeyExchangeError::Generation("EC not supported".into()))
    }

    fn parse_public_key(&self, encoded: &[u8]) -> Result<PublicKey, KeyExchangeError> {
        Ok(PublicKey::from_encoded(encoded.to_vec()))
    }

    fn diffie_hellman(&self, _: &PrivateKey, _: &PublicKey) -> Result<Vec<u8>, KeyExchangeError> {
        Err(KeyExchangeError::Agreement("EC not supported".into()))
    }
}

#[test]
fn test_unavailable_provider_yields_stub_pairs() {
    let exchange = KeyExchange::with_provider(UnsupportedPlatform);

    assert!(!exchange.is_available());
    for _ in 0..3 {
        assert_eq!(exchange.generate_key_pair(), EcdhKeyPair::Stub);
    }
    assert!(!exchange.is_available());

    let session = Ecdh::new(exchange);
    assert!(session.key_pair().is_stub());
    let peer = PublicKey::from_encoded(P256_INITIAL_PUBLIC_KEY.to_vec());
    assert_eq!(
        session.calculate_share_key_by_peer_public_key(&peer),
        Err(KeyExchangeError::ProviderUnavailable)
    );
}

#[test]
fn test_custom_provider_does_not_affect_default() {
    let broken = KeyExchange::with_provider(UnsupportedPlatform);
    assert!(!broken.is_available());
    assert!(KeyExchange::new().is_available());
}
