//! Key exchange: availability probing, key pairs and share-key derivation.

use std::any::type_name;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, LazyLock, OnceLock};

use tracing::{debug, warn};

use super::provider::{CurveProvider, P256Provider, PrivateKey, PublicKey};
use super::share_key::ShareKey;
use crate::error::KeyExchangeError;
use crate::hash::Blake3Hasher;

/// Probe result shared by every exchange on the built-in P-256 provider.
static P256_AVAILABILITY: LazyLock<Arc<OnceLock<bool>>> = LazyLock::new(Default::default);

/// A real key pair: private key, public key and the initial share key
/// derived against the provider's pinned bootstrap peer.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
    initial_share_key: ShareKey,
}

impl KeyPair {
    /// Returns the private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Returns the public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns the share key agreed with the pinned initial public key.
    pub fn initial_share_key(&self) -> ShareKey {
        self.initial_share_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Outcome of key pair generation.
///
/// `Stub` is the fixed placeholder handed out when no usable provider
/// exists. It carries no key material, so nothing cryptographic can be
/// done with it by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcdhKeyPair {
    /// A key pair produced by a working provider.
    Real(KeyPair),
    /// Key agreement is unavailable in this process.
    Stub,
}

impl EcdhKeyPair {
    /// Returns true for the stub placeholder.
    pub fn is_stub(&self) -> bool {
        matches!(self, Self::Stub)
    }

    /// Returns the real key pair, if any.
    pub fn as_real(&self) -> Option<&KeyPair> {
        match self {
            Self::Real(pair) => Some(pair),
            Self::Stub => None,
        }
    }

    /// Consumes `self` and returns the real key pair, if any.
    pub fn into_real(self) -> Option<KeyPair> {
        match self {
            Self::Real(pair) => Some(pair),
            Self::Stub => None,
        }
    }

    /// Returns the public key of a real pair.
    pub fn public_key(&self) -> Option<&PublicKey> {
        self.as_real().map(KeyPair::public_key)
    }

    /// Returns the initial share key of a real pair.
    pub fn initial_share_key(&self) -> Option<ShareKey> {
        self.as_real().map(KeyPair::initial_share_key)
    }
}

impl From<KeyPair> for EcdhKeyPair {
    fn from(pair: KeyPair) -> Self {
        Self::Real(pair)
    }
}

/// ECDH key agreement over a [`CurveProvider`].
///
/// Whether the provider works is probed once: parse the pinned initial
/// public key, generate a throwaway pair and run one derivation. Any error
/// or panic marks the provider unavailable for good (a panic still reaches
/// the process panic hook before it is caught), and from then on
/// [`generate_key_pair`](KeyExchange::generate_key_pair) returns
/// [`EcdhKeyPair::Stub`]. The probe result is shared by every clone; the
/// built-in P-256 exchange shares one result across the whole process.
///
/// # Example
///
/// ```
/// use chunkex::KeyExchange;
///
/// let exchange = KeyExchange::new();
/// assert!(exchange.is_available());
///
/// let alice = exchange.generate_key_pair().into_real().unwrap();
/// let bob = exchange.generate_key_pair().into_real().unwrap();
///
/// let bob_public = exchange.construct_public_key(bob.public_key().as_bytes())?;
/// let k1 = exchange.calculate_share_key(alice.private_key(), &bob_public)?;
/// let k2 = exchange.calculate_share_key(bob.private_key(), alice.public_key())?;
/// assert_eq!(k1, k2);
/// # Ok::<(), chunkex::KeyExchangeError>(())
/// ```
pub struct KeyExchange<P = P256Provider> {
    provider: Arc<P>,
    availability: Arc<OnceLock<bool>>,
}

impl KeyExchange<P256Provider> {
    /// Creates an exchange on the built-in P-256 provider.
    pub fn new() -> Self {
        Self {
            provider: Arc::new(P256Provider),
            availability: Arc::clone(&P256_AVAILABILITY),
        }
    }
}

impl Default for KeyExchange<P256Provider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: CurveProvider> KeyExchange<P> {
    /// Creates an exchange on a custom provider, with its own probe result.
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
            availability: Arc::new(OnceLock::new()),
        }
    }

    /// Returns the provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns whether real key agreement is possible, probing on first call.
    pub fn is_available(&self) -> bool {
        *self.availability.get_or_init(|| probe(&*self.provider))
    }

    /// Generates a key pair, or the stub when the provider is unavailable.
    ///
    /// Never fails: a provider that breaks after a successful probe also
    /// yields the stub, with a warning logged.
    pub fn generate_key_pair(&self) -> EcdhKeyPair {
        if !self.is_available() {
            return EcdhKeyPair::Stub;
        }

        let generated = self
            .provider
            .generate_key_pair()
            .and_then(|(private, public)| self.assemble(private, public));
        match generated {
            Ok(pair) => EcdhKeyPair::Real(pair),
            Err(e) => {
                warn!(
                    provider = type_name::<P>(),
                    error = %e,
                    "key pair generation failed, falling back to stub key pair"
                );
                EcdhKeyPair::Stub
            }
        }
    }

    /// Builds a key pair around caller-supplied private key bytes.
    ///
    /// # Errors
    ///
    /// [`KeyExchangeError::KeyParse`] if the provider rejects the key.
    pub fn import_key_pair(&self, private_key: PrivateKey) -> Result<KeyPair, KeyExchangeError> {
        let public_key = self.provider.derive_public_key(&private_key)?;
        self.assemble(private_key, public_key)
    }

    /// Derives the share key for `private_key` and `peer_public_key`.
    ///
    /// Runs the raw ECDH derivation and condenses the result into 16 bytes
    /// with BLAKE3. Pure: identical inputs always give identical output.
    pub fn calculate_share_key(
        &self,
        private_key: &PrivateKey,
        peer_public_key: &PublicKey,
    ) -> Result<ShareKey, KeyExchangeError> {
        let raw = self.provider.diffie_hellman(private_key, peer_public_key)?;
        Ok(Blake3Hasher::hash(&raw))
    }

    /// Parses an encoded public key.
    ///
    /// # Errors
    ///
    /// [`KeyExchangeError::KeyParse`] for malformed bytes or a key on
    /// another curve.
    pub fn construct_public_key(&self, encoded: &[u8]) -> Result<PublicKey, KeyExchangeError> {
        self.provider.parse_public_key(encoded)
    }

    /// Returns the pinned bootstrap peer key.
    pub fn initial_public_key(&self) -> Result<PublicKey, KeyExchangeError> {
        self.provider.parse_public_key(P::INITIAL_PUBLIC_KEY)
    }

    fn assemble(
        &self,
        private_key: PrivateKey,
        public_key: PublicKey,
    ) -> Result<KeyPair, KeyExchangeError> {
        let initial = self.initial_public_key()?;
        let initial_share_key = self.calculate_share_key(&private_key, &initial)?;
        Ok(KeyPair {
            private_key,
            public_key,
            initial_share_key,
        })
    }
}

impl<P> Clone for KeyExchange<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            availability: Arc::clone(&self.availability),
        }
    }
}

impl<P> fmt::Debug for KeyExchange<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyExchange")
            .field("provider", &type_name::<P>())
            .field("available", &self.availability.get())
            .finish()
    }
}

/// Runs the availability check once for `provider`.
///
/// A panicking provider is caught and logged, but the panic still passes
/// through the process-wide panic hook first, so the default hook prints
/// its message to stderr. Applications that want silence install their own
/// hook; the library leaves the hook alone.
fn probe<P: CurveProvider>(provider: &P) -> bool {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), KeyExchangeError> {
        let initial = provider.parse_public_key(P::INITIAL_PUBLIC_KEY)?;
        let (private, _public) = provider.generate_key_pair()?;
        provider.diffie_hellman(&private, &initial)?;
        Ok(())
    }));

    match outcome {
        Ok(Ok(())) => {
            debug!(provider = type_name::<P>(), "curve provider available");
            true
        }
        Ok(Err(e)) => {
            warn!(
                provider = type_name::<P>(),
                error = %e,
                "curve provider unavailable, key exchange degraded to stub key pairs"
            );
            false
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("non-string panic payload");
            warn!(
                provider = type_name::<P>(),
                panic = message,
                "curve provider panicked, key exchange degraded to stub key pairs"
            );
            false
        }
    }
}

/// One key exchange session: an exchange plus the key pair it holds.
///
/// # Example
///
/// ```
/// use chunkex::{Ecdh, KeyExchange};
///
/// let server = Ecdh::new(KeyExchange::new());
/// let client = Ecdh::new(KeyExchange::new());
///
/// let k1 = server.calculate_share_key_by_peer_public_key(client.public_key().unwrap())?;
/// let k2 = client.calculate_share_key_by_peer_public_key(server.public_key().unwrap())?;
/// assert_eq!(k1, k2);
/// # Ok::<(), chunkex::KeyExchangeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Ecdh<P = P256Provider> {
    exchange: KeyExchange<P>,
    key_pair: EcdhKeyPair,
}

impl<P: CurveProvider> Ecdh<P> {
    /// Starts a session with a freshly generated key pair (or the stub).
    pub fn new(exchange: KeyExchange<P>) -> Self {
        let key_pair = exchange.generate_key_pair();
        Self { exchange, key_pair }
    }

    /// Starts a session around an existing key pair.
    pub fn from_key_pair(exchange: KeyExchange<P>, key_pair: impl Into<EcdhKeyPair>) -> Self {
        Self {
            exchange,
            key_pair: key_pair.into(),
        }
    }

    /// Returns the session's key pair.
    pub fn key_pair(&self) -> &EcdhKeyPair {
        &self.key_pair
    }

    /// Returns the session's exchange.
    pub fn exchange(&self) -> &KeyExchange<P> {
        &self.exchange
    }

    /// Returns the session's public key, unless it holds the stub.
    pub fn public_key(&self) -> Option<&PublicKey> {
        self.key_pair.public_key()
    }

    /// Returns the session's initial share key, unless it holds the stub.
    pub fn initial_share_key(&self) -> Option<ShareKey> {
        self.key_pair.initial_share_key()
    }

    /// Derives the share key between this session's private key and `peer`.
    ///
    /// # Errors
    ///
    /// [`KeyExchangeError::ProviderUnavailable`] when the session holds the
    /// stub key pair; otherwise whatever the provider reports.
    pub fn calculate_share_key_by_peer_public_key(
        &self,
        peer: &PublicKey,
    ) -> Result<ShareKey, KeyExchangeError> {
        match &self.key_pair {
            EcdhKeyPair::Real(pair) => self.exchange.calculate_share_key(pair.private_key(), peer),
            EcdhKeyPair::Stub => Err(KeyExchangeError::ProviderUnavailable),
        }
    }
}

impl Default for Ecdh<P256Provider> {
    fn default() -> Self {
        Self::new(KeyExchange::new())
    }
}
