//! Key material: sale content keys and X25519 recipient keys.
//!
//! Every random byte comes from the operating system RNG through
//! [`fill_random`], so an unavailable entropy source surfaces as
//! [`CryptoError::EntropyUnavailable`] instead of a panic.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use stormsale_core::{Ed25519Signature, Keypair};

use crate::error::{CryptoError, Result};

/// Message a wallet signs to derive its encryption key.
///
/// Ed25519 signatures are deterministic, so the same wallet always derives
/// the same key.
pub const KEY_DERIVATION_MESSAGE: &[u8] = b"StormSale: derive my sale encryption key (v1)";

const SIGNATURE_KDF_CONTEXT: &str = "stormsale v1 signature-derived encryption key";
const WRAP_KDF_CONTEXT: &str = "stormsale v1 key-wrap";

/// Fill `buf` from the operating system's secure random source.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))
}

/// A 256-bit symmetric key for ChaCha20-Poly1305.
///
/// Wiped from memory on drop. Deliberately not `Clone`: a sale's content key
/// should exist in exactly one place for as long as it is needed.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Length in bytes.
    pub const LEN: usize = 32;

    /// Generate a fresh random key.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; Self::LEN];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// A recipient's X25519 public encryption key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptionPublicKey(pub [u8; 32]);

impl EncryptionPublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPublicKey)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(arr))
    }

    fn to_dalek(self) -> PublicKey {
        PublicKey::from(self.0)
    }
}

impl fmt::Debug for EncryptionPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519Pub({})", &self.to_hex()[..16])
    }
}

impl From<PublicKey> for EncryptionPublicKey {
    fn from(pk: PublicKey) -> Self {
        Self(*pk.as_bytes())
    }
}

/// A recipient's X25519 private key. Never leaves its holder.
pub struct EncryptionSecretKey(StaticSecret);

impl EncryptionSecretKey {
    /// Generate a new random secret.
    pub fn generate() -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        fill_random(bytes.as_mut())?;
        Ok(Self(StaticSecret::from(*bytes)))
    }

    /// Create from secret bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Derive the key from a wallet's signature over [`KEY_DERIVATION_MESSAGE`].
    pub fn derive_from_signature(signature: &Ed25519Signature) -> Self {
        let seed = Zeroizing::new(blake3::derive_key(
            SIGNATURE_KDF_CONTEXT,
            signature.as_bytes(),
        ));
        Self(StaticSecret::from(*seed))
    }

    /// Sign the derivation message with `wallet` and derive the key.
    pub fn derive_for_wallet(wallet: &Keypair) -> Self {
        Self::derive_from_signature(&wallet.sign(KEY_DERIVATION_MESSAGE))
    }

    /// Derive the public key.
    pub fn public_key(&self) -> EncryptionPublicKey {
        EncryptionPublicKey::from(PublicKey::from(&self.0))
    }

    /// Perform key agreement with a peer's public key.
    ///
    /// Returns `None` when the agreement is non-contributory (the peer key is
    /// a low-order point), in which case the shared secret is predictable.
    pub fn diffie_hellman(&self, peer_public: &EncryptionPublicKey) -> Option<SharedKey> {
        let shared = self.0.diffie_hellman(&peer_public.to_dalek());
        shared
            .was_contributory()
            .then(|| SharedKey(*shared.as_bytes()))
    }
}

impl fmt::Debug for EncryptionSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionSecretKey({:?})", self.public_key())
    }
}

/// A shared secret derived from X25519 key agreement.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; 32]);

impl SharedKey {
    /// Derive the key-wrapping key bound to both public keys of the exchange.
    pub fn derive_wrapping_key(
        &self,
        ephemeral_public: &EncryptionPublicKey,
        recipient_public: &EncryptionPublicKey,
    ) -> SymmetricKey {
        let mut hasher = blake3::Hasher::new_derive_key(WRAP_KDF_CONTEXT);
        hasher.update(&self.0);
        hasher.update(ephemeral_public.as_bytes());
        hasher.update(recipient_public.as_bytes());
        SymmetricKey(*hasher.finalize().as_bytes())
    }
}

/// One-time key pair generated per wrap operation.
pub struct EphemeralKeyPair {
    secret: EncryptionSecretKey,
    public: EncryptionPublicKey,
}

impl EphemeralKeyPair {
    /// Generate a new ephemeral key pair.
    pub fn generate() -> Result<Self> {
        let secret = EncryptionSecretKey::generate()?;
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    /// Get the public key.
    pub fn public_key(&self) -> EncryptionPublicKey {
        self.public
    }

    /// Perform key agreement; consumes the ephemeral secret.
    pub fn diffie_hellman(self, peer_public: &EncryptionPublicKey) -> Option<SharedKey> {
        self.secret.diffie_hellman(peer_public)
    }
}
