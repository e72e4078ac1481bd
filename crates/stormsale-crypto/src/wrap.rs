//! Sealing a sale's content key to one recipient.
//!
//! Each wrap uses a fresh ephemeral X25519 key. The wrapping key is derived
//! from the shared secret and both public keys, then seals the content key
//! with ChaCha20-Poly1305.
//!
//! Wire format: `ephemeral public (32) || nonce (12) || sealed key (32) || tag (16)`.

use bytes::Bytes;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use crate::cipher::{NONCE_LEN, TAG_LEN};
use crate::error::{CryptoError, Result};
use crate::keys::{
    fill_random, EncryptionPublicKey, EncryptionSecretKey, EphemeralKeyPair, SymmetricKey,
};

/// Exact length of a wrapped key.
pub const WRAPPED_KEY_LEN: usize = 32 + NONCE_LEN + SymmetricKey::LEN + TAG_LEN;

const WRAP_AAD: &[u8] = b"stormsale/wrapped-key/v1";

/// A content key sealed to one recipient's public key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey(Bytes);

impl WrappedKey {
    /// Seal `key` so only the holder of `recipient`'s private key can open it.
    pub fn wrap(key: &SymmetricKey, recipient: &EncryptionPublicKey) -> Result<Self> {
        let ephemeral = EphemeralKeyPair::generate()?;
        let ephemeral_public = ephemeral.public_key();

        let shared = ephemeral
            .diffie_hellman(recipient)
            .ok_or(CryptoError::InvalidPublicKey)?;
        let wrap_key = shared.derive_wrapping_key(&ephemeral_public, recipient);

        let mut nonce = [0u8; NONCE_LEN];
        fill_random(&mut nonce)?;

        let sealed = ChaCha20Poly1305::new(wrap_key.as_bytes().into())
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: key.as_bytes(),
                    aad: WRAP_AAD,
                },
            )
            .map_err(|_| CryptoError::InvalidPublicKey)?;

        let mut out = Vec::with_capacity(WRAPPED_KEY_LEN);
        out.extend_from_slice(ephemeral_public.as_bytes());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(Self(Bytes::from(out)))
    }

    /// Open with the recipient's private key.
    ///
    /// Every failure, whether a wrong key, a corrupted blob, or a bad length,
    /// is reported as [`CryptoError::UnwrapFailed`].
    pub fn unwrap(&self, secret: &EncryptionSecretKey) -> Result<SymmetricKey> {
        if self.0.len() != WRAPPED_KEY_LEN {
            return Err(CryptoError::UnwrapFailed);
        }
        let (eph, rest) = self.0.split_at(32);
        let (nonce, sealed) = rest.split_at(NONCE_LEN);

        let mut eph_bytes = [0u8; 32];
        eph_bytes.copy_from_slice(eph);
        let ephemeral_public = EncryptionPublicKey::from_bytes(eph_bytes);
        let recipient_public = secret.public_key();

        let shared = secret
            .diffie_hellman(&ephemeral_public)
            .ok_or(CryptoError::UnwrapFailed)?;
        let wrap_key = shared.derive_wrapping_key(&ephemeral_public, &recipient_public);

        let opened = Zeroizing::new(
            ChaCha20Poly1305::new(wrap_key.as_bytes().into())
                .decrypt(
                    Nonce::from_slice(nonce),
                    Payload {
                        msg: sealed,
                        aad: WRAP_AAD,
                    },
                )
                .map_err(|_| CryptoError::UnwrapFailed)?,
        );

        let key: [u8; 32] = opened
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::UnwrapFailed)?;
        Ok(SymmetricKey::from_bytes(key))
    }

    /// Wrap stored bytes. Structure is checked on unwrap.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WrappedKey({} bytes)", self.0.len())
    }
}

/// Anything able to open wrapped keys addressed to it.
///
/// Lets a hardware wallet or remote signer stand in for an in-memory secret.
pub trait KeyUnwrapper {
    /// Recover the content key from `wrapped`.
    fn unwrap_key(&self, wrapped: &WrappedKey) -> Result<SymmetricKey>;

    /// The public key wrapped keys must be addressed to.
    fn encryption_public_key(&self) -> EncryptionPublicKey;
}

impl KeyUnwrapper for EncryptionSecretKey {
    fn unwrap_key(&self, wrapped: &WrappedKey) -> Result<SymmetricKey> {
        wrapped.unwrap(self)
    }

    fn encryption_public_key(&self) -> EncryptionPublicKey {
        self.public_key()
    }
}
