//! Authenticated encryption of sale payloads.
//!
//! Wire format: `nonce (12) || ciphertext || tag (16)`. The nonce is fresh
//! per encryption and the tag covers a fixed domain label as associated
//! data, so any bit flip anywhere in the blob fails authentication.

use bytes::Bytes;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use stormsale_core::{from_canonical_bytes, to_canonical_bytes, Blake3Hash};

use crate::error::{CryptoError, Result};
use crate::keys::{fill_random, SymmetricKey};

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Poly1305 tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Smallest well-formed ciphertext (empty plaintext).
pub const MIN_CIPHERTEXT_LEN: usize = NONCE_LEN + TAG_LEN;

const PAYLOAD_AAD: &[u8] = b"stormsale/sale-payload/v1";

/// An encrypted sale payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext(Bytes);

impl Ciphertext {
    /// Encrypt a value's canonical CBOR encoding under `key`.
    pub fn encrypt<T: Serialize + ?Sized>(value: &T, key: &SymmetricKey) -> Result<Self> {
        let plaintext = Zeroizing::new(to_canonical_bytes(value)?);
        Self::encrypt_plaintext(&plaintext, key)
    }

    /// Decrypt and decode a value.
    ///
    /// Authentication is checked before anything is decoded.
    pub fn decrypt<T: DeserializeOwned>(&self, key: &SymmetricKey) -> Result<T> {
        let plaintext = Zeroizing::new(self.decrypt_plaintext(key)?);
        from_canonical_bytes(&plaintext).map_err(|e| CryptoError::Serialization(e.to_string()))
    }

    /// Encrypt raw bytes under `key`.
    pub fn encrypt_plaintext(plaintext: &[u8], key: &SymmetricKey) -> Result<Self> {
        let mut nonce = [0u8; NONCE_LEN];
        fill_random(&mut nonce)?;

        let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
        let sealed = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: PAYLOAD_AAD,
                },
            )
            .map_err(|_| CryptoError::MalformedCiphertext("encryption failed".into()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(Self(Bytes::from(out)))
    }

    /// Decrypt to raw bytes.
    pub fn decrypt_plaintext(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        if self.0.len() < MIN_CIPHERTEXT_LEN {
            return Err(CryptoError::MalformedCiphertext(format!(
                "{} bytes, need at least {MIN_CIPHERTEXT_LEN}",
                self.0.len()
            )));
        }
        let (nonce, sealed) = self.0.split_at(NONCE_LEN);

        let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: PAYLOAD_AAD,
                },
            )
            .map_err(|_| CryptoError::AuthenticationFailed)
    }

    /// Wrap stored bytes. Structure is checked on decrypt.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The nonce prefix, if present.
    pub fn nonce(&self) -> Option<&[u8]> {
        self.0.get(..NONCE_LEN)
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the blob is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Blake3 digest of the blob, for logs and indexes.
    pub fn fingerprint(&self) -> Blake3Hash {
        Blake3Hash::hash(&self.0)
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ciphertext({} bytes, {})",
            self.0.len(),
            self.fingerprint().short()
        )
    }
}
