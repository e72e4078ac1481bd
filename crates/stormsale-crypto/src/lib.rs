//! # StormSale Crypto
//!
//! Payload encryption and per-recipient key wrapping.
//!
//! ## Encryption Model
//!
//! A sale uses a two-layer key model:
//!
//! 1. **Content key**: a fresh [`SymmetricKey`] encrypts the sale payload
//!    with ChaCha20-Poly1305, producing a [`Ciphertext`].
//! 2. **Wrapped keys**: the content key is sealed to each participant's
//!    X25519 public key as a [`WrappedKey`].
//!
//! Adding an auditor later only needs a new wrapped key; the ciphertext
//! never changes.
//!
//! ```rust,no_run
//! use stormsale_crypto::{Ciphertext, EncryptionSecretKey, SymmetricKey, WrappedKey};
//!
//! # fn main() -> stormsale_crypto::Result<()> {
//! let recipient = EncryptionSecretKey::generate()?;
//! let content_key = SymmetricKey::generate()?;
//!
//! let ciphertext = Ciphertext::encrypt_plaintext(b"sale", &content_key)?;
//! let wrapped = WrappedKey::wrap(&content_key, &recipient.public_key())?;
//!
//! let key = wrapped.unwrap(&recipient)?;
//! assert_eq!(ciphertext.decrypt_plaintext(&key)?, b"sale");
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod error;
pub mod keys;
pub mod wrap;

pub use cipher::{Ciphertext, MIN_CIPHERTEXT_LEN, NONCE_LEN, TAG_LEN};
pub use error::{CryptoError, Result};
pub use keys::{
    fill_random, EncryptionPublicKey, EncryptionSecretKey, EphemeralKeyPair, SharedKey,
    SymmetricKey, KEY_DERIVATION_MESSAGE,
};
pub use wrap::{KeyUnwrapper, WrappedKey, WRAPPED_KEY_LEN};
