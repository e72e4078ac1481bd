//! Error types for sale encryption and key wrapping.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
///
/// Integrity failures never carry partial plaintext, and unwrap failures
/// carry no detail about why the key did not open.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The operating system's secure random source failed.
    #[error("secure randomness unavailable: {0}")]
    EntropyUnavailable(String),

    /// Ciphertext failed authentication (tampered, or wrong key).
    #[error("ciphertext authentication failed")]
    AuthenticationFailed,

    /// Ciphertext is structurally invalid.
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// A wrapped key could not be opened with the supplied private key.
    #[error("key unwrap failed")]
    UnwrapFailed,

    /// A recipient public key is unusable for key agreement.
    #[error("invalid recipient public key")]
    InvalidPublicKey,

    /// Payload could not be serialized, or decrypted plaintext did not
    /// match the requested type.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<stormsale_core::CoreError> for CryptoError {
    fn from(e: stormsale_core::CoreError) -> Self {
        CryptoError::Serialization(e.to_string())
    }
}

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
