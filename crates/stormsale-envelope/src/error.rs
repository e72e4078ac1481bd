//! Error types for envelope construction and access grants.

use thiserror::Error;

use stormsale_core::{Address, CoreError};
use stormsale_crypto::CryptoError;

/// Errors from building, extending, or decoding sale envelopes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Cryptographic failure (entropy, authentication, key wrapping).
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Encoding or key-format failure from the core primitives.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The directory has no encryption key for this address.
    #[error("address not registered: {0}")]
    AddressNotRegistered(Address),

    /// The directory backend failed.
    #[error("directory error: {0}")]
    Directory(String),

    /// The granter could not prove access to the sale's content key.
    #[error("not authorized to grant access")]
    NotAuthorized,

    /// The address already holds a wrapped key on this envelope.
    #[error("duplicate recipient: {0}")]
    DuplicateRecipient(Address),

    /// A key registration failed verification.
    #[error("invalid key registration: {0}")]
    InvalidRegistration(String),

    /// Envelope structure violates its invariants.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Envelope bytes could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
