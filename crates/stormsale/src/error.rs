//! Error types for the sale vault.

use thiserror::Error;

use stormsale_core::{Address, SaleId};
use stormsale_envelope::EnvelopeError;
use stormsale_store::StoreError;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Envelope or crypto failure.
    #[error("envelope error: {0}")]
    Envelope(EnvelopeError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(StoreError),

    /// No sale with this id.
    #[error("sale not found: {0}")]
    SaleNotFound(SaleId),

    /// The caller holds no usable wrapped key for the sale.
    #[error("not authorized")]
    NotAuthorized,

    /// The directory has no encryption key for this address.
    #[error("address not registered: {0}")]
    AddressNotRegistered(Address),

    /// Advertiser and affiliate are the same address.
    #[error("duplicate recipient: {0}")]
    DuplicateRecipient(Address),

    /// Payload exceeds the configured limit.
    #[error("payload is {size} bytes, limit is {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// The sale already carries the configured maximum of recipients.
    #[error("{sale} already has the maximum of {max} recipients")]
    RecipientLimit { sale: SaleId, max: usize },
}

impl From<EnvelopeError> for VaultError {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::NotAuthorized => VaultError::NotAuthorized,
            EnvelopeError::AddressNotRegistered(addr) => VaultError::AddressNotRegistered(addr),
            EnvelopeError::DuplicateRecipient(addr) => VaultError::DuplicateRecipient(addr),
            other => VaultError::Envelope(other),
        }
    }
}

impl From<StoreError> for VaultError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(sale) => VaultError::SaleNotFound(sale),
            other => VaultError::Store(other),
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
