//! EnvelopeStore trait: the abstract interface for sale persistence.
//!
//! Mirrors the ledger contract's storage: a sale counter, one ciphertext per
//! sale, and an append-only list of wrapped keys per sale. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;

use stormsale_core::{Address, SaleId};
use stormsale_crypto::Ciphertext;
use stormsale_envelope::{SaleEnvelope, WrappedKeyRecord};

use crate::error::Result;

/// Result of appending a recipient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendResult {
    /// The record was stored.
    Appended,
    /// The address already holds a record on this sale (idempotent, not an error).
    AlreadyGranted,
    /// The sale already has the maximum number of recipients.
    LimitReached,
}

/// Async interface for sale persistence.
///
/// # Design Notes
///
/// - **Append-only**: ciphertexts and records are never updated or deleted.
/// - **Sequential ids**: the first stored sale gets id 1.
/// - **Serialized appends**: concurrent appends to one sale never lose a
///   record, and at most one record per address is kept.
#[async_trait]
pub trait EnvelopeStore: Send + Sync {
    /// Persist a freshly built envelope and assign its sale id.
    ///
    /// The envelope must be unassigned and carry exactly the advertiser and
    /// affiliate records. Ciphertext and both records are written atomically.
    async fn insert_envelope(&self, envelope: &SaleEnvelope) -> Result<SaleId>;

    /// Get a sale's envelope with all of its records.
    async fn get_envelope(&self, sale: SaleId) -> Result<Option<SaleEnvelope>>;

    /// Get a sale's ciphertext.
    async fn get_ciphertext(&self, sale: SaleId) -> Result<Option<Ciphertext>>;

    /// Get all records of a sale, in append order.
    ///
    /// Returns [`crate::StoreError::NotFound`] for an unknown sale.
    async fn get_wrapped_keys(&self, sale: SaleId) -> Result<Vec<WrappedKeyRecord>>;

    /// Get the record held by `address` on a sale.
    async fn get_wrapped_key_for(
        &self,
        sale: SaleId,
        address: &Address,
    ) -> Result<Option<WrappedKeyRecord>>;

    /// Append an auditor record.
    ///
    /// `max_recipients` caps the total number of records on the sale.
    /// Returns [`crate::StoreError::NotFound`] for an unknown sale.
    async fn append_recipient(
        &self,
        sale: SaleId,
        record: &WrappedKeyRecord,
        max_recipients: usize,
    ) -> Result<AppendResult>;

    /// List sale ids in ascending order, optionally only those `participant`
    /// holds a record on.
    async fn list_sales(&self, participant: Option<&Address>) -> Result<Vec<SaleId>>;

    /// Number of stored sales.
    async fn sale_count(&self) -> Result<u64>;
}

/// Check that an envelope is in its freshly created shape.
pub(crate) fn check_insertable(envelope: &SaleEnvelope) -> Result<()> {
    if envelope.sale_id().is_assigned() {
        return Err(crate::StoreError::Rejected(format!(
            "envelope already has id {}",
            envelope.sale_id()
        )));
    }
    if !envelope.auditors().is_empty() {
        return Err(crate::StoreError::Rejected(format!(
            "new envelope carries {} auditor records",
            envelope.auditors().len()
        )));
    }
    Ok(())
}

/// Check that a record may be appended by a grant.
pub(crate) fn check_appendable(record: &WrappedKeyRecord) -> Result<()> {
    if record.role != stormsale_core::Role::Auditor {
        return Err(crate::StoreError::Rejected(format!(
            "only auditor records can be appended, got {}",
            record.role
        )));
    }
    Ok(())
}
