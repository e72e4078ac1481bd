//! Extending an envelope to a newly authorized auditor.
//!
//! A grant proves possession of the content key by unwrapping one of the
//! envelope's own wrapped keys, then wraps that key for the auditor. The
//! ciphertext is never re-encrypted and existing records are never touched.

use stormsale_core::{Address, Role};
use stormsale_crypto::{CryptoError, KeyUnwrapper, WrappedKey};

use crate::builder::seal_for;
use crate::directory::KeyDirectory;
use crate::envelope::{Participant, SaleEnvelope, WrappedKeyRecord};
use crate::error::{EnvelopeError, Result};
use crate::wallet::KeyHolder;

/// Issues auditor records for existing envelopes.
pub struct AccessGrantProtocol<'a, D: KeyDirectory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: KeyDirectory + ?Sized> AccessGrantProtocol<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Produce a wrapped-key record for `new_recipient`.
    ///
    /// `granter_wrapped_key` must be one of `envelope`'s records and must
    /// open with `granter`; otherwise the grant fails with
    /// [`EnvelopeError::NotAuthorized`]. The caller appends the returned
    /// record.
    pub async fn grant_access<U: KeyUnwrapper + ?Sized>(
        &self,
        envelope: &SaleEnvelope,
        granter: &U,
        granter_wrapped_key: &WrappedKey,
        new_recipient: &Address,
    ) -> Result<WrappedKeyRecord> {
        if !envelope.contains_wrapped_key(granter_wrapped_key) {
            return Err(EnvelopeError::NotAuthorized);
        }

        let content_key = match granter.unwrap_key(granter_wrapped_key) {
            Ok(key) => key,
            Err(CryptoError::UnwrapFailed) => return Err(EnvelopeError::NotAuthorized),
            Err(e) => return Err(e.into()),
        };

        if envelope.has_recipient(new_recipient) {
            return Err(EnvelopeError::DuplicateRecipient(new_recipient.clone()));
        }

        let public_key = self.directory.resolve_public_key(new_recipient).await?;
        let record = seal_for(
            &content_key,
            Participant {
                address: new_recipient.clone(),
                public_key,
                role: Role::Auditor,
            },
        )?;

        tracing::debug!(sale = %envelope.sale_id(), auditor = %new_recipient, "issued audit grant");
        Ok(record)
    }

    /// Grant using the holder's own record on the envelope.
    pub async fn grant_as<H: KeyHolder + ?Sized>(
        &self,
        envelope: &SaleEnvelope,
        holder: &H,
        new_recipient: &Address,
    ) -> Result<WrappedKeyRecord> {
        let record = envelope
            .record_for(&holder.address())
            .ok_or(EnvelopeError::NotAuthorized)?;
        self.grant_access(envelope, holder, &record.wrapped_key, new_recipient)
            .await
    }
}
