//! Creating a sale envelope for the advertiser and affiliate.

use serde::Serialize;

use stormsale_core::{Address, Role};
use stormsale_crypto::{Ciphertext, SymmetricKey, WrappedKey};

use crate::directory::KeyDirectory;
use crate::envelope::{Participant, SaleEnvelope, WrappedKeyRecord};
use crate::error::{EnvelopeError, Result};

/// Builds envelopes, resolving recipient keys through a directory.
pub struct EnvelopeBuilder<'a, D: KeyDirectory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: KeyDirectory + ?Sized> EnvelopeBuilder<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Encrypt `payload` and wrap its key for both sale participants.
    ///
    /// The content key exists only for the duration of this call. Any
    /// failure aborts the whole operation and no partial envelope is
    /// produced.
    pub async fn create_envelope<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        advertiser: &Address,
        affiliate: &Address,
    ) -> Result<SaleEnvelope> {
        if advertiser == affiliate {
            return Err(EnvelopeError::DuplicateRecipient(affiliate.clone()));
        }

        let content_key = SymmetricKey::generate()?;
        let ciphertext = Ciphertext::encrypt(payload, &content_key)?;

        let advertiser = self.participant(advertiser, Role::Advertiser).await?;
        let affiliate = self.participant(affiliate, Role::Affiliate).await?;

        let advertiser_record = seal_for(&content_key, advertiser)?;
        let affiliate_record = seal_for(&content_key, affiliate)?;

        let envelope = SaleEnvelope::created(ciphertext, advertiser_record, affiliate_record)?;
        tracing::debug!(
            ciphertext = %envelope.ciphertext().fingerprint().short(),
            bytes = envelope.ciphertext().len(),
            "created sale envelope"
        );
        Ok(envelope)
    }

    async fn participant(&self, address: &Address, role: Role) -> Result<Participant> {
        let public_key = self.directory.resolve_public_key(address).await?;
        Ok(Participant {
            address: address.clone(),
            public_key,
            role,
        })
    }
}

/// Wrap `key` for one participant.
pub(crate) fn seal_for(key: &SymmetricKey, participant: Participant) -> Result<WrappedKeyRecord> {
    let wrapped_key = WrappedKey::wrap(key, &participant.public_key)?;
    Ok(WrappedKeyRecord::new(
        participant.address,
        participant.role,
        wrapped_key,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;
    use stormsale_core::SaleId;
    use stormsale_crypto::{EncryptionSecretKey, KeyUnwrapper};

    #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
    struct Amount {
        amount: u64,
    }

    fn party(dir: &MemoryDirectory, byte: u8) -> (Address, EncryptionSecretKey) {
        let addr = Address::from_bytes([byte; 20]);
        let secret = EncryptionSecretKey::generate().unwrap();
        dir.insert(addr.clone(), secret.public_key()).unwrap();
        (addr, secret)
    }

    #[tokio::test]
    async fn test_both_recipients_unwrap_same_key() {
        let dir = MemoryDirectory::new();
        let (adv, adv_secret) = party(&dir, 1);
        let (aff, aff_secret) = party(&dir, 2);

        let env = EnvelopeBuilder::new(&dir)
            .create_envelope(&Amount { amount: 100 }, &adv, &aff)
            .await
            .unwrap();

        assert_eq!(env.sale_id(), SaleId::UNASSIGNED);
        assert_eq!(env.recipients().len(), 2);
        assert_eq!(env.advertiser().recipient, adv);
        assert_eq!(env.affiliate().recipient, aff);

        let k1 = adv_secret.unwrap_key(&env.advertiser().wrapped_key).unwrap();
        let k2 = aff_secret.unwrap_key(&env.affiliate().wrapped_key).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());

        let payload: Amount = env.ciphertext().decrypt(&k1).unwrap();
        assert_eq!(payload, Amount { amount: 100 });
    }

    #[tokio::test]
    async fn test_unregistered_affiliate_aborts() {
        let dir = MemoryDirectory::new();
        let (adv, _) = party(&dir, 1);
        let aff = Address::from_bytes([2; 20]);

        let result = EnvelopeBuilder::new(&dir)
            .create_envelope(&Amount { amount: 1 }, &adv, &aff)
            .await;
        assert!(matches!(
            result,
            Err(EnvelopeError::AddressNotRegistered(a)) if a == aff
        ));
    }

    #[tokio::test]
    async fn test_same_party_rejected() {
        let dir = MemoryDirectory::new();
        let (adv, _) = party(&dir, 1);

        let result = EnvelopeBuilder::new(&dir)
            .create_envelope(&Amount { amount: 1 }, &adv, &adv)
            .await;
        assert!(matches!(result, Err(EnvelopeError::DuplicateRecipient(_))));
    }
}
