//! The sealed sale envelope: one ciphertext, many wrapped keys.
//!
//! Recipients are an ordered, append-only list. The first record always
//! belongs to the advertiser and the second to the affiliate; every later
//! record is an auditor. An address appears at most once.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use stormsale_core::{Address, Role, SaleId};
use stormsale_crypto::{Ciphertext, CryptoError, EncryptionPublicKey, WrappedKey};

use crate::error::{EnvelopeError, Result};
use crate::wallet::KeyHolder;

/// A party to a sale, with the key their wrapped key is sealed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub address: Address,
    pub public_key: EncryptionPublicKey,
    pub role: Role,
}

/// One recipient's copy of the sale's content key.
///
/// Immutable once created. A grant adds a new record and never replaces one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKeyRecord {
    pub recipient: Address,
    pub role: Role,
    pub wrapped_key: WrappedKey,
}

impl WrappedKeyRecord {
    pub fn new(recipient: Address, role: Role, wrapped_key: WrappedKey) -> Self {
        Self {
            recipient,
            role,
            wrapped_key,
        }
    }
}

/// Lifecycle of an envelope. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStatus {
    /// No envelope exists for the sale.
    Uncreated,
    /// Envelope exists; `auditors` grants have been appended.
    Active { recipients: usize, auditors: usize },
}

/// Ciphertext of a sale plus the content key wrapped for each recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct SaleEnvelope {
    sale_id: SaleId,
    ciphertext: Ciphertext,
    recipients: Vec<WrappedKeyRecord>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    sale_id: SaleId,
    ciphertext: Ciphertext,
    recipients: Vec<WrappedKeyRecord>,
}

impl TryFrom<RawEnvelope> for SaleEnvelope {
    type Error = EnvelopeError;

    fn try_from(raw: RawEnvelope) -> Result<Self> {
        Self::from_parts(raw.sale_id, raw.ciphertext, raw.recipients)
    }
}

impl SaleEnvelope {
    /// A freshly created, unpersisted envelope.
    pub(crate) fn created(
        ciphertext: Ciphertext,
        advertiser: WrappedKeyRecord,
        affiliate: WrappedKeyRecord,
    ) -> Result<Self> {
        Self::from_parts(SaleId::UNASSIGNED, ciphertext, vec![advertiser, affiliate])
    }

    /// Reassemble an envelope, checking its structural invariants.
    pub fn from_parts(
        sale_id: SaleId,
        ciphertext: Ciphertext,
        recipients: Vec<WrappedKeyRecord>,
    ) -> Result<Self> {
        if recipients.len() < 2 {
            return Err(EnvelopeError::InvalidEnvelope(format!(
                "{} recipients, need advertiser and affiliate",
                recipients.len()
            )));
        }
        for (i, record) in recipients.iter().enumerate() {
            let expected = match i {
                0 => Role::Advertiser,
                1 => Role::Affiliate,
                _ => Role::Auditor,
            };
            if record.role != expected {
                return Err(EnvelopeError::InvalidEnvelope(format!(
                    "recipient {i} is {}, expected {expected}",
                    record.role
                )));
            }
            if recipients[..i].iter().any(|r| r.recipient == record.recipient) {
                return Err(EnvelopeError::DuplicateRecipient(record.recipient.clone()));
            }
        }

        Ok(Self {
            sale_id,
            ciphertext,
            recipients,
        })
    }

    /// Return the envelope with a ledger-assigned id.
    pub fn with_sale_id(mut self, sale_id: SaleId) -> Self {
        self.sale_id = sale_id;
        self
    }

    pub fn sale_id(&self) -> SaleId {
        self.sale_id
    }

    pub fn ciphertext(&self) -> &Ciphertext {
        &self.ciphertext
    }

    /// All records, in the order they were added.
    pub fn recipients(&self) -> &[WrappedKeyRecord] {
        &self.recipients
    }

    pub fn advertiser(&self) -> &WrappedKeyRecord {
        &self.recipients[0]
    }

    pub fn affiliate(&self) -> &WrappedKeyRecord {
        &self.recipients[1]
    }

    /// Records appended by grants.
    pub fn auditors(&self) -> &[WrappedKeyRecord] {
        &self.recipients[2..]
    }

    /// The record held by `address`, if any.
    pub fn record_for(&self, address: &Address) -> Option<&WrappedKeyRecord> {
        self.recipients.iter().find(|r| &r.recipient == address)
    }

    pub fn has_recipient(&self, address: &Address) -> bool {
        self.record_for(address).is_some()
    }

    /// Whether `wrapped` is one of this envelope's wrapped keys.
    pub fn contains_wrapped_key(&self, wrapped: &WrappedKey) -> bool {
        self.recipients.iter().any(|r| &r.wrapped_key == wrapped)
    }

    /// Decrypt the payload with the holder's own wrapped key.
    ///
    /// A holder without a record, or whose key does not open it, is
    /// [`EnvelopeError::NotAuthorized`].
    pub fn open<T: DeserializeOwned, H: KeyHolder + ?Sized>(&self, holder: &H) -> Result<T> {
        let record = self
            .record_for(&holder.address())
            .ok_or(EnvelopeError::NotAuthorized)?;
        let key = match holder.unwrap_key(&record.wrapped_key) {
            Ok(key) => key,
            Err(CryptoError::UnwrapFailed) => return Err(EnvelopeError::NotAuthorized),
            Err(e) => return Err(e.into()),
        };
        Ok(self.ciphertext.decrypt(&key)?)
    }

    /// Append an auditor record.
    ///
    /// Existing records are never touched; an address that already holds a
    /// record is rejected.
    pub fn add_recipient(&mut self, record: WrappedKeyRecord) -> Result<()> {
        if record.role != Role::Auditor {
            return Err(EnvelopeError::InvalidEnvelope(format!(
                "only auditors can be appended, got {}",
                record.role
            )));
        }
        if self.has_recipient(&record.recipient) {
            return Err(EnvelopeError::DuplicateRecipient(record.recipient));
        }
        self.recipients.push(record);
        Ok(())
    }

    pub fn status(&self) -> EnvelopeStatus {
        EnvelopeStatus::Active {
            recipients: self.recipients.len(),
            auditors: self.recipients.len() - 2,
        }
    }

    /// Serialize to CBOR bytes for export.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| EnvelopeError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes, re-checking invariants.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| EnvelopeError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(byte: u8, role: Role) -> WrappedKeyRecord {
        WrappedKeyRecord::new(
            Address::from_bytes([byte; 20]),
            role,
            WrappedKey::from_bytes(vec![byte; 92]),
        )
    }

    fn envelope() -> SaleEnvelope {
        SaleEnvelope::created(
            Ciphertext::from_bytes(vec![0u8; 40]),
            record(1, Role::Advertiser),
            record(2, Role::Affiliate),
        )
        .unwrap()
    }

    #[test]
    fn test_created_envelope_shape() {
        let env = envelope();
        assert_eq!(env.sale_id(), SaleId::UNASSIGNED);
        assert_eq!(env.recipients().len(), 2);
        assert!(env.auditors().is_empty());
        assert_eq!(
            env.status(),
            EnvelopeStatus::Active {
                recipients: 2,
                auditors: 0
            }
        );
    }

    #[test]
    fn test_add_recipient_appends() {
        let mut env = envelope();
        env.add_recipient(record(3, Role::Auditor)).unwrap();
        env.add_recipient(record(4, Role::Auditor)).unwrap();

        assert_eq!(env.auditors().len(), 2);
        assert_eq!(env.recipients()[2].recipient, Address::from_bytes([3; 20]));
        assert!(env.has_recipient(&Address::from_bytes([4; 20])));
    }

    #[test]
    fn test_add_recipient_rejects_duplicates() {
        let mut env = envelope();
        let err = env.add_recipient(record(1, Role::Auditor)).unwrap_err();
        assert!(matches!(err, EnvelopeError::DuplicateRecipient(_)));

        env.add_recipient(record(3, Role::Auditor)).unwrap();
        assert!(env.add_recipient(record(3, Role::Auditor)).is_err());
        assert_eq!(env.recipients().len(), 3);
    }

    #[test]
    fn test_add_recipient_rejects_non_auditor() {
        let mut env = envelope();
        assert!(env.add_recipient(record(3, Role::Affiliate)).is_err());
    }

    #[test]
    fn test_from_parts_checks_roles() {
        let ct = Ciphertext::from_bytes(vec![0u8; 40]);
        let swapped = vec![record(2, Role::Affiliate), record(1, Role::Advertiser)];
        assert!(SaleEnvelope::from_parts(SaleId::new(1), ct.clone(), swapped).is_err());

        let short = vec![record(1, Role::Advertiser)];
        assert!(SaleEnvelope::from_parts(SaleId::new(1), ct, short).is_err());
    }

    #[test]
    fn test_cbor_roundtrip() {
        let mut env = envelope().with_sale_id(SaleId::new(9));
        env.add_recipient(record(3, Role::Auditor)).unwrap();

        let bytes = env.to_bytes().unwrap();
        assert_eq!(SaleEnvelope::from_bytes(&bytes).unwrap(), env);
    }

    #[test]
    fn test_decoding_revalidates() {
        let raw = SaleEnvelope {
            sale_id: SaleId::new(1),
            ciphertext: Ciphertext::from_bytes(vec![0u8; 40]),
            recipients: vec![record(1, Role::Advertiser), record(1, Role::Affiliate)],
        };
        let bytes = raw.to_bytes().unwrap();
        assert!(SaleEnvelope::from_bytes(&bytes).is_err());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn from_bytes_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
                let _ = SaleEnvelope::from_bytes(&bytes);
            }

            #[test]
            fn truncated_envelope_is_rejected(cut in 1usize..64) {
                let bytes = envelope().to_bytes().unwrap();
                let cut = cut.min(bytes.len());
                prop_assert!(SaleEnvelope::from_bytes(&bytes[..bytes.len() - cut]).is_err());
            }
        }
    }
}
