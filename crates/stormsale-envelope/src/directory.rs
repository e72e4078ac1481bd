//! Resolving wallet addresses to encryption public keys.
//!
//! The directory is an external collaborator: a contract registry, an
//! indexer, or a key server. The envelope layer only needs the
//! [`KeyDirectory`] trait. [`MemoryDirectory`] is an in-process registry that
//! accepts wallet-signed [`KeyRegistration`]s.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use stormsale_core::{to_canonical_bytes, Address, Ed25519PublicKey, Ed25519Signature, Keypair};
use stormsale_crypto::EncryptionPublicKey;

use crate::error::{EnvelopeError, Result};

const REGISTRATION_DOMAIN: &str = "stormsale/key-registration/v1";

/// Looks up the encryption key registered for an address.
///
/// Implementations must not cache stale keys on behalf of callers and must
/// not retry; failures propagate immediately.
#[async_trait]
pub trait KeyDirectory: Send + Sync {
    /// Resolve `address` to its encryption public key.
    ///
    /// Returns [`EnvelopeError::AddressNotRegistered`] when no key is known.
    async fn resolve_public_key(&self, address: &Address) -> Result<EncryptionPublicKey>;
}

/// A wallet's signed claim binding its address to an encryption key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRegistration {
    pub address: Address,
    pub encryption_key: EncryptionPublicKey,
    pub signer: Ed25519PublicKey,
    pub signature: Ed25519Signature,
}

#[derive(Serialize)]
struct RegistrationMessage<'a> {
    domain: &'a str,
    address: &'a Address,
    encryption_key: &'a EncryptionPublicKey,
}

impl KeyRegistration {
    /// Canonical bytes a wallet signs to register `encryption_key`.
    pub fn signing_message(
        address: &Address,
        encryption_key: &EncryptionPublicKey,
    ) -> Result<Vec<u8>> {
        Ok(to_canonical_bytes(&RegistrationMessage {
            domain: REGISTRATION_DOMAIN,
            address,
            encryption_key,
        })?)
    }

    /// Register `encryption_key` for the wallet's own address.
    pub fn sign(wallet: &Keypair, encryption_key: EncryptionPublicKey) -> Result<Self> {
        let address = wallet.address();
        let message = Self::signing_message(&address, &encryption_key)?;
        Ok(Self {
            address,
            encryption_key,
            signer: wallet.public_key(),
            signature: wallet.sign(&message),
        })
    }

    /// Check the signature and that the signer controls the address.
    pub fn verify(&self) -> Result<()> {
        if self.signer.address() != self.address {
            return Err(EnvelopeError::InvalidRegistration(format!(
                "signer does not control {}",
                self.address
            )));
        }
        let message = Self::signing_message(&self.address, &self.encryption_key)?;
        self.signer
            .verify(&message, &self.signature)
            .map_err(|e| EnvelopeError::InvalidRegistration(e.to_string()))
    }
}

/// In-memory key directory.
#[derive(Default)]
pub struct MemoryDirectory {
    keys: RwLock<HashMap<Address, EncryptionPublicKey>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key without a signature, for trusted sources.
    ///
    /// Returns the key previously registered for the address, if any.
    pub fn insert(
        &self,
        address: Address,
        key: EncryptionPublicKey,
    ) -> Result<Option<EncryptionPublicKey>> {
        let mut keys = self
            .keys
            .write()
            .map_err(|_| EnvelopeError::Directory("directory lock poisoned".into()))?;
        Ok(keys.insert(address, key))
    }

    /// Verify and record a wallet-signed registration.
    pub fn register(&self, registration: KeyRegistration) -> Result<()> {
        if let Err(e) = registration.verify() {
            tracing::warn!(address = %registration.address, error = %e, "rejected key registration");
            return Err(e);
        }
        tracing::debug!(
            address = %registration.address,
            key = ?registration.encryption_key,
            "registered encryption key"
        );
        self.insert(registration.address, registration.encryption_key)?;
        Ok(())
    }

    /// Number of registered addresses.
    pub fn len(&self) -> usize {
        self.keys.read().map(|k| k.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyDirectory for MemoryDirectory {
    async fn resolve_public_key(&self, address: &Address) -> Result<EncryptionPublicKey> {
        let keys = self
            .keys
            .read()
            .map_err(|_| EnvelopeError::Directory("directory lock poisoned".into()))?;
        keys.get(address)
            .copied()
            .ok_or_else(|| EnvelopeError::AddressNotRegistered(address.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stormsale_crypto::EncryptionSecretKey;

    #[tokio::test]
    async fn test_unregistered_address() {
        let dir = MemoryDirectory::new();
        let addr = Address::from_bytes([7; 20]);
        assert!(matches!(
            dir.resolve_public_key(&addr).await,
            Err(EnvelopeError::AddressNotRegistered(a)) if a == addr
        ));
    }

    #[tokio::test]
    async fn test_signed_registration() {
        let dir = MemoryDirectory::new();
        let wallet = Keypair::from_seed(&[0x21; 32]);
        let key = EncryptionSecretKey::derive_for_wallet(&wallet).public_key();

        dir.register(KeyRegistration::sign(&wallet, key).unwrap())
            .unwrap();

        assert_eq!(dir.resolve_public_key(&wallet.address()).await.unwrap(), key);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_forged_signature_rejected() {
        let dir = MemoryDirectory::new();
        let wallet = Keypair::from_seed(&[0x21; 32]);
        let key = EncryptionSecretKey::generate().unwrap().public_key();

        let mut reg = KeyRegistration::sign(&wallet, key).unwrap();
        reg.encryption_key = EncryptionSecretKey::generate().unwrap().public_key();

        assert!(matches!(
            dir.register(reg),
            Err(EnvelopeError::InvalidRegistration(_))
        ));
        assert!(dir.is_empty());
    }

    #[test]
    fn test_mismatched_address_rejected() {
        let wallet = Keypair::from_seed(&[0x21; 32]);
        let key = EncryptionSecretKey::generate().unwrap().public_key();

        let mut reg = KeyRegistration::sign(&wallet, key).unwrap();
        reg.address = Address::from_bytes([0xee; 20]);

        assert!(reg.verify().is_err());
    }

    #[tokio::test]
    async fn test_insert_replaces_key() {
        let dir = MemoryDirectory::new();
        let addr = Address::from_bytes([1; 20]);
        let k1 = EncryptionSecretKey::generate().unwrap().public_key();
        let k2 = EncryptionSecretKey::generate().unwrap().public_key();

        assert!(dir.insert(addr.clone(), k1).unwrap().is_none());
        assert_eq!(dir.insert(addr.clone(), k2).unwrap(), Some(k1));
        assert_eq!(dir.resolve_public_key(&addr).await.unwrap(), k2);
    }
}
