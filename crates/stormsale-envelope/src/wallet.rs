//! Private-key holders.

use std::fmt;

use stormsale_core::{Address, Keypair};
use stormsale_crypto::{
    EncryptionPublicKey, EncryptionSecretKey, KeyUnwrapper, SymmetricKey, WrappedKey,
};

use crate::directory::KeyRegistration;
use crate::error::Result;

/// A party that can open wrapped keys addressed to its account.
pub trait KeyHolder: KeyUnwrapper + Send + Sync {
    /// The account the holder's wrapped keys are recorded under.
    fn address(&self) -> Address;
}

/// A wallet: signing key plus the encryption key derived from it.
pub struct Wallet {
    signing: Keypair,
    encryption: EncryptionSecretKey,
}

impl Wallet {
    /// Generate a random wallet with an independent encryption key.
    pub fn generate() -> Result<Self> {
        Ok(Self {
            signing: Keypair::generate(),
            encryption: EncryptionSecretKey::generate()?,
        })
    }

    /// Derive the encryption key from the wallet's signature.
    pub fn from_signing_keypair(signing: Keypair) -> Self {
        let encryption = EncryptionSecretKey::derive_for_wallet(&signing);
        Self {
            signing,
            encryption,
        }
    }

    pub fn signing_keypair(&self) -> &Keypair {
        &self.signing
    }

    pub fn encryption_key(&self) -> &EncryptionSecretKey {
        &self.encryption
    }

    /// Signed registration of this wallet's encryption key.
    pub fn registration(&self) -> Result<KeyRegistration> {
        KeyRegistration::sign(&self.signing, self.encryption.public_key())
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wallet({})", self.signing.address())
    }
}

impl KeyUnwrapper for Wallet {
    fn unwrap_key(&self, wrapped: &WrappedKey) -> stormsale_crypto::Result<SymmetricKey> {
        self.encryption.unwrap_key(wrapped)
    }

    fn encryption_public_key(&self) -> EncryptionPublicKey {
        self.encryption.public_key()
    }
}

impl KeyHolder for Wallet {
    fn address(&self) -> Address {
        self.signing.address()
    }
}
