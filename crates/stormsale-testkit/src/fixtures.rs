//! Test fixtures and helpers.
//!
//! Common setup code for integration tests. Every party is derived from a
//! fixed seed, so addresses and encryption keys are the same on every run.

use std::path::Path;
use std::sync::Arc;

use stormsale::{SaleVault, VaultConfig};
use stormsale_core::{Address, Keypair, SaleId, SalePayload};
use stormsale_envelope::{KeyHolder, MemoryDirectory, Wallet};
use stormsale_store::{MemoryStore, SqliteStore};

/// A named wallet.
pub struct TestParty {
    pub name: &'static str,
    pub wallet: Wallet,
}

impl TestParty {
    /// Create a party whose encryption key is derived from its signing seed.
    pub fn from_seed(name: &'static str, seed: [u8; 32]) -> Self {
        Self {
            name,
            wallet: Wallet::from_signing_keypair(Keypair::from_seed(&seed)),
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

/// Advertiser, affiliate, auditor, and an outsider, all registered in a
/// shared directory.
pub struct SaleFixture {
    pub directory: Arc<MemoryDirectory>,
    pub advertiser: TestParty,
    pub affiliate: TestParty,
    pub auditor: TestParty,
    pub outsider: TestParty,
}

impl SaleFixture {
    /// Create the fixture with every party registered.
    pub fn new() -> Self {
        let fixture = Self::unregistered();
        for party in fixture.parties() {
            fixture
                .directory
                .register(
                    party
                        .wallet
                        .registration()
                        .expect("fixture wallet signs its registration"),
                )
                .expect("fixture registration verifies");
        }
        fixture
    }

    /// Create the fixture with an empty directory.
    pub fn unregistered() -> Self {
        Self {
            directory: Arc::new(MemoryDirectory::new()),
            advertiser: TestParty::from_seed("advertiser", [0xa1; 32]),
            affiliate: TestParty::from_seed("affiliate", [0xa2; 32]),
            auditor: TestParty::from_seed("auditor", [0xa3; 32]),
            outsider: TestParty::from_seed("outsider", [0xa4; 32]),
        }
    }

    pub fn parties(&self) -> [&TestParty; 4] {
        [
            &self.advertiser,
            &self.affiliate,
            &self.auditor,
            &self.outsider,
        ]
    }

    /// A vault over a fresh in-memory store.
    pub fn memory_vault(&self) -> SaleVault<MemoryStore, MemoryDirectory> {
        self.memory_vault_with(VaultConfig::default())
    }

    pub fn memory_vault_with(&self, config: VaultConfig) -> SaleVault<MemoryStore, MemoryDirectory> {
        SaleVault::from_shared(Arc::new(MemoryStore::new()), self.directory.clone(), config)
    }

    /// A vault over a SQLite database at `path`.
    pub fn sqlite_vault(
        &self,
        path: impl AsRef<Path>,
    ) -> stormsale::Result<SaleVault<SqliteStore, MemoryDirectory>> {
        Ok(SaleVault::from_shared(
            Arc::new(SqliteStore::open(path)?),
            self.directory.clone(),
            VaultConfig::default(),
        ))
    }

    /// Log [`sample_payload`] between the fixture's advertiser and affiliate.
    pub async fn log_sample_sale<S: stormsale_store::EnvelopeStore>(
        &self,
        vault: &SaleVault<S, MemoryDirectory>,
    ) -> stormsale::Result<SaleId> {
        vault
            .log_sale(
                &sample_payload(),
                &self.advertiser.address(),
                &self.affiliate.address(),
            )
            .await
    }
}

impl Default for SaleFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// The sale used across scenarios.
pub fn sample_payload() -> SalePayload {
    SalePayload::new("Digital Product", 100, 1736870400000)
        .with_customer("alice@example.com")
        .with_metadata("Additional sale information")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parties_are_deterministic() {
        let a = SaleFixture::new();
        let b = SaleFixture::new();
        for (x, y) in a.parties().iter().zip(b.parties().iter()) {
            assert_eq!(x.address(), y.address());
        }
        assert_eq!(a.directory.len(), 4);
    }

    #[test]
    fn test_parties_are_distinct() {
        let f = SaleFixture::unregistered();
        let mut addrs: Vec<_> = f.parties().iter().map(|p| p.address()).collect();
        addrs.sort();
        addrs.dedup();
        assert_eq!(addrs.len(), 4);
        assert!(f.directory.is_empty());
    }
}
