//! The SaleVault: unified API for sealed sales.
//!
//! Wires the envelope protocol to a ledger store and a key directory. The
//! vault never sees a private key; callers pass a [`KeyHolder`] that opens
//! its own wrapped keys.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use stormsale_core::{to_canonical_bytes, Address, SaleId};
use stormsale_envelope::{
    AccessGrantProtocol, EnvelopeBuilder, EnvelopeError, EnvelopeStatus, KeyDirectory, KeyHolder,
    SaleEnvelope,
};
use stormsale_store::{AppendResult, EnvelopeStore};

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};

/// Outcome of an audit grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// A new wrapped key was appended for the auditor.
    Granted,
    /// The address could already open the sale; nothing was written.
    AlreadyGranted,
}

/// Logs, opens, and extends sealed sales.
pub struct SaleVault<S: EnvelopeStore, D: KeyDirectory> {
    store: Arc<S>,
    directory: Arc<D>,
    config: VaultConfig,
}

impl<S: EnvelopeStore, D: KeyDirectory> SaleVault<S, D> {
    /// Create a new vault.
    pub fn new(store: S, directory: D, config: VaultConfig) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(directory), config)
    }

    /// Create a vault over a store and directory shared with other components.
    pub fn from_shared(store: Arc<S>, directory: Arc<D>, config: VaultConfig) -> Self {
        Self {
            store,
            directory,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Encrypt a sale for its advertiser and affiliate and record it.
    pub async fn log_sale<T: Serialize + Sync + ?Sized>(
        &self,
        payload: &T,
        advertiser: &Address,
        affiliate: &Address,
    ) -> Result<SaleId> {
        let size = to_canonical_bytes(payload)
            .map_err(EnvelopeError::from)?
            .len();
        if size > self.config.max_payload_bytes {
            return Err(VaultError::PayloadTooLarge {
                size,
                max: self.config.max_payload_bytes,
            });
        }

        let envelope = EnvelopeBuilder::new(self.directory.as_ref())
            .create_envelope(payload, advertiser, affiliate)
            .await?;
        let sale = self.store.insert_envelope(&envelope).await?;

        tracing::info!(
            %sale,
            %advertiser,
            %affiliate,
            ciphertext = %envelope.ciphertext().fingerprint().short(),
            "logged sale"
        );
        Ok(sale)
    }

    /// Get a sale's envelope.
    pub async fn envelope(&self, sale: SaleId) -> Result<SaleEnvelope> {
        self.store
            .get_envelope(sale)
            .await?
            .ok_or(VaultError::SaleNotFound(sale))
    }

    /// Lifecycle state of a sale.
    pub async fn sale_status(&self, sale: SaleId) -> Result<EnvelopeStatus> {
        Ok(match self.store.get_envelope(sale).await? {
            Some(envelope) => envelope.status(),
            None => EnvelopeStatus::Uncreated,
        })
    }

    /// Decrypt a sale with the holder's own wrapped key.
    pub async fn open_sale<T: DeserializeOwned, H: KeyHolder + ?Sized>(
        &self,
        sale: SaleId,
        holder: &H,
    ) -> Result<T> {
        let envelope = self.envelope(sale).await?;
        envelope.open(holder).map_err(|e| {
            if matches!(e, EnvelopeError::NotAuthorized) {
                tracing::warn!(%sale, holder = %holder.address(), "open refused");
            }
            VaultError::from(e)
        })
    }

    /// Give `auditor` access to a sale, on the authority of `granter`.
    ///
    /// The granter must hold a wrapped key on the sale. The ciphertext is
    /// unchanged; one record is appended for the auditor.
    pub async fn grant_audit_access<H: KeyHolder + ?Sized>(
        &self,
        sale: SaleId,
        granter: &H,
        auditor: &Address,
    ) -> Result<GrantOutcome> {
        let envelope = self.envelope(sale).await?;
        let max = self.config.max_recipients;

        let record = match AccessGrantProtocol::new(self.directory.as_ref())
            .grant_as(&envelope, granter, auditor)
            .await
        {
            Ok(record) => record,
            Err(EnvelopeError::DuplicateRecipient(_)) => return Ok(GrantOutcome::AlreadyGranted),
            Err(EnvelopeError::NotAuthorized) => {
                tracing::warn!(%sale, granter = %granter.address(), %auditor, "grant refused");
                return Err(VaultError::NotAuthorized);
            }
            Err(e) => return Err(e.into()),
        };

        match self.store.append_recipient(sale, &record, max).await? {
            AppendResult::Appended => {
                tracing::info!(%sale, granter = %granter.address(), %auditor, "granted audit access");
                Ok(GrantOutcome::Granted)
            }
            AppendResult::AlreadyGranted => Ok(GrantOutcome::AlreadyGranted),
            AppendResult::LimitReached => Err(VaultError::RecipientLimit { sale, max }),
        }
    }

    /// Whether `address` holds a wrapped key on the sale.
    pub async fn has_access(&self, sale: SaleId, address: &Address) -> Result<bool> {
        let records = self.store.get_wrapped_keys(sale).await?;
        Ok(records.iter().any(|r| &r.recipient == address))
    }

    /// Sales `address` can open, ascending.
    pub async fn sales_for(&self, address: &Address) -> Result<Vec<SaleId>> {
        Ok(self.store.list_sales(Some(address)).await?)
    }

    /// Number of logged sales.
    pub async fn sale_count(&self) -> Result<u64> {
        Ok(self.store.sale_count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stormsale_core::{Role, SalePayload};
    use stormsale_envelope::{MemoryDirectory, Wallet};
    use stormsale_store::{MemoryStore, SqliteStore};

    struct Parties {
        advertiser: Wallet,
        affiliate: Wallet,
        auditor: Wallet,
        outsider: Wallet,
    }

    fn setup(config: VaultConfig) -> (SaleVault<MemoryStore, MemoryDirectory>, Parties) {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let directory = MemoryDirectory::new();
        let parties = Parties {
            advertiser: Wallet::generate().unwrap(),
            affiliate: Wallet::generate().unwrap(),
            auditor: Wallet::generate().unwrap(),
            outsider: Wallet::generate().unwrap(),
        };
        for w in [
            &parties.advertiser,
            &parties.affiliate,
            &parties.auditor,
            &parties.outsider,
        ] {
            directory.register(w.registration().unwrap()).unwrap();
        }
        (SaleVault::new(MemoryStore::new(), directory, config), parties)
    }

    fn payload() -> SalePayload {
        SalePayload::new("Digital Product", 100, 1736870400000).with_customer("alice@example.com")
    }

    #[tokio::test]
    async fn test_log_and_open() {
        let (vault, p) = setup(VaultConfig::default());
        let sale = vault
            .log_sale(&payload(), &p.advertiser.address(), &p.affiliate.address())
            .await
            .unwrap();
        assert_eq!(sale, SaleId::new(1));

        let by_adv: SalePayload = vault.open_sale(sale, &p.advertiser).await.unwrap();
        let by_aff: SalePayload = vault.open_sale(sale, &p.affiliate).await.unwrap();
        assert_eq!(by_adv, payload());
        assert_eq!(by_aff, payload());

        assert!(matches!(
            vault.open_sale::<SalePayload, _>(sale, &p.auditor).await,
            Err(VaultError::NotAuthorized)
        ));
    }

    #[tokio::test]
    async fn test_grant_then_auditor_opens() {
        let (vault, p) = setup(VaultConfig::default());
        let sale = vault
            .log_sale(&payload(), &p.advertiser.address(), &p.affiliate.address())
            .await
            .unwrap();
        let before = vault.envelope(sale).await.unwrap();

        let outcome = vault
            .grant_audit_access(sale, &p.advertiser, &p.auditor.address())
            .await
            .unwrap();
        assert_eq!(outcome, GrantOutcome::Granted);

        let opened: SalePayload = vault.open_sale(sale, &p.auditor).await.unwrap();
        assert_eq!(opened, payload());

        let after = vault.envelope(sale).await.unwrap();
        assert_eq!(after.ciphertext(), before.ciphertext());
        assert_eq!(&after.recipients()[..2], before.recipients());
        assert_eq!(after.auditors()[0].role, Role::Auditor);
        assert_eq!(
            vault.sale_status(sale).await.unwrap(),
            EnvelopeStatus::Active {
                recipients: 3,
                auditors: 1
            }
        );
    }

    #[tokio::test]
    async fn test_repeat_grant_is_idempotent() {
        let (vault, p) = setup(VaultConfig::default());
        let sale = vault
            .log_sale(&payload(), &p.advertiser.address(), &p.affiliate.address())
            .await
            .unwrap();

        vault
            .grant_audit_access(sale, &p.advertiser, &p.auditor.address())
            .await
            .unwrap();
        let again = vault
            .grant_audit_access(sale, &p.affiliate, &p.auditor.address())
            .await
            .unwrap();
        assert_eq!(again, GrantOutcome::AlreadyGranted);
        assert_eq!(vault.envelope(sale).await.unwrap().recipients().len(), 3);
    }

    #[tokio::test]
    async fn test_outsider_cannot_grant() {
        let (vault, p) = setup(VaultConfig::default());
        let sale = vault
            .log_sale(&payload(), &p.advertiser.address(), &p.affiliate.address())
            .await
            .unwrap();

        assert!(matches!(
            vault
                .grant_audit_access(sale, &p.outsider, &p.auditor.address())
                .await,
            Err(VaultError::NotAuthorized)
        ));
        assert!(!vault.has_access(sale, &p.auditor.address()).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_sale() {
        let (vault, p) = setup(VaultConfig::default());
        let missing = SaleId::new(42);

        assert!(matches!(
            vault.envelope(missing).await,
            Err(VaultError::SaleNotFound(s)) if s == missing
        ));
        assert!(matches!(
            vault.has_access(missing, &p.advertiser.address()).await,
            Err(VaultError::SaleNotFound(_))
        ));
        assert_eq!(
            vault.sale_status(missing).await.unwrap(),
            EnvelopeStatus::Uncreated
        );
    }

    #[tokio::test]
    async fn test_payload_limit() {
        let (vault, p) = setup(VaultConfig::default().with_max_payload_bytes(32));
        let big = payload().with_metadata("x".repeat(64));

        assert!(matches!(
            vault
                .log_sale(&big, &p.advertiser.address(), &p.affiliate.address())
                .await,
            Err(VaultError::PayloadTooLarge { max: 32, .. })
        ));
        assert_eq!(vault.sale_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recipient_limit() {
        let (vault, p) = setup(VaultConfig::default().with_max_recipients(3));
        let sale = vault
            .log_sale(&payload(), &p.advertiser.address(), &p.affiliate.address())
            .await
            .unwrap();

        vault
            .grant_audit_access(sale, &p.advertiser, &p.auditor.address())
            .await
            .unwrap();
        assert!(matches!(
            vault
                .grant_audit_access(sale, &p.advertiser, &p.outsider.address())
                .await,
            Err(VaultError::RecipientLimit { max: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_unregistered_affiliate() {
        let (vault, p) = setup(VaultConfig::default());
        let stranger = Address::from_bytes([0x55; 20]);

        assert!(matches!(
            vault
                .log_sale(&payload(), &p.advertiser.address(), &stranger)
                .await,
            Err(VaultError::AddressNotRegistered(a)) if a == stranger
        ));
        assert_eq!(vault.sale_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sales_for_participant() {
        let (vault, p) = setup(VaultConfig::default());
        let first = vault
            .log_sale(&payload(), &p.advertiser.address(), &p.affiliate.address())
            .await
            .unwrap();
        let second = vault
            .log_sale(&payload(), &p.outsider.address(), &p.affiliate.address())
            .await
            .unwrap();

        assert_eq!(
            vault.sales_for(&p.affiliate.address()).await.unwrap(),
            vec![first, second]
        );
        assert_eq!(
            vault.sales_for(&p.advertiser.address()).await.unwrap(),
            vec![first]
        );
        assert!(vault.sales_for(&p.auditor.address()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_vault_persists_grants() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vault.db");

        let (memory, p) = setup(VaultConfig::default());
        let directory = memory.directory.clone();

        let sale = {
            let vault = SaleVault::from_shared(
                Arc::new(SqliteStore::open(&path).unwrap()),
                directory.clone(),
                VaultConfig::default(),
            );
            let sale = vault
                .log_sale(&payload(), &p.advertiser.address(), &p.affiliate.address())
                .await
                .unwrap();
            vault
                .grant_audit_access(sale, &p.affiliate, &p.auditor.address())
                .await
                .unwrap();
            sale
        };

        let vault = SaleVault::from_shared(
            Arc::new(SqliteStore::open(&path).unwrap()),
            directory,
            VaultConfig::default(),
        );
        let opened: SalePayload = vault.open_sale(sale, &p.auditor).await.unwrap();
        assert_eq!(opened, payload());
        assert_eq!(vault.sale_count().await.unwrap(), 1);
    }
}
