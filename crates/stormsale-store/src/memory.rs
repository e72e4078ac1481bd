//! In-memory implementation of the EnvelopeStore trait.
//!
//! Same semantics as SQLite, no persistence. Thread-safe via RwLock; appends
//! hold the write lock for their whole check-then-insert.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use stormsale_core::{Address, SaleId};
use stormsale_crypto::Ciphertext;
use stormsale_envelope::{SaleEnvelope, WrappedKeyRecord};

use crate::error::{Result, StoreError};
use crate::traits::{check_appendable, check_insertable, AppendResult, EnvelopeStore};

/// In-memory store implementation.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    sales: BTreeMap<SaleId, StoredSale>,
    last_id: u64,
}

struct StoredSale {
    ciphertext: Ciphertext,
    recipients: Vec<WrappedKeyRecord>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                sales: BTreeMap::new(),
                last_id: 0,
            }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnvelopeStore for MemoryStore {
    async fn insert_envelope(&self, envelope: &SaleEnvelope) -> Result<SaleId> {
        check_insertable(envelope)?;
        let mut inner = self.write()?;

        inner.last_id += 1;
        let sale = SaleId::new(inner.last_id);
        inner.sales.insert(
            sale,
            StoredSale {
                ciphertext: envelope.ciphertext().clone(),
                recipients: envelope.recipients().to_vec(),
            },
        );
        Ok(sale)
    }

    async fn get_envelope(&self, sale: SaleId) -> Result<Option<SaleEnvelope>> {
        let inner = self.read()?;
        match inner.sales.get(&sale) {
            Some(stored) => Ok(Some(SaleEnvelope::from_parts(
                sale,
                stored.ciphertext.clone(),
                stored.recipients.clone(),
            )?)),
            None => Ok(None),
        }
    }

    async fn get_ciphertext(&self, sale: SaleId) -> Result<Option<Ciphertext>> {
        let inner = self.read()?;
        Ok(inner.sales.get(&sale).map(|s| s.ciphertext.clone()))
    }

    async fn get_wrapped_keys(&self, sale: SaleId) -> Result<Vec<WrappedKeyRecord>> {
        let inner = self.read()?;
        inner
            .sales
            .get(&sale)
            .map(|s| s.recipients.clone())
            .ok_or(StoreError::NotFound(sale))
    }

    async fn get_wrapped_key_for(
        &self,
        sale: SaleId,
        address: &Address,
    ) -> Result<Option<WrappedKeyRecord>> {
        let inner = self.read()?;
        Ok(inner.sales.get(&sale).and_then(|s| {
            s.recipients
                .iter()
                .find(|r| &r.recipient == address)
                .cloned()
        }))
    }

    async fn append_recipient(
        &self,
        sale: SaleId,
        record: &WrappedKeyRecord,
        max_recipients: usize,
    ) -> Result<AppendResult> {
        check_appendable(record)?;
        let mut inner = self.write()?;

        let stored = inner.sales.get_mut(&sale).ok_or(StoreError::NotFound(sale))?;
        if stored
            .recipients
            .iter()
            .any(|r| r.recipient == record.recipient)
        {
            return Ok(AppendResult::AlreadyGranted);
        }
        if stored.recipients.len() >= max_recipients {
            return Ok(AppendResult::LimitReached);
        }

        stored.recipients.push(record.clone());
        Ok(AppendResult::Appended)
    }

    async fn list_sales(&self, participant: Option<&Address>) -> Result<Vec<SaleId>> {
        let inner = self.read()?;
        Ok(inner
            .sales
            .iter()
            .filter(|(_, s)| match participant {
                Some(addr) => s.recipients.iter().any(|r| &r.recipient == addr),
                None => true,
            })
            .map(|(id, _)| *id)
            .collect())
    }

    async fn sale_count(&self) -> Result<u64> {
        Ok(self.read()?.sales.len() as u64)
    }
}
