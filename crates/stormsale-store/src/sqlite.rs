//! SQLite implementation of the EnvelopeStore trait.
//!
//! The primary storage backend. Uses rusqlite with bundled SQLite, wrapped in
//! async via `tokio::task::spawn_blocking`. Appends run inside IMMEDIATE
//! transactions so the duplicate check and the insert see the same state.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use stormsale_core::{Address, Role, SaleId};
use stormsale_crypto::{Ciphertext, WrappedKey};
use stormsale_envelope::{SaleEnvelope, WrappedKeyRecord};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{check_appendable, check_insertable, AppendResult, EnvelopeStore};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn sql_id(sale: SaleId) -> i64 {
    sale.get() as i64
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, u8, Vec<u8>)> {
    Ok((row.get("recipient")?, row.get("role")?, row.get("wrapped_key")?))
}

fn decode_record((recipient, role, wrapped_key): (String, u8, Vec<u8>)) -> Result<WrappedKeyRecord> {
    let recipient = Address::parse(&recipient)
        .map_err(|e| StoreError::InvalidData(format!("recipient: {e}")))?;
    let role = Role::from_u8(role).map_err(|e| StoreError::InvalidData(e.to_string()))?;
    Ok(WrappedKeyRecord::new(
        recipient,
        role,
        WrappedKey::from_bytes(wrapped_key),
    ))
}

fn load_records(conn: &Connection, sale: SaleId) -> Result<Vec<WrappedKeyRecord>> {
    let mut stmt = conn.prepare(
        "SELECT recipient, role, wrapped_key FROM sale_recipients
         WHERE sale_id = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map(params![sql_id(sale)], row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(decode_record).collect()
}

fn load_ciphertext(conn: &Connection, sale: SaleId) -> Result<Option<Ciphertext>> {
    let bytes: Option<Vec<u8>> = conn
        .query_row(
            "SELECT ciphertext FROM sales WHERE sale_id = ?1",
            params![sql_id(sale)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(bytes.map(Ciphertext::from_bytes))
}

fn insert_record(
    conn: &Connection,
    sale: SaleId,
    position: usize,
    record: &WrappedKeyRecord,
    now: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO sale_recipients (sale_id, position, recipient, role, wrapped_key, granted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            sql_id(sale),
            position as i64,
            record.recipient.as_str(),
            record.role.to_u8(),
            record.wrapped_key.as_bytes(),
            now,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl EnvelopeStore for SqliteStore {
    async fn insert_envelope(&self, envelope: &SaleEnvelope) -> Result<SaleId> {
        check_insertable(envelope)?;
        let envelope = envelope.clone();

        self.run(move |conn| {
            let now = crate::now_millis();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let ciphertext = envelope.ciphertext();
            tx.execute(
                "INSERT INTO sales (ciphertext, fingerprint, created_at) VALUES (?1, ?2, ?3)",
                params![
                    ciphertext.as_bytes(),
                    ciphertext.fingerprint().as_bytes().as_slice(),
                    now
                ],
            )?;
            let raw_id = tx.last_insert_rowid();
            let sale = u64::try_from(raw_id)
                .map(SaleId::new)
                .map_err(|_| StoreError::InvalidData(format!("sale id {raw_id}")))?;

            for (position, record) in envelope.recipients().iter().enumerate() {
                insert_record(&tx, sale, position, record, now)?;
            }

            tx.commit()?;
            Ok(sale)
        })
        .await
    }

    async fn get_envelope(&self, sale: SaleId) -> Result<Option<SaleEnvelope>> {
        self.run(move |conn| {
            let Some(ciphertext) = load_ciphertext(conn, sale)? else {
                return Ok(None);
            };
            let recipients = load_records(conn, sale)?;
            Ok(Some(SaleEnvelope::from_parts(sale, ciphertext, recipients)?))
        })
        .await
    }

    async fn get_ciphertext(&self, sale: SaleId) -> Result<Option<Ciphertext>> {
        self.run(move |conn| load_ciphertext(conn, sale)).await
    }

    async fn get_wrapped_keys(&self, sale: SaleId) -> Result<Vec<WrappedKeyRecord>> {
        self.run(move |conn| {
            let records = load_records(conn, sale)?;
            if records.is_empty() {
                return Err(StoreError::NotFound(sale));
            }
            Ok(records)
        })
        .await
    }

    async fn get_wrapped_key_for(
        &self,
        sale: SaleId,
        address: &Address,
    ) -> Result<Option<WrappedKeyRecord>> {
        let address = address.clone();
        self.run(move |conn| {
            let row = conn
                .query_row(
                    "SELECT recipient, role, wrapped_key FROM sale_recipients
                     WHERE sale_id = ?1 AND recipient = ?2",
                    params![sql_id(sale), address.as_str()],
                    row_to_record,
                )
                .optional()?;
            row.map(decode_record).transpose()
        })
        .await
    }

    async fn append_recipient(
        &self,
        sale: SaleId,
        record: &WrappedKeyRecord,
        max_recipients: usize,
    ) -> Result<AppendResult> {
        check_appendable(record)?;
        let record = record.clone();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM sale_recipients WHERE sale_id = ?1",
                params![sql_id(sale)],
                |row| row.get(0),
            )?;
            if count == 0 {
                return Err(StoreError::NotFound(sale));
            }

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT position FROM sale_recipients WHERE sale_id = ?1 AND recipient = ?2",
                    params![sql_id(sale), record.recipient.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(AppendResult::AlreadyGranted);
            }

            let count = count as usize;
            if count >= max_recipients {
                return Ok(AppendResult::LimitReached);
            }

            insert_record(&tx, sale, count, &record, crate::now_millis())?;
            tx.commit()?;
            Ok(AppendResult::Appended)
        })
        .await
    }

    async fn list_sales(&self, participant: Option<&Address>) -> Result<Vec<SaleId>> {
        let participant = participant.cloned();
        self.run(move |conn| {
            let ids: Vec<i64> = match participant {
                Some(addr) => {
                    let mut stmt = conn.prepare(
                        "SELECT sale_id FROM sale_recipients WHERE recipient = ?1 ORDER BY sale_id",
                    )?;
                    let rows = stmt.query_map(params![addr.as_str()], |row| row.get(0))?;
                    rows.collect::<rusqlite::Result<Vec<i64>>>()?
                }
                None => {
                    let mut stmt = conn.prepare("SELECT sale_id FROM sales ORDER BY sale_id")?;
                    let rows = stmt.query_map([], |row| row.get(0))?;
                    rows.collect::<rusqlite::Result<Vec<i64>>>()?
                }
            };
            Ok(ids.into_iter().map(|id| SaleId::new(id as u64)).collect())
        })
        .await
    }

    async fn sale_count(&self) -> Result<u64> {
        self.run(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
