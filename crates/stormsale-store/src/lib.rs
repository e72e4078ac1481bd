//! # StormSale Store
//!
//! Append-only persistence for sealed sales, behind the [`EnvelopeStore`]
//! trait.
//!
//! ## Key Types
//!
//! - [`EnvelopeStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`AppendResult`] - Outcome of appending an auditor record
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stormsale_store::{EnvelopeStore, SqliteStore};
//!
//! # async fn example() -> stormsale_store::Result<()> {
//! let store = SqliteStore::open("sales.db")?;
//! println!("{} sales logged", store.sale_count().await?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Notes
//!
//! - **Append-only**: SQLite triggers abort any UPDATE or DELETE
//! - **Idempotent grants**: a second record for the same address returns `AlreadyGranted`
//! - **Serialized appends**: concurrent grants to distinct auditors all land

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{AppendResult, EnvelopeStore};

/// Current time in Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
