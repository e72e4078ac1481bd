//! # StormSale
//!
//! Sealed sales for affiliate marketing: an advertiser logs a sale whose
//! details only the advertiser, the affiliate, and auditors they later
//! authorize can read.
//!
//! ## Overview
//!
//! - **Sale payload**: encrypted once under a fresh content key
//! - **Wrapped keys**: the content key sealed to each participant's X25519 key
//! - **Audit grants**: a participant re-wraps the content key for an auditor;
//!   the ciphertext never changes and records are never replaced
//! - **Ledger**: append-only storage of ciphertexts and wrapped keys
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stormsale::{SaleVault, VaultConfig};
//! use stormsale::core::SalePayload;
//! use stormsale::envelope::{KeyHolder, MemoryDirectory, Wallet};
//! use stormsale::store::SqliteStore;
//!
//! # async fn example() -> stormsale::Result<()> {
//! let directory = MemoryDirectory::new();
//! let advertiser = Wallet::generate()?;
//! let affiliate = Wallet::generate()?;
//! let auditor = Wallet::generate()?;
//! for wallet in [&advertiser, &affiliate, &auditor] {
//!     directory.register(wallet.registration()?)?;
//! }
//!
//! let vault = SaleVault::new(SqliteStore::open("sales.db")?, directory, VaultConfig::default());
//!
//! let payload = SalePayload::new("Digital Product", 100, 1736870400000);
//! let sale = vault
//!     .log_sale(&payload, &advertiser.address(), &affiliate.address())
//!     .await?;
//!
//! vault.grant_audit_access(sale, &advertiser, &auditor.address()).await?;
//! let opened: SalePayload = vault.open_sale(sale, &auditor).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! - `stormsale::core` - Addresses, sale ids, wallet keys, canonical encoding
//! - `stormsale::crypto` - Payload encryption and key wrapping
//! - `stormsale::envelope` - Envelopes, key directory, grants, wallets
//! - `stormsale::store` - Ledger storage and SQLite

pub mod config;
pub mod error;
pub mod vault;

pub use stormsale_core as core;
pub use stormsale_crypto as crypto;
pub use stormsale_envelope as envelope;
pub use stormsale_store as store;

pub use config::VaultConfig;
pub use error::{Result, VaultError};
pub use vault::{GrantOutcome, SaleVault};

pub use stormsale_core::{Address, Role, SaleId, SalePayload};
pub use stormsale_envelope::{EnvelopeStatus, KeyHolder, SaleEnvelope, WrappedKeyRecord};
