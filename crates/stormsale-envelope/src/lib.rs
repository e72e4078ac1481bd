//! # StormSale Envelope
//!
//! Multi-recipient sale envelopes and the audit access protocol.
//!
//! ## Overview
//!
//! A sale is sealed once: its payload is encrypted under a fresh content key
//! and the key is wrapped for the advertiser and the affiliate. Either of them
//! can later extend the envelope to an auditor by unwrapping their own copy
//! and wrapping it again for the auditor's registered key.
//!
//! - [`EnvelopeBuilder`] - creates the initial two-recipient envelope
//! - [`AccessGrantProtocol`] - issues auditor records
//! - [`KeyDirectory`] - resolves addresses to encryption keys
//! - [`KeyHolder`] - a party able to open its own wrapped keys
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stormsale_core::SalePayload;
//! use stormsale_envelope::{AccessGrantProtocol, EnvelopeBuilder, KeyHolder, MemoryDirectory, Wallet};
//!
//! # async fn demo() -> stormsale_envelope::Result<()> {
//! let directory = MemoryDirectory::new();
//! let (advertiser, affiliate, auditor) = (Wallet::generate()?, Wallet::generate()?, Wallet::generate()?);
//! for wallet in [&advertiser, &affiliate, &auditor] {
//!     directory.register(wallet.registration()?)?;
//! }
//!
//! let payload = SalePayload::new("Digital Product", 100, 1736870400000);
//! let mut envelope = EnvelopeBuilder::new(&directory)
//!     .create_envelope(&payload, &advertiser.address(), &affiliate.address())
//!     .await?;
//!
//! let record = AccessGrantProtocol::new(&directory)
//!     .grant_as(&envelope, &advertiser, &auditor.address())
//!     .await?;
//! envelope.add_recipient(record)?;
//!
//! let opened: SalePayload = envelope.open(&auditor)?;
//! assert_eq!(opened, payload);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod directory;
pub mod envelope;
pub mod error;
pub mod grant;
pub mod wallet;

pub use builder::EnvelopeBuilder;
pub use directory::{KeyDirectory, KeyRegistration, MemoryDirectory};
pub use envelope::{EnvelopeStatus, Participant, SaleEnvelope, WrappedKeyRecord};
pub use error::{EnvelopeError, Result};
pub use grant::AccessGrantProtocol;
pub use wallet::{KeyHolder, Wallet};
