//! # StormSale Core
//!
//! Pure primitives shared by every StormSale crate: sale identifiers, chain
//! addresses, participant roles, wallet signing keys, and canonical encoding.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`SaleId`] - Ledger-assigned identifier of a logged sale
//! - [`Address`] - Normalized chain account identifier
//! - [`Role`] - Advertiser, affiliate, or auditor
//! - [`Keypair`] - Ed25519 wallet signing key
//! - [`SalePayload`] - The structured sale record that gets encrypted
//!
//! ## Canonicalization
//!
//! Payloads and signed messages are encoded using deterministic CBOR. See the
//! [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod payload;
pub mod types;

pub use canonical::{from_canonical_bytes, to_canonical_bytes};
pub use crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use error::CoreError;
pub use payload::SalePayload;
pub use types::{Address, Role, SaleId, ADDRESS_LEN};
