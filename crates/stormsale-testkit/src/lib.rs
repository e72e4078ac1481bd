//! # StormSale Testkit
//!
//! Testing utilities for StormSale.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: canonical encodings and byte layouts every
//!   implementation must reproduce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: deterministic parties, a populated key directory, and vaults
//!
//! ## Golden Vectors
//!
//! ```rust
//! use stormsale_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! for vector in all_vectors() {
//!     println!("{}: {}", vector.name, vector.expected_hex);
//! }
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use stormsale_testkit::fixtures::SaleFixture;
//!
//! # async fn demo() -> stormsale::Result<()> {
//! let fixture = SaleFixture::new();
//! let vault = fixture.memory_vault();
//! let sale = fixture.log_sample_sale(&vault).await?;
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{sample_payload, SaleFixture, TestParty};
pub use generators::{sale_payload, SalePayloadParams};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
