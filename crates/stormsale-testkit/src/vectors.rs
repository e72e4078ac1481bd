//! Golden test vectors for deterministic verification.
//!
//! Canonical encodings any implementation must reproduce byte for byte, so
//! that payloads sealed by one client decode identically in another.

use stormsale_core::{to_canonical_bytes, CoreError, SalePayload};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Produces the encoding under test.
    pub encode: fn() -> Result<Vec<u8>, CoreError>,
    /// Expected canonical bytes (hex).
    pub expected_hex: &'static str,
}

fn amount_only() -> Result<Vec<u8>, CoreError> {
    to_canonical_bytes(&serde_json::json!({ "amount": 100 }))
}

fn default_payload() -> Result<Vec<u8>, CoreError> {
    to_canonical_bytes(&SalePayload::new("Digital Product", 100, 1736870400000))
}

fn full_payload() -> Result<Vec<u8>, CoreError> {
    to_canonical_bytes(
        &SalePayload::new("Digital Product", 100_500, 1736870400000)
            .with_reference("INV-0042")
            .with_customer("alice@example.com")
            .with_metadata("Additional sale information"),
    )
}

fn null_and_negative() -> Result<Vec<u8>, CoreError> {
    to_canonical_bytes(&serde_json::json!({ "b": [1, -1], "a": null }))
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "amount only",
            encode: amount_only,
            expected_hex: "a166616d6f756e741864",
        },
        GoldenVector {
            name: "default sale payload",
            encode: default_payload,
            expected_hex: "a666616d6f756e7418646770726f647563746f4469676974616c2050726f6475637468637573746f6d657272416e6f6e796d6f757320437573746f6d6572686d65746164617461f6697265666572656e63657253414c455f313733363837303430303030306974696d657374616d701b00000194658b1000",
        },
        GoldenVector {
            name: "full sale payload",
            encode: full_payload,
            expected_hex: "a666616d6f756e741a000188946770726f647563746f4469676974616c2050726f6475637468637573746f6d657271616c696365406578616d706c652e636f6d686d65746164617461781b4164646974696f6e616c2073616c6520696e666f726d6174696f6e697265666572656e636568494e562d303034326974696d657374616d701b00000194658b1000",
        },
        GoldenVector {
            name: "null and negative integer",
            encode: null_and_negative,
            expected_hex: "a26161f66162820120",
        },
    ]
}

/// Check every vector; returns `(name, actual)` for each mismatch.
pub fn verify_all_vectors() -> Vec<(&'static str, String)> {
    all_vectors()
        .into_iter()
        .filter_map(|v| {
            let actual = match (v.encode)() {
                Ok(bytes) => hex::encode(bytes),
                Err(e) => format!("error: {e}"),
            };
            (actual != v.expected_hex).then_some((v.name, actual))
        })
        .collect()
}
