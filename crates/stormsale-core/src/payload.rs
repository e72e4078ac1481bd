//! The structured sale record that advertisers encrypt when logging a sale.

use serde::{Deserialize, Serialize};

/// Customer label used when the advertiser supplies none.
pub const ANONYMOUS_CUSTOMER: &str = "Anonymous Customer";

/// Details of a sale, kept private between the sale's participants.
///
/// Amounts are integers in the token's smallest unit; canonical encoding does
/// not admit floats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePayload {
    /// Advertiser-side reference, e.g. `SALE_1736870400000`.
    pub reference: String,

    /// Customer name, email, or reference id.
    pub customer: String,

    /// What was sold.
    pub product: String,

    /// Sale amount in the smallest token unit.
    pub amount: u64,

    /// When the sale happened (Unix milliseconds).
    pub timestamp: i64,

    /// Free-form additional information.
    pub metadata: Option<String>,
}

impl SalePayload {
    /// Create a payload for an anonymous customer.
    ///
    /// The reference is derived from the timestamp.
    pub fn new(product: impl Into<String>, amount: u64, timestamp: i64) -> Self {
        Self {
            reference: format!("SALE_{timestamp}"),
            customer: ANONYMOUS_CUSTOMER.to_string(),
            product: product.into(),
            amount,
            timestamp,
            metadata: None,
        }
    }

    /// Set the customer. Blank input keeps the anonymous label.
    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        let customer = customer.into();
        if !customer.trim().is_empty() {
            self.customer = customer;
        }
        self
    }

    /// Override the reference.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}
