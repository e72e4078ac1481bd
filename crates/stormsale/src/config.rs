//! Vault configuration.

/// Configuration for a [`crate::SaleVault`].
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Largest accepted payload, measured as its canonical encoding.
    pub max_payload_bytes: usize,
    /// Most wrapped-key records one sale may carry, initial two included.
    pub max_recipients: usize,
}

impl VaultConfig {
    pub fn with_max_payload_bytes(mut self, bytes: usize) -> Self {
        self.max_payload_bytes = bytes;
        self
    }

    pub fn with_max_recipients(mut self, recipients: usize) -> Self {
        self.max_recipients = recipients;
        self
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 64 * 1024,
            max_recipients: 16,
        }
    }
}
