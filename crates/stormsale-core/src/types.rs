//! Strong type definitions for StormSale.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::Ed25519PublicKey;
use crate::error::CoreError;

/// Ledger-assigned identifier of a logged sale.
///
/// Sale ids start at 1 and increase by one per logged sale. Zero is reserved
/// for envelopes that have been built but not yet persisted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SaleId(pub u64);

impl SaleId {
    /// The id carried by an envelope before the ledger assigns one.
    pub const UNASSIGNED: Self = Self(0);

    /// Create from a raw integer.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw integer.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Whether the ledger has assigned this id.
    pub const fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for SaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SaleId({})", self.0)
    }
}

impl fmt::Display for SaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sale#{}", self.0)
    }
}

impl From<u64> for SaleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Number of bytes in an account address.
pub const ADDRESS_LEN: usize = 20;

/// A chain account address, normalized to `0x` followed by 40 lowercase hex digits.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse an address, accepting mixed-case hex.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| CoreError::InvalidAddress(format!("missing 0x prefix: {s}")))?;

        if digits.len() != ADDRESS_LEN * 2 {
            return Err(CoreError::InvalidAddress(format!(
                "expected {} hex digits, got {}",
                ADDRESS_LEN * 2,
                digits.len()
            )));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidAddress(format!("non-hex digit in {s}")));
        }

        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Create from raw address bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Derive the account address controlled by a wallet signing key.
    ///
    /// The address is the last 20 bytes of a domain-separated Blake3 hash of
    /// the public key.
    pub fn from_signer(signer: &Ed25519PublicKey) -> Self {
        let digest = blake3::derive_key("stormsale v1 account address", signer.as_bytes());
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[32 - ADDRESS_LEN..]);
        Self::from_bytes(bytes)
    }

    /// Get the normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the raw address bytes.
    pub fn to_bytes(&self) -> [u8; ADDRESS_LEN] {
        let mut bytes = [0u8; ADDRESS_LEN];
        // Normalized on construction, so decoding cannot fail.
        if let Ok(decoded) = hex::decode(&self.0[2..]) {
            bytes.copy_from_slice(&decoded);
        }
        bytes
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The part a participant plays in a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    /// Logged the sale and pays the commission.
    Advertiser = 1,
    /// Referred the sale and earns the commission.
    Affiliate = 2,
    /// Granted read access after the fact.
    Auditor = 3,
}

impl Role {
    /// Stable storage code.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse a storage code.
    pub fn from_u8(code: u8) -> Result<Self, CoreError> {
        match code {
            1 => Ok(Role::Advertiser),
            2 => Ok(Role::Affiliate),
            3 => Ok(Role::Auditor),
            other => Err(CoreError::UnknownRole(other)),
        }
    }

    /// Whether this role is present from the moment a sale is logged.
    pub const fn is_initial(self) -> bool {
        matches!(self, Role::Advertiser | Role::Affiliate)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Advertiser => "advertiser",
            Role::Affiliate => "affiliate",
            Role::Auditor => "auditor",
        };
        f.write_str(name)
    }
}
