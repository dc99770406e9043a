use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use crate::error::LedgerError;

/// Length in bytes of a principal identifier
pub const PRINCIPAL_LEN: usize = 20;

// Principal identifies an account on the ledger: a token holder, an operator,
// the issuing owner or the controller. It is a 20 byte address-like value;
// the all-zero value is the null principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal([u8; PRINCIPAL_LEN]);

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Ord for Principal {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Principal {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for Principal {
    fn default() -> Self {
        Principal::NULL
    }
}

impl Deref for Principal {
    type Target = [u8; PRINCIPAL_LEN];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for Principal {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| LedgerError::InvalidPrincipal(format!("{}: {}", s, e)))?;
        let raw: [u8; PRINCIPAL_LEN] = bytes.try_into().map_err(|_| {
            LedgerError::InvalidPrincipal(format!("{}: expected {} bytes", s, PRINCIPAL_LEN))
        })?;
        Ok(Principal(raw))
    }
}

impl TryFrom<String> for Principal {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.to_string()
    }
}

impl Principal {
    /// The null principal; never a valid receiver or redemption source
    pub const NULL: Principal = Principal([0; PRINCIPAL_LEN]);

    pub fn new(raw: [u8; PRINCIPAL_LEN]) -> Self {
        Principal(raw)
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// True for the all-zero principal
    pub fn is_null(&self) -> bool {
        self.0 == [0; PRINCIPAL_LEN]
    }

    /// Derive a principal from the given seeds
    ///
    /// The seeds are hashed with SHA-256 behind a domain separator and the
    /// digest is truncated to the principal length. The same seeds always
    /// produce the same principal.
    pub fn derive(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"STRATA_Principal");

        for seed in seeds {
            hasher.update((seed.len() as u64).to_le_bytes());
            hasher.update(seed);
        }

        let digest: [u8; 32] = hasher.finalize().into();
        let mut raw = [0u8; PRINCIPAL_LEN];
        raw.copy_from_slice(&digest[..PRINCIPAL_LEN]);
        Principal(raw)
    }

    /// Derive a principal from a human-readable account label
    pub fn from_label(label: &str) -> Self {
        Self::derive(&[label.as_bytes()])
    }
}
