use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// Length in bytes of a partition tag
pub const PARTITION_LEN: usize = 32;

/// A partition tag such as "Debt" or "Equity"
///
/// Partitions are opaque 32 byte tags compared byte for byte. A label is
/// stored left-aligned and right-padded with zero bytes, so "Debt" and "debt"
/// are different partitions. The all-zero tag is reserved: it can be
/// constructed (it is what an empty label produces) but no ledger operation
/// accepts it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Partition([u8; PARTITION_LEN]);

impl Partition {
    /// The reserved, always-invalid partition
    pub const RESERVED: Partition = Partition([0; PARTITION_LEN]);

    /// Build a partition from a label of at most 32 bytes
    pub fn new(label: &str) -> Result<Self, LedgerError> {
        let bytes = label.as_bytes();
        if bytes.len() > PARTITION_LEN {
            return Err(LedgerError::PartitionTooLong(label.to_string()));
        }

        let mut raw = [0u8; PARTITION_LEN];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Partition(raw))
    }

    /// Build a partition from its raw 32 byte form
    pub fn from_bytes(raw: [u8; PARTITION_LEN]) -> Self {
        Partition(raw)
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8; PARTITION_LEN] {
        &self.0
    }

    /// True for the all-zero tag
    pub fn is_reserved(&self) -> bool {
        self.0 == [0; PARTITION_LEN]
    }

    /// The label with its zero padding stripped, if it is valid UTF-8
    pub fn label(&self) -> Option<&str> {
        let end = self
            .0
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |last| last + 1);
        let trimmed = &self.0[..end];
        if trimmed.contains(&0) {
            return None;
        }
        std::str::from_utf8(trimmed).ok()
    }
}

impl Default for Partition {
    fn default() -> Self {
        Partition::RESERVED
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) if !label.starts_with("0x") => write!(f, "{}", label),
            _ => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Partition({})", self)
    }
}

impl FromStr for Partition {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Full-width hex is the raw form produced by Display for tags that
        // are not printable labels
        if let Some(digits) = s.strip_prefix("0x") {
            if digits.len() == PARTITION_LEN * 2 {
                if let Ok(bytes) = hex::decode(digits) {
                    let mut raw = [0u8; PARTITION_LEN];
                    raw.copy_from_slice(&bytes);
                    return Ok(Partition(raw));
                }
            }
        }
        Partition::new(s)
    }
}

impl TryFrom<&str> for Partition {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Partition {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Partition> for String {
    fn from(partition: Partition) -> Self {
        partition.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        let debt = Partition::new("Debt").unwrap();
        assert_eq!(debt.label(), Some("Debt"));
        assert_eq!(debt.to_string(), "Debt");
        assert!(!debt.is_reserved());
        assert_eq!(&debt.bytes()[..4], b"Debt");
        assert!(debt.bytes()[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_partitions_are_byte_exact() {
        let upper = Partition::new("Debt").unwrap();
        let lower = Partition::new("debt").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn test_empty_label_is_reserved() {
        let empty = Partition::new("").unwrap();
        assert!(empty.is_reserved());
        assert_eq!(empty, Partition::RESERVED);
        assert_eq!(Partition::default(), Partition::RESERVED);
    }

    #[test]
    fn test_label_too_long() {
        let label = "x".repeat(PARTITION_LEN + 1);
        assert!(matches!(
            Partition::new(&label),
            Err(LedgerError::PartitionTooLong(_))
        ));
        assert!(Partition::new(&"x".repeat(PARTITION_LEN)).is_ok());
    }

    #[test]
    fn test_non_label_bytes_render_as_hex() {
        let mut raw = [0u8; PARTITION_LEN];
        raw[0] = 0xff;
        raw[5] = 0x01;
        let partition = Partition::from_bytes(raw);
        assert_eq!(partition.label(), None);

        let rendered = partition.to_string();
        assert!(rendered.starts_with("0x"));
        let parsed: Partition = rendered.parse().unwrap();
        assert_eq!(parsed, partition);
    }

    #[test]
    fn test_serde_as_label() {
        let equity = Partition::new("Equity").unwrap();
        let json = serde_json::to_string(&equity).unwrap();
        assert_eq!(json, "\"Equity\"");
        let back: Partition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, equity);
    }
}
