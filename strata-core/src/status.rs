use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LedgerError;
use crate::partition::Partition;

/// Structured status codes returned by the transfer predicates
///
/// The numeric values are part of the external contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransferStatus {
    /// The source never held the partition, or the partition is reserved
    PartitionNotExists = 0x50,
    /// The transfer would succeed
    Success = 0x51,
    /// The source partition balance is too small
    InsufficientBalance = 0x52,
    /// The spender allowance is too small (base ledger only)
    InsufficientAllowance = 0x53,
    /// The destination is the null principal
    InvalidReceiver = 0x57,
}

impl TransferStatus {
    /// The wire value of this status
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a status by its wire value
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x50 => Some(TransferStatus::PartitionNotExists),
            0x51 => Some(TransferStatus::Success),
            0x52 => Some(TransferStatus::InsufficientBalance),
            0x53 => Some(TransferStatus::InsufficientAllowance),
            0x57 => Some(TransferStatus::InvalidReceiver),
            _ => None,
        }
    }

    /// The fixed human-readable reason paired with this status
    pub fn reason(self) -> &'static str {
        match self {
            TransferStatus::Success => "Success",
            TransferStatus::PartitionNotExists => "Partition not exists",
            TransferStatus::InsufficientBalance => "Insufficent balance",
            TransferStatus::InsufficientAllowance => "Insufficent allowance",
            TransferStatus::InvalidReceiver => "Invalid receiver",
        }
    }

    pub fn is_success(self) -> bool {
        self == TransferStatus::Success
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x} {}", self.code(), self.reason())
    }
}

/// The answer to "can this transfer succeed"
///
/// Carries the status code, its reason string and, on success, the partition
/// the tokens would land in. Failed verdicts carry no partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferVerdict {
    /// Status code of the decision
    pub status: TransferStatus,

    /// Resolved destination partition (`None` on failure)
    pub partition: Option<Partition>,
}

impl TransferVerdict {
    /// A successful verdict resolving to `partition`
    pub fn success(partition: Partition) -> Self {
        Self {
            status: TransferStatus::Success,
            partition: Some(partition),
        }
    }

    /// A failed verdict with the given status
    pub fn failure(status: TransferStatus) -> Self {
        Self {
            status,
            partition: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Wire code of the status
    pub fn code(&self) -> u8 {
        self.status.code()
    }

    /// Reason string of the status
    pub fn reason(&self) -> &'static str {
        self.status.reason()
    }

    /// Convert the verdict into the error a mutating call would raise
    ///
    /// `source_partition` is reported in `PartitionNotExists` errors.
    pub fn into_result(self, source_partition: Partition) -> Result<Partition, LedgerError> {
        match (self.status, self.partition) {
            (TransferStatus::Success, Some(partition)) => Ok(partition),
            (TransferStatus::Success, None) => Ok(source_partition),
            (TransferStatus::PartitionNotExists, _) => {
                Err(LedgerError::PartitionNotExists(source_partition))
            }
            (TransferStatus::InsufficientBalance, _) => Err(LedgerError::InsufficientBalance),
            (TransferStatus::InsufficientAllowance, _) => Err(LedgerError::InsufficientAllowance),
            (TransferStatus::InvalidReceiver, _) => Err(LedgerError::InvalidReceiver),
        }
    }
}
