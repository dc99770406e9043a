use std::io;
use thiserror::Error;

use crate::id::Principal;
use crate::partition::Partition;
use crate::status::TransferStatus;

/// Represents all possible errors returned by ledger operations
///
/// Every error is raised before the first state write, so a failed operation
/// leaves the ledger exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The caller lacks the role or operator relation the operation requires
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// The destination is the null principal
    #[error("Invalid receiver")]
    InvalidReceiver,

    /// The source is the null principal
    #[error("Invalid sender")]
    InvalidSender,

    /// The partition is reserved or the source never held it
    #[error("Partition not exists: {0}")]
    PartitionNotExists(Partition),

    /// The source partition balance is smaller than the amount
    #[error("Insufficent balance")]
    InsufficientBalance,

    /// The spender's allowance is smaller than the amount
    #[error("Insufficent allowance")]
    InsufficientAllowance,

    /// Issuance and redemption require a non-zero amount
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// A balance or the total supply would exceed the 256-bit range
    #[error("Amount overflow")]
    AmountOverflow,

    /// The one-way switch has already been flipped
    #[error("Already finalized: {0}")]
    AlreadyFinalized(String),

    /// Issuance was permanently closed by the owner
    #[error("Issuance is closed")]
    IssuanceClosed,

    /// A partition label does not fit in 32 bytes
    #[error("Partition label too long: {0}")]
    PartitionTooLong(String),

    /// A principal could not be parsed
    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    /// The ledger state broke one of its accounting invariants
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl LedgerError {
    /// Shorthand for a `NotAuthorized` error naming the offending caller
    pub fn not_authorized(caller: &Principal, action: &str) -> Self {
        LedgerError::NotAuthorized(format!("{} may not {}", caller, action))
    }

    /// The structured status code matching this error, if it has one
    pub fn status(&self) -> Option<TransferStatus> {
        match self {
            LedgerError::InvalidReceiver => Some(TransferStatus::InvalidReceiver),
            LedgerError::PartitionNotExists(_) => Some(TransferStatus::PartitionNotExists),
            LedgerError::InsufficientBalance => Some(TransferStatus::InsufficientBalance),
            LedgerError::InsufficientAllowance => Some(TransferStatus::InsufficientAllowance),
            _ => None,
        }
    }
}

/// Errors raised while loading or validating a ledger configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO errors that occur when reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The configuration is not valid JSON for the expected shape
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but describes an unusable ledger
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while encoding or decoding exported event batches
#[derive(Error, Debug)]
pub enum CodecError {
    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for CodecError {
    fn from(err: bincode::Error) -> Self {
        CodecError::Serialization(err.to_string())
    }
}
