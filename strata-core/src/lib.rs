pub mod config;
pub mod error;
pub mod events;
pub mod id;
pub mod partition;
pub mod status;

/// Token amounts: unsigned 256-bit integers with checked arithmetic
pub type Amount = primitive_types::U256;

// Re-export the main types for convenience
pub use config::LedgerConfig;
pub use error::{CodecError, ConfigError, LedgerError};
pub use events::LedgerEvent;
pub use id::Principal;
pub use partition::Partition;
pub use status::{TransferStatus, TransferVerdict};
