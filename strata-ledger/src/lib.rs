pub mod authorization;
pub mod balances;
pub mod controller;
pub mod event_log;
pub mod fungible;
pub mod invariants;
pub mod ledger;
pub mod operators;
pub mod partitions;

// Re-export the main types for convenience
pub use authorization::TransferAuthorization;
pub use balances::BalanceStore;
pub use controller::ControllerState;
pub use event_log::{decode_events, encode_events, EventLog};
pub use ledger::{HolderAccount, Ledger};
pub use operators::{Capability, OperatorAuthority};
pub use partitions::PartitionRegistry;
