use serde::{Deserialize, Serialize};

use crate::id::Principal;
use crate::partition::Partition;
use crate::Amount;

/// Domain events emitted by the ledger
///
/// Every successful mutating operation emits exactly one event. Field order
/// follows the external event signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Tokens issued into the default partition
    Issued {
        operator: Principal,
        to: Principal,
        value: Amount,
        data: Vec<u8>,
    },

    /// Tokens issued into a named partition
    IssuedByPartition {
        partition: Partition,
        operator: Principal,
        to: Principal,
        value: Amount,
        data: Vec<u8>,
    },

    /// Non-partitioned transfer (operator is null for self transfers)
    Transfer {
        operator: Principal,
        from: Principal,
        to: Principal,
        value: Amount,
        data: Vec<u8>,
    },

    /// Partitioned transfer (operator is null for self transfers)
    TransferByPartition {
        from_partition: Partition,
        operator: Principal,
        from: Principal,
        to: Principal,
        value: Amount,
        data: Vec<u8>,
        operator_data: Vec<u8>,
    },

    /// Non-partitioned redemption
    Redeemed {
        operator: Principal,
        from: Principal,
        value: Amount,
        data: Vec<u8>,
    },

    /// Partitioned redemption
    RedeemedByPartition {
        partition: Partition,
        operator: Principal,
        from: Principal,
        value: Amount,
        data: Vec<u8>,
        operator_data: Vec<u8>,
    },

    AuthorizedOperator {
        operator: Principal,
        token_holder: Principal,
    },

    RevokedOperator {
        operator: Principal,
        token_holder: Principal,
    },

    AuthorizedOperatorByPartition {
        partition: Partition,
        operator: Principal,
        token_holder: Principal,
    },

    RevokedOperatorByPartition {
        partition: Partition,
        operator: Principal,
        token_holder: Principal,
    },

    /// Forced transfer by the controller
    ControllerTransfer {
        controller: Principal,
        from: Principal,
        to: Principal,
        value: Amount,
        data: Vec<u8>,
        operator_data: Vec<u8>,
    },

    /// Forced redemption by the controller
    ControllerRedeem {
        controller: Principal,
        token_holder: Principal,
        value: Amount,
        data: Vec<u8>,
        operator_data: Vec<u8>,
    },

    /// Allowance set for a spender
    Approval {
        owner: Principal,
        spender: Principal,
        value: Amount,
    },

    /// Issuance permanently closed
    IssuanceFinalized { owner: Principal },

    /// Controller override permanently disabled
    ControllableFinalized { owner: Principal },
}

impl LedgerEvent {
    /// Short name of the event kind
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Issued { .. } => "Issued",
            LedgerEvent::IssuedByPartition { .. } => "IssuedByPartition",
            LedgerEvent::Transfer { .. } => "Transfer",
            LedgerEvent::TransferByPartition { .. } => "TransferByPartition",
            LedgerEvent::Redeemed { .. } => "Redeemed",
            LedgerEvent::RedeemedByPartition { .. } => "RedeemedByPartition",
            LedgerEvent::AuthorizedOperator { .. } => "AuthorizedOperator",
            LedgerEvent::RevokedOperator { .. } => "RevokedOperator",
            LedgerEvent::AuthorizedOperatorByPartition { .. } => "AuthorizedOperatorByPartition",
            LedgerEvent::RevokedOperatorByPartition { .. } => "RevokedOperatorByPartition",
            LedgerEvent::ControllerTransfer { .. } => "ControllerTransfer",
            LedgerEvent::ControllerRedeem { .. } => "ControllerRedeem",
            LedgerEvent::Approval { .. } => "Approval",
            LedgerEvent::IssuanceFinalized { .. } => "IssuanceFinalized",
            LedgerEvent::ControllableFinalized { .. } => "ControllableFinalized",
        }
    }

    /// All non-null principals named by this event
    pub fn principals(&self) -> Vec<Principal> {
        let named = match self {
            LedgerEvent::Issued { operator, to, .. }
            | LedgerEvent::IssuedByPartition { operator, to, .. } => vec![*operator, *to],
            LedgerEvent::Transfer {
                operator, from, to, ..
            }
            | LedgerEvent::TransferByPartition {
                operator, from, to, ..
            } => vec![*operator, *from, *to],
            LedgerEvent::Redeemed { operator, from, .. }
            | LedgerEvent::RedeemedByPartition { operator, from, .. } => vec![*operator, *from],
            LedgerEvent::AuthorizedOperator {
                operator,
                token_holder,
            }
            | LedgerEvent::RevokedOperator {
                operator,
                token_holder,
            }
            | LedgerEvent::AuthorizedOperatorByPartition {
                operator,
                token_holder,
                ..
            }
            | LedgerEvent::RevokedOperatorByPartition {
                operator,
                token_holder,
                ..
            } => vec![*operator, *token_holder],
            LedgerEvent::ControllerTransfer {
                controller, from, to, ..
            } => vec![*controller, *from, *to],
            LedgerEvent::ControllerRedeem {
                controller,
                token_holder,
                ..
            } => vec![*controller, *token_holder],
            LedgerEvent::Approval { owner, spender, .. } => vec![*owner, *spender],
            LedgerEvent::IssuanceFinalized { owner }
            | LedgerEvent::ControllableFinalized { owner } => vec![*owner],
        };

        let mut principals = Vec::with_capacity(named.len());
        for principal in named {
            if !principal.is_null() && !principals.contains(&principal) {
                principals.push(principal);
            }
        }
        principals
    }

    /// True if the event names `principal` in any role
    pub fn involves(&self, principal: &Principal) -> bool {
        self.principals().contains(principal)
    }
}
