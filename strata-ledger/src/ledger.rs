use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strata_core::config::LedgerConfig;
use strata_core::error::{ConfigError, LedgerError};
use strata_core::events::LedgerEvent;
use strata_core::id::Principal;
use strata_core::partition::Partition;
use strata_core::status::TransferVerdict;
use strata_core::Amount;

use crate::authorization::TransferAuthorization;
use crate::balances::BalanceStore;
use crate::controller::ControllerState;
use crate::event_log::EventLog;
use crate::operators::{Capability, OperatorAuthority};
use crate::partitions::PartitionRegistry;

/// Snapshot of one holder's position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderAccount {
    /// The holder
    pub holder: Principal,

    /// Aggregate balance across partitions
    pub balance: Amount,

    /// Held partitions with their balances, in registry order
    pub partitions: Vec<(Partition, Amount)>,
}

/// The partitioned security-token ledger
///
/// Owns every piece of balance, operator and allowance state. Each public
/// operation names its caller explicitly and either applies completely or
/// returns an error with the state untouched. Successful mutations emit
/// exactly one event into the ledger's [`EventLog`].
#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) config: LedgerConfig,
    pub(crate) balances: BalanceStore,
    pub(crate) partitions: PartitionRegistry,
    pub(crate) operators: OperatorAuthority,
    /// (owner, spender) -> remaining allowance
    pub(crate) allowances: HashMap<(Principal, Principal), Amount>,
    pub(crate) controller: ControllerState,
    pub(crate) issuable: bool,
    pub(crate) events: EventLog,
}

impl Ledger {
    /// Create an empty ledger from a validated configuration
    pub fn new(config: LedgerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "Creating ledger {} ({}) owned by {}, controller {}",
            config.name,
            config.symbol,
            config.owner,
            config.controller
        );

        Ok(Self {
            controller: ControllerState::new(&config),
            config,
            balances: BalanceStore::new(),
            partitions: PartitionRegistry::new(),
            operators: OperatorAuthority::new(),
            allowances: HashMap::new(),
            issuable: true,
            events: EventLog::new(),
        })
    }

    // ---- Metadata ----

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.decimals
    }

    /// The issuing authority
    pub fn owner(&self) -> Principal {
        self.config.owner
    }

    /// Partition used by operations that name no partition
    pub fn default_partition(&self) -> Partition {
        self.config.default_partition
    }

    // ---- Balances ----

    pub fn total_supply(&self) -> Amount {
        self.balances.total_supply()
    }

    pub fn balance_of(&self, holder: &Principal) -> Amount {
        self.balances.balance_of(holder)
    }

    pub fn balance_of_by_partition(&self, partition: &Partition, holder: &Principal) -> Amount {
        self.balances.balance_of_by_partition(partition, holder)
    }

    /// Partitions `holder` currently holds; each appears exactly once
    pub fn partitions_of(&self, holder: &Principal) -> Vec<Partition> {
        self.partitions.partitions_of(holder)
    }

    /// Balances of `holder` broken down by partition
    pub fn account(&self, holder: &Principal) -> HolderAccount {
        let partitions = self
            .partitions_of(holder)
            .into_iter()
            .map(|partition| {
                let balance = self.balance_of_by_partition(&partition, holder);
                (partition, balance)
            })
            .collect();

        HolderAccount {
            holder: *holder,
            balance: self.balance_of(holder),
            partitions,
        }
    }

    // ---- Events ----

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drain the recorded events
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        self.events.take()
    }

    // ---- Operators ----

    pub fn is_operator(&self, operator: &Principal, holder: &Principal) -> bool {
        self.operators.is_operator(operator, holder)
    }

    pub fn is_operator_for_partition(
        &self,
        partition: &Partition,
        operator: &Principal,
        holder: &Principal,
    ) -> bool {
        self.operators
            .is_operator_for_partition(partition, operator, holder)
    }

    /// Read access to the operator relations
    pub fn operators(&self) -> &OperatorAuthority {
        &self.operators
    }

    /// Let `operator` move any of the caller's tokens
    pub fn authorize_operator(&mut self, caller: Principal, operator: Principal) {
        self.operators.authorize_operator(caller, operator);
        log::info!("{} authorized operator {}", caller, operator);
        self.events.emit(LedgerEvent::AuthorizedOperator {
            operator,
            token_holder: caller,
        });
    }

    /// Withdraw a global operator grant of the caller
    ///
    /// Partition-scoped grants to the same operator are unaffected.
    pub fn revoke_operator(&mut self, caller: Principal, operator: Principal) {
        self.operators.revoke_operator(caller, operator);
        log::info!("{} revoked operator {}", caller, operator);
        self.events.emit(LedgerEvent::RevokedOperator {
            operator,
            token_holder: caller,
        });
    }

    /// Let `operator` move the caller's tokens in `partition` only
    pub fn authorize_operator_by_partition(
        &mut self,
        caller: Principal,
        partition: Partition,
        operator: Principal,
    ) {
        self.operators
            .authorize_operator_by_partition(partition, caller, operator);
        log::info!(
            "{} authorized operator {} for partition {}",
            caller,
            operator,
            partition
        );
        self.events.emit(LedgerEvent::AuthorizedOperatorByPartition {
            partition,
            operator,
            token_holder: caller,
        });
    }

    /// Withdraw a partition-scoped operator grant of the caller
    pub fn revoke_operator_by_partition(
        &mut self,
        caller: Principal,
        partition: Partition,
        operator: Principal,
    ) {
        self.operators
            .revoke_operator_by_partition(partition, caller, operator);
        log::info!(
            "{} revoked operator {} for partition {}",
            caller,
            operator,
            partition
        );
        self.events.emit(LedgerEvent::RevokedOperatorByPartition {
            partition,
            operator,
            token_holder: caller,
        });
    }

    // ---- Partitioned operations ----

    /// Check whether `from` could transfer `amount` of `partition` to `to`
    ///
    /// Never mutates state. A `Success` verdict means the matching
    /// [`transfer_by_partition`](Self::transfer_by_partition) issued next by
    /// `from` with the same arguments succeeds, and any other verdict names
    /// the error it would fail with.
    pub fn can_transfer_by_partition(
        &self,
        from: &Principal,
        to: &Principal,
        partition: &Partition,
        amount: Amount,
        data: &[u8],
    ) -> TransferVerdict {
        self.authorization().evaluate(from, to, partition, amount, data)
    }

    /// Issue `amount` new tokens of `partition` to `to`
    ///
    /// # Errors
    /// * `NotAuthorized` - The caller is not the owner
    /// * `IssuanceClosed` - Issuance was finalized
    /// * `InvalidReceiver` - `to` is null
    /// * `PartitionNotExists` - `partition` is reserved
    /// * `ZeroAmount` - `amount` is zero
    /// * `AmountOverflow` - Total supply would overflow
    pub fn issue_by_partition(
        &mut self,
        caller: Principal,
        partition: Partition,
        to: Principal,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), LedgerError> {
        self.apply_issue(caller, partition, to, amount)
            .map_err(|err| rejected("issue_by_partition", err))?;

        self.events.emit(LedgerEvent::IssuedByPartition {
            partition,
            operator: caller,
            to,
            value: amount,
            data: data.to_vec(),
        });
        Ok(())
    }

    /// Transfer the caller's own tokens of `partition` to `to`
    ///
    /// # Returns
    /// The partition the tokens were credited to
    pub fn transfer_by_partition(
        &mut self,
        caller: Principal,
        partition: Partition,
        to: Principal,
        amount: Amount,
        data: &[u8],
    ) -> Result<Partition, LedgerError> {
        let destination = self
            .apply_transfer(partition, caller, to, amount, data)
            .map_err(|err| rejected("transfer_by_partition", err))?;

        self.events.emit(LedgerEvent::TransferByPartition {
            from_partition: partition,
            operator: Principal::NULL,
            from: caller,
            to,
            value: amount,
            data: data.to_vec(),
            operator_data: Vec::new(),
        });
        Ok(destination)
    }

    /// Transfer tokens of `from` as its operator
    ///
    /// The caller must be `from`, a global operator of `from`, or an operator
    /// of `from` for `partition`.
    pub fn operator_transfer_by_partition(
        &mut self,
        caller: Principal,
        partition: Partition,
        from: Principal,
        to: Principal,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<Partition, LedgerError> {
        let destination = self
            .require_operator(&caller, &from, &partition)
            .and_then(|_| self.apply_transfer(partition, from, to, amount, data))
            .map_err(|err| rejected("operator_transfer_by_partition", err))?;

        self.events.emit(LedgerEvent::TransferByPartition {
            from_partition: partition,
            operator: caller,
            from,
            to,
            value: amount,
            data: data.to_vec(),
            operator_data: operator_data.to_vec(),
        });
        Ok(destination)
    }

    /// Redeem the caller's own tokens of `partition`
    ///
    /// # Errors
    /// * `ZeroAmount` - `amount` is zero
    /// * `PartitionNotExists` - `partition` is reserved or not held
    /// * `InsufficientBalance` - `amount` exceeds the partition balance
    pub fn redeem_by_partition(
        &mut self,
        caller: Principal,
        partition: Partition,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), LedgerError> {
        self.apply_redeem(partition, caller, amount)
            .map_err(|err| rejected("redeem_by_partition", err))?;

        self.events.emit(LedgerEvent::RedeemedByPartition {
            partition,
            operator: Principal::NULL,
            from: caller,
            value: amount,
            data: data.to_vec(),
            operator_data: Vec::new(),
        });
        Ok(())
    }

    /// Redeem tokens of `from` as its operator
    pub fn operator_redeem_by_partition(
        &mut self,
        caller: Principal,
        partition: Partition,
        from: Principal,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<(), LedgerError> {
        let outcome = if from.is_null() {
            Err(LedgerError::InvalidSender)
        } else {
            self.require_operator(&caller, &from, &partition)
                .and_then(|_| self.apply_redeem(partition, from, amount))
        };
        outcome.map_err(|err| rejected("operator_redeem_by_partition", err))?;

        self.events.emit(LedgerEvent::RedeemedByPartition {
            partition,
            operator: caller,
            from,
            value: amount,
            data: data.to_vec(),
            operator_data: operator_data.to_vec(),
        });
        Ok(())
    }

    // ---- Shared mutation paths ----

    pub(crate) fn authorization(&self) -> TransferAuthorization<'_> {
        TransferAuthorization::new(&self.balances)
    }

    fn require_operator(
        &self,
        caller: &Principal,
        holder: &Principal,
        partition: &Partition,
    ) -> Result<Capability, LedgerError> {
        self.operators
            .capability(caller, holder, partition)
            .ok_or_else(|| {
                LedgerError::not_authorized(
                    caller,
                    &format!("operate {} tokens of {}", partition, holder),
                )
            })
    }

    /// Validate and mint a new issuance; emits nothing
    pub(crate) fn apply_issue(
        &mut self,
        caller: Principal,
        partition: Partition,
        to: Principal,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if caller != self.config.owner {
            return Err(LedgerError::not_authorized(&caller, "issue tokens"));
        }
        if !self.issuable {
            return Err(LedgerError::IssuanceClosed);
        }
        if to.is_null() {
            return Err(LedgerError::InvalidReceiver);
        }
        if partition.is_reserved() {
            return Err(LedgerError::PartitionNotExists(partition));
        }
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        self.balances.mint(partition, to, amount)?;
        self.partitions.ensure_present(partition, to);
        log::debug!("Issued {} of {} to {}", amount, partition, to);
        Ok(())
    }

    /// Authorize through the engine, then move the balance; emits nothing
    ///
    /// The engine verdict is the only gate, which is what keeps
    /// `can_transfer_by_partition` and the mutating calls in agreement.
    pub(crate) fn apply_transfer(
        &mut self,
        partition: Partition,
        from: Principal,
        to: Principal,
        amount: Amount,
        data: &[u8],
    ) -> Result<Partition, LedgerError> {
        let destination = self
            .authorization()
            .evaluate(&from, &to, &partition, amount, data)
            .into_result(partition)?;

        let remaining = self
            .balances
            .move_balance(partition, from, destination, to, amount)?;
        self.partitions.remove_if_zero(&partition, &from, remaining);
        if self.balances.has_row(&destination, &to) {
            self.partitions.ensure_present(destination, to);
        }

        log::debug!(
            "Moved {} of {} from {} to {}",
            amount,
            partition,
            from,
            to
        );
        Ok(destination)
    }

    /// Validate and burn a redemption; emits nothing
    pub(crate) fn apply_redeem(
        &mut self,
        partition: Partition,
        from: Principal,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if partition.is_reserved() || !self.balances.has_row(&partition, &from) {
            return Err(LedgerError::PartitionNotExists(partition));
        }

        let remaining = self.balances.burn(partition, from, amount)?;
        self.partitions.remove_if_zero(&partition, &from, remaining);
        log::debug!("Redeemed {} of {} from {}", amount, partition, from);
        Ok(())
    }
}

/// Log a rejected mutating call and hand the error back
pub(crate) fn rejected(action: &str, err: LedgerError) -> LedgerError {
    log::warn!("{} rejected: {}", action, err);
    err
}
