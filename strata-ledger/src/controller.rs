use serde::{Deserialize, Serialize};
use strata_core::config::LedgerConfig;
use strata_core::error::LedgerError;
use strata_core::events::LedgerEvent;
use strata_core::id::Principal;
use strata_core::partition::Partition;
use strata_core::Amount;

use crate::ledger::{rejected, Ledger};

/// Authority of the designated controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    /// The controller; null when the ledger was created without one
    pub controller: Principal,

    /// Whether the controller may still force transfers and redemptions
    pub controllable: bool,
}

impl ControllerState {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            controller: config.controller,
            controllable: config.has_controller(),
        }
    }

    /// True iff `caller` may use the controller entry points right now
    ///
    /// A null controller starts out non-controllable, so it never matches.
    pub fn permits(&self, caller: &Principal) -> bool {
        self.controllable && *caller == self.controller
    }
}

impl Ledger {
    pub fn controller(&self) -> Principal {
        self.controller.controller
    }

    pub fn is_controllable(&self) -> bool {
        self.controller.controllable
    }

    /// Force a transfer of `amount` of `from`'s tokens to `to`
    ///
    /// Skips operator checks. The amount is drawn from the default partition
    /// first, then from the holder's other partitions in registry order, and
    /// each slice lands in the same partition of `to`.
    ///
    /// # Errors
    /// * `NotAuthorized` - The caller is not the controller or control was finalized
    /// * `InvalidReceiver` - `to` is null
    /// * `InsufficientBalance` - `amount` exceeds `from`'s total balance
    /// * `AmountOverflow` - A balance of `to` would overflow
    pub fn controller_transfer(
        &mut self,
        caller: Principal,
        from: Principal,
        to: Principal,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<(), LedgerError> {
        self.require_controller(&caller, "force a transfer")
            .and_then(|_| self.apply_controller_transfer(from, to, amount))
            .map_err(|err| rejected("controller_transfer", err))?;

        log::info!(
            "Controller {} moved {} from {} to {}",
            caller,
            amount,
            from,
            to
        );
        self.events.emit(LedgerEvent::ControllerTransfer {
            controller: caller,
            from,
            to,
            value: amount,
            data: data.to_vec(),
            operator_data: operator_data.to_vec(),
        });
        Ok(())
    }

    /// Force a redemption of `amount` of `token_holder`'s tokens
    ///
    /// Partitions are drained in the same order as
    /// [`controller_transfer`](Self::controller_transfer).
    ///
    /// # Errors
    /// * `NotAuthorized` - The caller is not the controller or control was finalized
    /// * `InvalidSender` - `token_holder` is null
    /// * `ZeroAmount` - `amount` is zero
    /// * `InsufficientBalance` - `amount` exceeds the holder's total balance
    pub fn controller_redeem(
        &mut self,
        caller: Principal,
        token_holder: Principal,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<(), LedgerError> {
        self.require_controller(&caller, "force a redemption")
            .and_then(|_| self.apply_controller_redeem(token_holder, amount))
            .map_err(|err| rejected("controller_redeem", err))?;

        log::info!(
            "Controller {} redeemed {} from {}",
            caller,
            amount,
            token_holder
        );
        self.events.emit(LedgerEvent::ControllerRedeem {
            controller: caller,
            token_holder,
            value: amount,
            data: data.to_vec(),
            operator_data: operator_data.to_vec(),
        });
        Ok(())
    }

    /// Permanently remove the controller's powers
    ///
    /// # Errors
    /// * `NotAuthorized` - The caller is not the owner
    /// * `AlreadyFinalized` - Control was already finalized
    pub fn finalize_controllable(&mut self, caller: Principal) -> Result<(), LedgerError> {
        if caller != self.config.owner {
            return Err(rejected(
                "finalize_controllable",
                LedgerError::not_authorized(&caller, "finalize the controller"),
            ));
        }
        if !self.controller.controllable {
            return Err(rejected(
                "finalize_controllable",
                LedgerError::AlreadyFinalized("controllable".to_string()),
            ));
        }

        self.controller.controllable = false;
        log::info!("Controller {} finalized by {}", self.controller.controller, caller);
        self.events
            .emit(LedgerEvent::ControllableFinalized { owner: caller });
        Ok(())
    }

    fn require_controller(&self, caller: &Principal, action: &str) -> Result<(), LedgerError> {
        if self.controller.permits(caller) {
            Ok(())
        } else {
            Err(LedgerError::not_authorized(caller, action))
        }
    }

    /// Split `amount` of `holder`'s tokens into per-partition slices
    ///
    /// The default partition comes first, then the remaining partitions in
    /// registry order. Every slice is non-zero.
    fn controller_slices(
        &self,
        holder: &Principal,
        amount: Amount,
    ) -> Result<Vec<(Partition, Amount)>, LedgerError> {
        if amount > self.balances.balance_of(holder) {
            return Err(LedgerError::InsufficientBalance);
        }

        let default = self.config.default_partition;
        let mut order = vec![default];
        order.extend(
            self.partitions
                .partitions_of(holder)
                .into_iter()
                .filter(|partition| *partition != default),
        );

        let mut remaining = amount;
        let mut slices = Vec::new();
        for partition in order {
            if remaining.is_zero() {
                break;
            }
            let held = self.balances.balance_of_by_partition(&partition, holder);
            if held.is_zero() {
                continue;
            }
            let slice = held.min(remaining);
            slices.push((partition, slice));
            remaining -= slice;
        }

        if !remaining.is_zero() {
            return Err(LedgerError::InvariantViolation(format!(
                "partitions of {} do not cover its balance",
                holder
            )));
        }
        Ok(slices)
    }

    /// Validate and move a forced transfer; emits nothing
    fn apply_controller_transfer(
        &mut self,
        from: Principal,
        to: Principal,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if to.is_null() {
            return Err(LedgerError::InvalidReceiver);
        }
        let slices = self.controller_slices(&from, amount)?;
        if from == to {
            return Ok(());
        }

        self.balances
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        for (partition, slice) in &slices {
            self.balances
                .balance_of_by_partition(partition, &to)
                .checked_add(*slice)
                .ok_or(LedgerError::AmountOverflow)?;
        }

        for (partition, slice) in slices {
            let remaining = self
                .balances
                .move_balance(partition, from, partition, to, slice)?;
            self.partitions.remove_if_zero(&partition, &from, remaining);
            self.partitions.ensure_present(partition, to);
            log::debug!("Forced {} of {} from {} to {}", slice, partition, from, to);
        }
        Ok(())
    }

    /// Validate and burn a forced redemption; emits nothing
    fn apply_controller_redeem(
        &mut self,
        token_holder: Principal,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if token_holder.is_null() {
            return Err(LedgerError::InvalidSender);
        }
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let slices = self.controller_slices(&token_holder, amount)?;
        if amount > self.balances.total_supply() {
            return Err(LedgerError::InvariantViolation(
                "redemption exceeds total supply".to_string(),
            ));
        }

        for (partition, slice) in slices {
            let remaining = self.balances.burn(partition, token_holder, slice)?;
            self.partitions
                .remove_if_zero(&partition, &token_holder, remaining);
            log::debug!("Forced redemption of {} of {} from {}", slice, partition, token_holder);
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use strata_core::config::LedgerConfig;

    use super::*;

    fn tokens(value: u64) -> Amount {
        Amount::from(value) * Amount::exp10(18)
    }

    struct Fixture {
        ledger: Ledger,
        owner: Principal,
        controller: Principal,
        holder1: Principal,
        holder2: Principal,
    }

    fn fixture(with_controller: bool) -> Fixture {
        let owner = Principal::from_label("token-owner");
        let controller = Principal::from_label("controller");
        let configured = if with_controller { controller } else { Principal::NULL };

        let mut ledger = Ledger::new(LedgerConfig::new(owner, configured)).unwrap();
        let holder1 = Principal::from_label("token-holder-1");
        ledger.issue(owner, holder1, tokens(500), &[]).unwrap();

        Fixture {
            ledger,
            owner,
            controller,
            holder1,
            holder2: Principal::from_label("token-holder-2"),
        }
    }

    #[test]
    fn test_construction() {
        let owner = Principal::from_label("token-owner");
        assert!(Ledger::new(LedgerConfig::new(owner, owner)).is_err());

        let controlled = fixture(true);
        assert_eq!(controlled.ledger.controller(), controlled.controller);
        assert!(controlled.ledger.is_controllable());

        let uncontrolled = fixture(false);
        assert_eq!(uncontrolled.ledger.controller(), Principal::NULL);
        assert!(!uncontrolled.ledger.is_controllable());
    }

    #[test]
    fn test_controller_transfer() {
        let Fixture {
            mut ledger,
            controller,
            holder1,
            holder2,
            ..
        } = fixture(true);

        assert!(matches!(
            ledger.controller_transfer(holder2, holder1, holder2, tokens(200), &[], b"Stolen tokens"),
            Err(LedgerError::NotAuthorized(_))
        ));
        assert_eq!(
            ledger.controller_transfer(controller, holder1, holder2, tokens(600), &[], b"Stolen tokens"),
            Err(LedgerError::InsufficientBalance)
        );
        assert_eq!(
            ledger.controller_transfer(controller, holder1, Principal::NULL, tokens(200), &[], b"Stolen tokens"),
            Err(LedgerError::InvalidReceiver)
        );

        ledger
            .controller_transfer(controller, holder1, holder2, tokens(200), &[], b"Stolen tokens")
            .unwrap();
        match ledger.events().last() {
            Some(LedgerEvent::ControllerTransfer {
                controller: emitted,
                from,
                to,
                value,
                operator_data,
                ..
            }) => {
                assert_eq!(*emitted, controller);
                assert_eq!(*from, holder1);
                assert_eq!(*to, holder2);
                assert_eq!(*value, tokens(200));
                assert_eq!(operator_data, b"Stolen tokens");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(ledger.balance_of(&holder1), tokens(300));
        assert_eq!(ledger.balance_of(&holder2), tokens(200));
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_null_controller_cannot_act() {
        let Fixture {
            mut ledger,
            holder1,
            holder2,
            ..
        } = fixture(false);

        assert!(matches!(
            ledger.controller_transfer(Principal::NULL, holder1, holder2, tokens(1), &[], &[]),
            Err(LedgerError::NotAuthorized(_))
        ));
        assert!(matches!(
            ledger.controller_redeem(Principal::NULL, holder1, tokens(1), &[], &[]),
            Err(LedgerError::NotAuthorized(_))
        ));
        assert_eq!(ledger.balance_of(&holder1), tokens(500));
    }

    #[test]
    fn test_controller_redeem() {
        let Fixture {
            mut ledger,
            controller,
            holder1,
            ..
        } = fixture(true);

        assert!(matches!(
            ledger.controller_redeem(holder1, holder1, tokens(100), &[], &[]),
            Err(LedgerError::NotAuthorized(_))
        ));
        assert_eq!(
            ledger.controller_redeem(controller, holder1, tokens(501), &[], &[]),
            Err(LedgerError::InsufficientBalance)
        );
        assert_eq!(
            ledger.controller_redeem(controller, Principal::NULL, tokens(100), &[], &[]),
            Err(LedgerError::InvalidSender)
        );

        ledger
            .controller_redeem(controller, holder1, tokens(100), &[], b"Incorrect receiver of tokens")
            .unwrap();
        match ledger.events().last() {
            Some(LedgerEvent::ControllerRedeem {
                token_holder,
                value,
                operator_data,
                ..
            }) => {
                assert_eq!(*token_holder, holder1);
                assert_eq!(*value, tokens(100));
                assert_eq!(operator_data, b"Incorrect receiver of tokens");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(ledger.balance_of(&holder1), tokens(400));
        assert_eq!(ledger.total_supply(), tokens(400));
    }

    #[test]
    fn test_finalize_controllable() {
        let Fixture {
            mut ledger,
            owner,
            controller,
            holder1,
            holder2,
        } = fixture(true);

        assert!(matches!(
            ledger.finalize_controllable(controller),
            Err(LedgerError::NotAuthorized(_))
        ));
        ledger.finalize_controllable(owner).unwrap();
        assert!(!ledger.is_controllable());
        assert_eq!(ledger.controller(), controller);

        assert!(matches!(
            ledger.controller_transfer(controller, holder1, holder2, tokens(1), &[], &[]),
            Err(LedgerError::NotAuthorized(_))
        ));
        assert!(matches!(
            ledger.controller_redeem(controller, holder1, tokens(1), &[], &[]),
            Err(LedgerError::NotAuthorized(_))
        ));
        assert!(matches!(
            ledger.finalize_controllable(owner),
            Err(LedgerError::AlreadyFinalized(_))
        ));
    }

    #[test]
    fn test_permits_only_live_controller() {
        let owner = Principal::from_label("token-owner");
        let controller = Principal::from_label("controller");

        let state = ControllerState::new(&LedgerConfig::new(owner, controller));
        assert!(state.controllable);
        assert!(state.permits(&controller));
        assert!(!state.permits(&owner));

        let state = ControllerState::new(&LedgerConfig::new(owner, Principal::NULL));
        assert!(!state.controllable);
        assert!(!state.permits(&Principal::NULL));
    }

    #[test]
    fn test_controller_acts_on_named_partition() {
        let owner = Principal::from_label("token-owner");
        let controller = Principal::from_label("controller");
        let a = Principal::from_label("token-holder-1");
        let b = Principal::from_label("token-holder-2");
        let debt = Partition::new("Debt").unwrap();

        let mut ledger = Ledger::new(LedgerConfig::new(owner, controller)).unwrap();
        ledger
            .issue_by_partition(owner, debt, a, Amount::from(10u64), &[])
            .unwrap();

        ledger
            .controller_transfer(controller, a, b, Amount::from(5u64), &[], &[])
            .unwrap();
        assert_eq!(ledger.balance_of_by_partition(&debt, &a), Amount::from(5u64));
        assert_eq!(ledger.balance_of_by_partition(&debt, &b), Amount::from(5u64));
        assert_eq!(ledger.partitions_of(&b), vec![debt]);
        assert!(ledger.check_invariants().is_ok());

        ledger
            .controller_redeem(controller, a, Amount::from(5u64), &[], &[])
            .unwrap();
        assert_eq!(ledger.balance_of(&a), Amount::zero());
        assert!(ledger.partitions_of(&a).is_empty());
        assert_eq!(ledger.total_supply(), Amount::from(5u64));
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_controller_drains_partitions_in_order() {
        let owner = Principal::from_label("token-owner");
        let controller = Principal::from_label("controller");
        let a = Principal::from_label("token-holder-1");
        let b = Principal::from_label("token-holder-2");
        let debt = Partition::new("Debt").unwrap();
        let equity = Partition::new("Equity").unwrap();

        let mut ledger = Ledger::new(LedgerConfig::new(owner, controller)).unwrap();
        let default = ledger.default_partition();
        ledger
            .issue_by_partition(owner, debt, a, Amount::from(4u64), &[])
            .unwrap();
        ledger
            .issue_by_partition(owner, equity, a, Amount::from(6u64), &[])
            .unwrap();
        ledger.issue(owner, a, Amount::from(3u64), &[]).unwrap();
        let events_before = ledger.events().len();

        // Default first, then Debt, then part of Equity
        ledger
            .controller_transfer(controller, a, b, Amount::from(9u64), &[], &[])
            .unwrap();
        assert_eq!(ledger.events().len(), events_before + 1);
        assert_eq!(ledger.balance_of_by_partition(&default, &b), Amount::from(3u64));
        assert_eq!(ledger.balance_of_by_partition(&debt, &b), Amount::from(4u64));
        assert_eq!(ledger.balance_of_by_partition(&equity, &b), Amount::from(2u64));
        assert_eq!(ledger.partitions_of(&a), vec![equity]);
        assert_eq!(ledger.balance_of(&a), Amount::from(4u64));
        assert!(ledger.check_invariants().is_ok());

        ledger
            .controller_redeem(controller, b, Amount::from(8u64), &[], &[])
            .unwrap();
        assert_eq!(ledger.balance_of(&b), Amount::from(1u64));
        assert_eq!(ledger.partitions_of(&b), vec![equity]);
        assert_eq!(ledger.total_supply(), Amount::from(5u64));
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_failed_controller_calls_change_nothing() {
        let owner = Principal::from_label("token-owner");
        let controller = Principal::from_label("controller");
        let a = Principal::from_label("token-holder-1");
        let b = Principal::from_label("token-holder-2");
        let debt = Partition::new("Debt").unwrap();
        let equity = Partition::new("Equity").unwrap();

        let mut ledger = Ledger::new(LedgerConfig::new(owner, controller)).unwrap();
        ledger
            .issue_by_partition(owner, debt, a, Amount::from(4u64), &[])
            .unwrap();
        ledger
            .issue_by_partition(owner, equity, a, Amount::from(6u64), &[])
            .unwrap();
        let events_before = ledger.events().len();

        assert_eq!(
            ledger.controller_transfer(controller, a, b, Amount::from(11u64), &[], &[]),
            Err(LedgerError::InsufficientBalance)
        );
        assert_eq!(
            ledger.controller_redeem(controller, a, Amount::from(11u64), &[], &[]),
            Err(LedgerError::InsufficientBalance)
        );
        assert_eq!(
            ledger.controller_redeem(controller, a, Amount::zero(), &[], &[]),
            Err(LedgerError::ZeroAmount)
        );

        assert_eq!(
            ledger.controller_transfer(controller, a, Principal::NULL, Amount::from(5u64), &[], &[]),
            Err(LedgerError::InvalidReceiver)
        );
        assert!(matches!(
            ledger.controller_transfer(b, a, b, Amount::from(5u64), &[], &[]),
            Err(LedgerError::NotAuthorized(_))
        ));

        assert_eq!(ledger.balance_of_by_partition(&debt, &a), Amount::from(4u64));
        assert_eq!(ledger.balance_of_by_partition(&equity, &a), Amount::from(6u64));
        assert_eq!(ledger.partitions_of(&a), vec![debt, equity]);
        assert_eq!(ledger.balance_of(&a), Amount::from(10u64));
        assert!(ledger.partitions_of(&b).is_empty());
        assert_eq!(ledger.total_supply(), Amount::from(10u64));
        assert_eq!(ledger.events().len(), events_before);
        assert!(ledger.check_invariants().is_ok());
    }
}
