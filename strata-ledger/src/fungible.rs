//! Non-partitioned token surface
//!
//! Issue, transfer and redeem without naming a partition, plus allowances
//! for delegated spending. Every call here resolves to the ledger's default
//! partition and runs through the same mutation paths as the partitioned
//! operations.

use strata_core::error::LedgerError;
use strata_core::events::LedgerEvent;
use strata_core::id::Principal;
use strata_core::status::TransferVerdict;
use strata_core::Amount;

use crate::ledger::{rejected, Ledger};

impl Ledger {
    /// Whether new tokens can still be issued
    pub fn is_issuable(&self) -> bool {
        self.issuable
    }

    /// Permanently close issuance
    ///
    /// # Errors
    /// * `NotAuthorized` - The caller is not the owner
    /// * `AlreadyFinalized` - Issuance was already closed
    pub fn finalize_issuance(&mut self, caller: Principal) -> Result<(), LedgerError> {
        if caller != self.config.owner {
            return Err(rejected(
                "finalize_issuance",
                LedgerError::not_authorized(&caller, "finalize issuance"),
            ));
        }
        if !self.issuable {
            return Err(rejected(
                "finalize_issuance",
                LedgerError::AlreadyFinalized("issuance".to_string()),
            ));
        }

        self.issuable = false;
        log::info!("Issuance finalized by {}", caller);
        self.events
            .emit(LedgerEvent::IssuanceFinalized { owner: caller });
        Ok(())
    }

    /// Issue `amount` new tokens to `to` in the default partition
    pub fn issue(
        &mut self,
        caller: Principal,
        to: Principal,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), LedgerError> {
        let partition = self.config.default_partition;
        self.apply_issue(caller, partition, to, amount)
            .map_err(|err| rejected("issue", err))?;

        self.events.emit(LedgerEvent::Issued {
            operator: caller,
            to,
            value: amount,
            data: data.to_vec(),
        });
        Ok(())
    }

    /// Remaining amount `spender` may move on behalf of `owner`
    pub fn allowance(&self, owner: &Principal, spender: &Principal) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// Set the caller's allowance for `spender` to `value`
    ///
    /// Replaces any previous allowance; a zero value clears it.
    pub fn approve(
        &mut self,
        caller: Principal,
        spender: Principal,
        value: Amount,
    ) -> Result<(), LedgerError> {
        if spender.is_null() {
            return Err(rejected("approve", LedgerError::InvalidReceiver));
        }

        if value.is_zero() {
            self.allowances.remove(&(caller, spender));
        } else {
            self.allowances.insert((caller, spender), value);
        }
        log::debug!("{} approved {} for {}", caller, spender, value);
        self.events.emit(LedgerEvent::Approval {
            owner: caller,
            spender,
            value,
        });
        Ok(())
    }

    /// Check a transfer of the caller's default-partition tokens
    pub fn can_transfer(
        &self,
        caller: &Principal,
        to: &Principal,
        amount: Amount,
        data: &[u8],
    ) -> TransferVerdict {
        let partition = self.config.default_partition;
        self.authorization()
            .evaluate(caller, to, &partition, amount, data)
    }

    /// Transfer the caller's default-partition tokens to `to`
    pub fn transfer_with_data(
        &mut self,
        caller: Principal,
        to: Principal,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), LedgerError> {
        let partition = self.config.default_partition;
        self.apply_transfer(partition, caller, to, amount, data)
            .map_err(|err| rejected("transfer_with_data", err))?;

        self.events.emit(LedgerEvent::Transfer {
            operator: Principal::NULL,
            from: caller,
            to,
            value: amount,
            data: data.to_vec(),
        });
        Ok(())
    }

    /// Check a transfer the caller would make against its allowance from `from`
    pub fn can_transfer_from(
        &self,
        caller: &Principal,
        from: &Principal,
        to: &Principal,
        amount: Amount,
        data: &[u8],
    ) -> TransferVerdict {
        let partition = self.config.default_partition;
        let allowance = self.allowance(from, caller);
        self.authorization()
            .evaluate_delegated(from, to, &partition, amount, allowance, data)
    }

    /// Transfer tokens of `from` to `to`, spending the caller's allowance
    pub fn transfer_from_with_data(
        &mut self,
        caller: Principal,
        from: Principal,
        to: Principal,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), LedgerError> {
        let partition = self.config.default_partition;
        let allowance = self.allowance(&from, &caller);

        self.can_transfer_from(&caller, &from, &to, amount, data)
            .into_result(partition)
            .and_then(|_| self.apply_transfer(partition, from, to, amount, data))
            .map_err(|err| rejected("transfer_from_with_data", err))?;
        self.spend_allowance(from, caller, allowance - amount);

        self.events.emit(LedgerEvent::Transfer {
            operator: caller,
            from,
            to,
            value: amount,
            data: data.to_vec(),
        });
        Ok(())
    }

    /// Redeem the caller's default-partition tokens
    pub fn redeem(
        &mut self,
        caller: Principal,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), LedgerError> {
        let partition = self.config.default_partition;
        self.apply_redeem(partition, caller, amount)
            .map_err(|err| rejected("redeem", err))?;

        self.events.emit(LedgerEvent::Redeemed {
            operator: Principal::NULL,
            from: caller,
            value: amount,
            data: data.to_vec(),
        });
        Ok(())
    }

    /// Redeem default-partition tokens of `from`, spending the caller's allowance
    ///
    /// # Errors
    /// * `InvalidSender` - `from` is null
    /// * `InsufficientAllowance` - The allowance is smaller than `amount`
    /// * Any error of [`redeem`](Self::redeem)
    pub fn redeem_from(
        &mut self,
        caller: Principal,
        from: Principal,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), LedgerError> {
        let partition = self.config.default_partition;
        let allowance = self.allowance(&from, &caller);

        let outcome = if from.is_null() {
            Err(LedgerError::InvalidSender)
        } else if amount > allowance {
            Err(LedgerError::InsufficientAllowance)
        } else {
            self.apply_redeem(partition, from, amount)
        };
        outcome.map_err(|err| rejected("redeem_from", err))?;
        self.spend_allowance(from, caller, allowance - amount);

        self.events.emit(LedgerEvent::Redeemed {
            operator: caller,
            from,
            value: amount,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn spend_allowance(&mut self, owner: Principal, spender: Principal, remaining: Amount) {
        if remaining.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), remaining);
        }
    }
}
