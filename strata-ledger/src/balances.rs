use std::collections::HashMap;

use strata_core::error::LedgerError;
use strata_core::id::Principal;
use strata_core::partition::Partition;
use strata_core::Amount;

/// Aggregate and per-partition balances plus total supply
///
/// A `(partition, holder)` row exists only while its balance is non-zero.
/// Every mutator validates all arithmetic before its first write, so an
/// error leaves the store untouched, and every write updates the row and the
/// holder's aggregate together.
#[derive(Debug, Clone, Default)]
pub struct BalanceStore {
    /// Balance per (partition, holder); zero rows are removed
    rows: HashMap<(Partition, Principal), Amount>,

    /// Sum of each holder's rows; zero aggregates are removed
    aggregates: HashMap<Principal, Amount>,

    /// Sum of all rows
    total_supply: Amount,
}

impl BalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate balance of `holder` across all partitions
    pub fn balance_of(&self, holder: &Principal) -> Amount {
        self.aggregates.get(holder).copied().unwrap_or_default()
    }

    /// Balance of `holder` in `partition`
    pub fn balance_of_by_partition(&self, partition: &Partition, holder: &Principal) -> Amount {
        self.rows
            .get(&(*partition, *holder))
            .copied()
            .unwrap_or_default()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Whether `holder` currently has a (non-zero) row in `partition`
    pub fn has_row(&self, partition: &Partition, holder: &Principal) -> bool {
        self.rows.contains_key(&(*partition, *holder))
    }

    /// All non-zero rows
    pub fn rows(&self) -> impl Iterator<Item = (&Partition, &Principal, &Amount)> {
        self.rows
            .iter()
            .map(|((partition, holder), amount)| (partition, holder, amount))
    }

    /// All holders with a non-zero aggregate
    pub fn aggregates(&self) -> impl Iterator<Item = (&Principal, &Amount)> {
        self.aggregates.iter()
    }

    /// Add `amount` to a row and the holder's aggregate
    ///
    /// A zero amount never creates a row.
    ///
    /// # Returns
    /// The new row balance, or `AmountOverflow` if either value would overflow
    pub(crate) fn credit(
        &mut self,
        partition: Partition,
        holder: Principal,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let row = self.balance_of_by_partition(&partition, &holder);
        if amount.is_zero() {
            return Ok(row);
        }

        let new_row = row.checked_add(amount).ok_or(LedgerError::AmountOverflow)?;
        let new_aggregate = self
            .balance_of(&holder)
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        self.rows.insert((partition, holder), new_row);
        self.aggregates.insert(holder, new_aggregate);
        Ok(new_row)
    }

    /// Subtract `amount` from a row and the holder's aggregate
    ///
    /// # Returns
    /// The remaining row balance, or `InsufficientBalance` if the row holds
    /// less than `amount`
    pub(crate) fn debit(
        &mut self,
        partition: Partition,
        holder: Principal,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let row = self.balance_of_by_partition(&partition, &holder);
        if amount > row {
            return Err(LedgerError::InsufficientBalance);
        }
        if amount.is_zero() {
            return Ok(row);
        }

        let remaining = row - amount;
        let aggregate = self
            .balance_of(&holder)
            .checked_sub(amount)
            .ok_or_else(|| {
                LedgerError::InvariantViolation(format!(
                    "aggregate of {} is below its {} row",
                    holder, partition
                ))
            })?;

        if remaining.is_zero() {
            self.rows.remove(&(partition, holder));
        } else {
            self.rows.insert((partition, holder), remaining);
        }
        if aggregate.is_zero() {
            self.aggregates.remove(&holder);
        } else {
            self.aggregates.insert(holder, aggregate);
        }
        Ok(remaining)
    }

    /// Credit new tokens and grow the total supply
    pub(crate) fn mint(
        &mut self,
        partition: Partition,
        holder: Principal,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        let row = self.credit(partition, holder, amount)?;
        self.total_supply = supply;
        Ok(row)
    }

    /// Debit tokens out of existence and shrink the total supply
    pub(crate) fn burn(
        &mut self,
        partition: Partition,
        holder: Principal,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        if amount > self.balance_of_by_partition(&partition, &holder) {
            return Err(LedgerError::InsufficientBalance);
        }
        let supply = self.total_supply.checked_sub(amount).ok_or_else(|| {
            LedgerError::InvariantViolation("redemption exceeds total supply".to_string())
        })?;
        let remaining = self.debit(partition, holder, amount)?;
        self.total_supply = supply;
        Ok(remaining)
    }

    /// Move `amount` from one row to another as a single step
    ///
    /// Both sides are validated before either is written. Moving within the
    /// same row is a balance check and nothing else.
    ///
    /// # Returns
    /// The remaining balance of the source row
    pub(crate) fn move_balance(
        &mut self,
        from_partition: Partition,
        from: Principal,
        to_partition: Partition,
        to: Principal,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let from_row = self.balance_of_by_partition(&from_partition, &from);
        if amount > from_row {
            return Err(LedgerError::InsufficientBalance);
        }
        if amount.is_zero() || (from_partition == to_partition && from == to) {
            return Ok(from_row);
        }

        // Rows are distinct here, so the destination row is read unaffected
        // by the debit. The aggregate only grows when the holder changes.
        self.balance_of_by_partition(&to_partition, &to)
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        if from != to {
            self.balance_of(&to)
                .checked_add(amount)
                .ok_or(LedgerError::AmountOverflow)?;
        }

        let remaining = self.debit(from_partition, from, amount)?;
        self.credit(to_partition, to, amount)?;
        Ok(remaining)
    }
}
