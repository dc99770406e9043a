//! # Ledger Invariants
//!
//! Relations between the balance store and the partition registry that hold
//! after every operation, successful or not:
//! - Aggregate: a holder's balance equals the sum of its partition rows
//! - Supply: the total supply equals the sum of all aggregate balances
//! - Registry: a partition is listed for a holder iff its row is non-zero

use std::collections::{HashMap, HashSet};

use strata_core::error::LedgerError;
use strata_core::id::Principal;
use strata_core::Amount;

use crate::balances::BalanceStore;
use crate::ledger::Ledger;
use crate::partitions::PartitionRegistry;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Aggregate balance
///
/// `balance_of(h)` equals the sum of `balance_of_by_partition(p, h)` over
/// every partition, for every holder with a row or an aggregate.
#[must_use]
pub fn check_aggregate_invariant(balances: &BalanceStore) -> bool {
    first_aggregate_mismatch(balances).is_none()
}

/// Total supply
///
/// `total_supply()` equals the sum of all aggregate balances.
#[must_use]
pub fn check_supply_invariant(balances: &BalanceStore) -> bool {
    sum(balances.aggregates().map(|(_, amount)| *amount)) == Some(balances.total_supply())
}

/// Registry membership
///
/// `partitions_of(h)` lists `p` iff `balance_of_by_partition(p, h) > 0`.
#[must_use]
pub fn check_registry_invariant(balances: &BalanceStore, partitions: &PartitionRegistry) -> bool {
    first_registry_mismatch(balances, partitions).is_none()
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

fn sum(amounts: impl Iterator<Item = Amount>) -> Option<Amount> {
    amounts.fold(Some(Amount::zero()), |acc, amount| acc?.checked_add(amount))
}

fn first_aggregate_mismatch(balances: &BalanceStore) -> Option<Principal> {
    let mut row_sums: HashMap<Principal, Option<Amount>> = HashMap::new();
    for (_, holder, amount) in balances.rows() {
        let entry = row_sums.entry(*holder).or_insert(Some(Amount::zero()));
        *entry = entry.and_then(|total| total.checked_add(*amount));
    }

    let holders: HashSet<Principal> = row_sums
        .keys()
        .copied()
        .chain(balances.aggregates().map(|(holder, _)| *holder))
        .collect();

    holders.into_iter().find(|holder| {
        let rows = row_sums.get(holder).copied().unwrap_or(Some(Amount::zero()));
        rows != Some(balances.balance_of(holder))
    })
}

fn first_registry_mismatch(
    balances: &BalanceStore,
    partitions: &PartitionRegistry,
) -> Option<String> {
    for (partition, holder, amount) in balances.rows() {
        if !amount.is_zero() && !partitions.contains(partition, holder) {
            return Some(format!("{} holds {} but it is not listed", holder, partition));
        }
    }

    for holder in partitions.holders() {
        for partition in partitions.partitions_of(holder) {
            if balances.balance_of_by_partition(&partition, holder).is_zero() {
                return Some(format!("{} lists {} with a zero balance", holder, partition));
            }
        }
    }
    None
}

impl Ledger {
    /// Verify every ledger invariant
    ///
    /// # Returns
    /// `InvariantViolation` naming the first broken invariant
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        if let Some(holder) = first_aggregate_mismatch(&self.balances) {
            return Err(LedgerError::InvariantViolation(format!(
                "aggregate balance of {} differs from its partition sum",
                holder
            )));
        }
        if !check_supply_invariant(&self.balances) {
            return Err(LedgerError::InvariantViolation(
                "total supply differs from the sum of balances".to_string(),
            ));
        }
        if let Some(detail) = first_registry_mismatch(&self.balances, &self.partitions) {
            return Err(LedgerError::InvariantViolation(format!(
                "partition registry: {}",
                detail
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::partition::Partition;

    fn debt() -> Partition {
        Partition::new("Debt").unwrap()
    }

    #[test]
    fn test_consistent_state_passes() {
        let mut balances = BalanceStore::new();
        let mut partitions = PartitionRegistry::new();
        let holder = Principal::from_label("holder");

        balances.mint(debt(), holder, Amount::from(10u64)).unwrap();
        partitions.ensure_present(debt(), holder);

        assert!(check_aggregate_invariant(&balances));
        assert!(check_supply_invariant(&balances));
        assert!(check_registry_invariant(&balances, &partitions));
    }

    #[test]
    fn test_unlisted_row_is_detected() {
        let mut balances = BalanceStore::new();
        let partitions = PartitionRegistry::new();
        let holder = Principal::from_label("holder");

        balances.mint(debt(), holder, Amount::from(10u64)).unwrap();
        assert!(!check_registry_invariant(&balances, &partitions));
    }

    #[test]
    fn test_stale_listing_is_detected() {
        let balances = BalanceStore::new();
        let mut partitions = PartitionRegistry::new();
        partitions.ensure_present(debt(), Principal::from_label("holder"));

        assert!(!check_registry_invariant(&balances, &partitions));
    }

    #[test]
    fn test_credit_without_mint_breaks_supply() {
        let mut balances = BalanceStore::new();
        balances
            .credit(debt(), Principal::from_label("holder"), Amount::from(5u64))
            .unwrap();

        assert!(check_aggregate_invariant(&balances));
        assert!(!check_supply_invariant(&balances));
    }

    #[test]
    fn test_ledger_reports_violation() {
        let owner = Principal::from_label("owner");
        let holder = Principal::from_label("holder");
        let config = strata_core::config::LedgerConfig::new(owner, Principal::NULL);
        let mut ledger = Ledger::new(config).unwrap();

        ledger
            .issue_by_partition(owner, debt(), holder, Amount::from(10u64), &[])
            .unwrap();
        assert!(ledger.check_invariants().is_ok());

        ledger
            .balances
            .credit(debt(), holder, Amount::from(1u64))
            .unwrap();
        assert!(matches!(
            ledger.check_invariants(),
            Err(LedgerError::InvariantViolation(_))
        ));
    }
}
