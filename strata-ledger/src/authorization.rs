//! Transfer authorization
//!
//! The decision procedure behind every transfer. It only reads the balance
//! store, so the predicates exposed to callers and the mutating paths run
//! exactly the same code and cannot disagree.

use strata_core::id::Principal;
use strata_core::partition::Partition;
use strata_core::status::{TransferStatus, TransferVerdict};
use strata_core::Amount;

use crate::balances::BalanceStore;

/// Side-effect-free transfer decision over a balance store
#[derive(Debug, Clone, Copy)]
pub struct TransferAuthorization<'a> {
    balances: &'a BalanceStore,
}

impl<'a> TransferAuthorization<'a> {
    pub fn new(balances: &'a BalanceStore) -> Self {
        Self { balances }
    }

    /// Decide whether `from` can move `amount` of `partition` to `to`
    ///
    /// Rules are checked in a fixed order and the first match wins:
    /// 1. `to` is null -> `InvalidReceiver`
    /// 2. `partition` is reserved or `from` holds no row in it -> `PartitionNotExists`
    /// 3. `amount` exceeds the row -> `InsufficientBalance`
    /// 4. otherwise `Success`, resolving to `partition`
    ///
    /// # Parameters
    /// * `data` - Off-ledger payload attached to the transfer; carried for
    ///   validators and not interpreted here
    pub fn evaluate(
        &self,
        from: &Principal,
        to: &Principal,
        partition: &Partition,
        amount: Amount,
        _data: &[u8],
    ) -> TransferVerdict {
        if to.is_null() {
            return TransferVerdict::failure(TransferStatus::InvalidReceiver);
        }
        if partition.is_reserved() || !self.balances.has_row(partition, from) {
            return TransferVerdict::failure(TransferStatus::PartitionNotExists);
        }
        if amount > self.balances.balance_of_by_partition(partition, from) {
            return TransferVerdict::failure(TransferStatus::InsufficientBalance);
        }
        TransferVerdict::success(*partition)
    }

    /// Decide a transfer made by a spender against an allowance
    ///
    /// Adds one rule ahead of [`evaluate`](Self::evaluate): an amount above
    /// `allowance` is `InsufficientAllowance`.
    pub fn evaluate_delegated(
        &self,
        from: &Principal,
        to: &Principal,
        partition: &Partition,
        amount: Amount,
        allowance: Amount,
        data: &[u8],
    ) -> TransferVerdict {
        if amount > allowance {
            return TransferVerdict::failure(TransferStatus::InsufficientAllowance);
        }
        self.evaluate(from, to, partition, amount, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debt() -> Partition {
        Partition::new("Debt").unwrap()
    }

    fn funded_store(holder: Principal, amount: u64) -> BalanceStore {
        let mut store = BalanceStore::new();
        store.mint(debt(), holder, Amount::from(amount)).unwrap();
        store
    }

    #[test]
    fn test_success_resolves_partition() {
        let from = Principal::from_label("from");
        let to = Principal::from_label("to");
        let store = funded_store(from, 10);
        let engine = TransferAuthorization::new(&store);

        let verdict = engine.evaluate(&from, &to, &debt(), Amount::from(10u64), &[]);
        assert!(verdict.is_success());
        assert_eq!(verdict.code(), 0x51);
        assert_eq!(verdict.partition, Some(debt()));
    }

    #[test]
    fn test_rule_order() {
        let from = Principal::from_label("from");
        let to = Principal::from_label("to");
        let store = funded_store(from, 10);
        let engine = TransferAuthorization::new(&store);
        let equity = Partition::new("Equity").unwrap();

        // Null receiver wins over a missing partition and a short balance
        let verdict = engine.evaluate(&from, &Principal::NULL, &equity, Amount::from(99u64), &[]);
        assert_eq!(verdict.status, TransferStatus::InvalidReceiver);
        assert_eq!(verdict.partition, None);

        // A missing partition wins over a short balance
        let verdict = engine.evaluate(&from, &to, &equity, Amount::from(99u64), &[]);
        assert_eq!(verdict.status, TransferStatus::PartitionNotExists);

        let verdict = engine.evaluate(&from, &to, &Partition::RESERVED, Amount::zero(), &[]);
        assert_eq!(verdict.status, TransferStatus::PartitionNotExists);

        let verdict = engine.evaluate(&from, &to, &debt(), Amount::from(11u64), &[]);
        assert_eq!(verdict.status, TransferStatus::InsufficientBalance);
        assert_eq!(verdict.reason(), "Insufficent balance");
    }

    #[test]
    fn test_delegated_checks_allowance_first() {
        let from = Principal::from_label("from");
        let to = Principal::from_label("to");
        let store = funded_store(from, 10);
        let engine = TransferAuthorization::new(&store);

        let verdict = engine.evaluate_delegated(
            &from,
            &Principal::NULL,
            &debt(),
            Amount::from(5u64),
            Amount::from(4u64),
            &[],
        );
        assert_eq!(verdict.status, TransferStatus::InsufficientAllowance);
        assert_eq!(verdict.code(), 0x53);

        let verdict = engine.evaluate_delegated(
            &from,
            &to,
            &debt(),
            Amount::from(5u64),
            Amount::from(5u64),
            &[],
        );
        assert!(verdict.is_success());
    }
}
