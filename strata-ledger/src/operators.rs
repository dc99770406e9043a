use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use strata_core::id::Principal;
use strata_core::partition::Partition;

/// The permission tier under which a caller may move a holder's tokens
///
/// Controller access is not a capability; only the controller entry points
/// consult it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// The caller is the holder
    Holder,
    /// The caller is a global operator of the holder
    GlobalOperator,
    /// The caller is an operator of the holder for one partition
    PartitionOperator,
}

/// Operator relations granted by holders
///
/// Global and partition-scoped grants are stored separately and never affect
/// each other. A holder is always its own operator; that grant is implicit
/// and cannot be revoked.
#[derive(Debug, Clone, Default)]
pub struct OperatorAuthority {
    /// holder -> operators allowed on every partition
    global: HashMap<Principal, HashSet<Principal>>,

    /// (partition, holder) -> operators allowed on that partition only
    by_partition: HashMap<(Partition, Principal), HashSet<Principal>>,
}

impl OperatorAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `operator` is `holder` or one of its global operators
    pub fn is_operator(&self, operator: &Principal, holder: &Principal) -> bool {
        operator == holder
            || self
                .global
                .get(holder)
                .is_some_and(|operators| operators.contains(operator))
    }

    /// True iff `is_operator` holds or `operator` has a grant for `partition`
    pub fn is_operator_for_partition(
        &self,
        partition: &Partition,
        operator: &Principal,
        holder: &Principal,
    ) -> bool {
        self.is_operator(operator, holder)
            || self
                .by_partition
                .get(&(*partition, *holder))
                .is_some_and(|operators| operators.contains(operator))
    }

    /// Resolve the strongest tier `caller` holds over `holder` in `partition`
    pub fn capability(
        &self,
        caller: &Principal,
        holder: &Principal,
        partition: &Partition,
    ) -> Option<Capability> {
        if caller == holder {
            Some(Capability::Holder)
        } else if self.is_operator(caller, holder) {
            Some(Capability::GlobalOperator)
        } else if self.is_operator_for_partition(partition, caller, holder) {
            Some(Capability::PartitionOperator)
        } else {
            None
        }
    }

    /// Global operators granted by `holder` (the implicit self grant excluded)
    pub fn operators_of(&self, holder: &Principal) -> Vec<Principal> {
        let mut operators: Vec<Principal> = self
            .global
            .get(holder)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        operators.sort();
        operators
    }

    /// Operators granted by `holder` for `partition` only
    pub fn partition_operators_of(&self, partition: &Partition, holder: &Principal) -> Vec<Principal> {
        let mut operators: Vec<Principal> = self
            .by_partition
            .get(&(*partition, *holder))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        operators.sort();
        operators
    }

    pub(crate) fn authorize_operator(&mut self, holder: Principal, operator: Principal) -> bool {
        self.global.entry(holder).or_default().insert(operator)
    }

    pub(crate) fn revoke_operator(&mut self, holder: Principal, operator: Principal) -> bool {
        let Some(operators) = self.global.get_mut(&holder) else {
            return false;
        };
        let removed = operators.remove(&operator);
        if operators.is_empty() {
            self.global.remove(&holder);
        }
        removed
    }

    pub(crate) fn authorize_operator_by_partition(
        &mut self,
        partition: Partition,
        holder: Principal,
        operator: Principal,
    ) -> bool {
        self.by_partition
            .entry((partition, holder))
            .or_default()
            .insert(operator)
    }

    pub(crate) fn revoke_operator_by_partition(
        &mut self,
        partition: Partition,
        holder: Principal,
        operator: Principal,
    ) -> bool {
        let key = (partition, holder);
        let Some(operators) = self.by_partition.get_mut(&key) else {
            return false;
        };
        let removed = operators.remove(&operator);
        if operators.is_empty() {
            self.by_partition.remove(&key);
        }
        removed
    }
}
