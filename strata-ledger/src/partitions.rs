use std::collections::HashMap;

use strata_core::id::Principal;
use strata_core::partition::Partition;
use strata_core::Amount;

/// Partitions held by a single holder
///
/// `order` is the externally visible sequence; `index` maps each partition to
/// its slot in `order` so removal is a swap-and-pop instead of a scan.
#[derive(Debug, Clone, Default)]
struct HolderPartitions {
    order: Vec<Partition>,
    index: HashMap<Partition, usize>,
}

impl HolderPartitions {
    fn insert(&mut self, partition: Partition) -> bool {
        if self.index.contains_key(&partition) {
            return false;
        }
        self.index.insert(partition, self.order.len());
        self.order.push(partition);
        true
    }

    fn remove(&mut self, partition: &Partition) -> bool {
        let Some(slot) = self.index.remove(partition) else {
            return false;
        };

        self.order.swap_remove(slot);

        // The former last element now occupies `slot`
        if let Some(moved) = self.order.get(slot) {
            self.index.insert(*moved, slot);
        }
        true
    }
}

/// Tracks, per holder, the ordered set of partitions currently held
///
/// Each held partition appears exactly once. Order is insertion order up to
/// removals, which move the last entry into the vacated slot.
#[derive(Debug, Clone, Default)]
pub struct PartitionRegistry {
    holders: HashMap<Principal, HolderPartitions>,
}

impl PartitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partitions held by `holder`, empty if none
    pub fn partitions_of(&self, holder: &Principal) -> Vec<Partition> {
        self.holders
            .get(holder)
            .map(|entry| entry.order.clone())
            .unwrap_or_default()
    }

    /// Whether `holder` currently lists `partition`
    pub fn contains(&self, partition: &Partition, holder: &Principal) -> bool {
        self.holders
            .get(holder)
            .is_some_and(|entry| entry.index.contains_key(partition))
    }

    /// Holders with at least one listed partition
    pub fn holders(&self) -> impl Iterator<Item = &Principal> {
        self.holders.keys()
    }

    /// Append `partition` to the holder's sequence if it is not listed yet
    ///
    /// # Returns
    /// True if the partition was appended
    pub(crate) fn ensure_present(&mut self, partition: Partition, holder: Principal) -> bool {
        self.holders.entry(holder).or_default().insert(partition)
    }

    /// Drop `partition` from the holder's sequence once its balance is zero
    ///
    /// # Parameters
    /// * `remaining` - The holder's balance in `partition` after the debit
    ///
    /// # Returns
    /// True if the partition was removed
    pub(crate) fn remove_if_zero(
        &mut self,
        partition: &Partition,
        holder: &Principal,
        remaining: Amount,
    ) -> bool {
        if !remaining.is_zero() {
            return false;
        }

        let Some(entry) = self.holders.get_mut(holder) else {
            return false;
        };
        let removed = entry.remove(partition);
        if entry.order.is_empty() {
            self.holders.remove(holder);
        }
        removed
    }
}
