use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ResolveError;

/// The available pack sizes, sorted ascending with duplicates collapsed.
///
/// Always non-empty and free of zeros, so `smallest()` is total.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackSizes(Vec<u32>);

impl PackSizes {
    pub fn new(sizes: impl IntoIterator<Item = u32>) -> Result<PackSizes, ResolveError> {
        let mut sizes: Vec<u32> = sizes.into_iter().collect();
        if sizes.is_empty() {
            return Err(ResolveError::NoPackSizes);
        }
        if sizes.contains(&0) {
            return Err(ResolveError::ZeroPackSize);
        }
        sizes.sort_unstable();
        sizes.dedup();
        Ok(PackSizes(sizes))
    }

    #[inline]
    pub fn smallest(&self) -> u32 {
        self.0[0]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One line of a plan: `quantity` packs of `size` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackCount {
    pub size: u32,
    pub quantity: u64,
}

/// The packs chosen to fulfil an order.
///
/// Immutable once assembled. Only sizes with a positive count are present and
/// iteration is in ascending size order, so two equal plans always render the
/// same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackPlan {
    counts: BTreeMap<u32, u64>,
    total_items: u64,
    total_packs: u64,
}

impl PackPlan {
    /// Assembles a plan from a size -> count map, dropping zero counts and
    /// deriving the totals.
    pub fn from_counts(counts: impl IntoIterator<Item = (u32, u64)>) -> PackPlan {
        let mut plan = PackPlan::default();
        for (size, count) in counts {
            if count == 0 {
                continue;
            }
            *plan.counts.entry(size).or_insert(0) += count;
            plan.total_items += size as u64 * count;
            plan.total_packs += count;
        }
        plan
    }

    pub(crate) fn single(size: u32) -> PackPlan {
        PackPlan::from_counts([(size, 1)])
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn total_packs(&self) -> u64 {
        self.total_packs
    }

    pub fn count_of(&self, size: u32) -> u64 {
        self.counts.get(&size).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PackCount> + '_ {
        self.counts
            .iter()
            .map(|(&size, &quantity)| PackCount { size, quantity })
    }

    pub fn packs(&self) -> Vec<PackCount> {
        self.iter().collect()
    }

    /// Items shipped beyond what was ordered.
    pub fn excess_over(&self, order_quantity: u32) -> u64 {
        self.total_items.saturating_sub(order_quantity as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_sizes_sorted_and_deduplicated() {
        let sizes = PackSizes::new([500, 250, 1000, 250]).unwrap();
        assert_eq!(&[250, 500, 1000], sizes.as_slice());
        assert_eq!(250, sizes.smallest());
        assert_eq!(3, sizes.len());
    }

    #[test]
    fn test_pack_sizes_preconditions() {
        assert_eq!(Err(ResolveError::NoPackSizes), PackSizes::new([]));
        assert_eq!(Err(ResolveError::ZeroPackSize), PackSizes::new([3, 0, 5]));
    }

    #[test]
    fn test_plan_assembly() {
        let plan = PackPlan::from_counts([(10, 2), (3, 1), (5, 1), (7, 0)]);
        assert_eq!(28, plan.total_items());
        assert_eq!(4, plan.total_packs());
        assert_eq!(0, plan.count_of(7));
        assert_eq!(
            vec![
                PackCount { size: 3, quantity: 1 },
                PackCount { size: 5, quantity: 1 },
                PackCount { size: 10, quantity: 2 },
            ],
            plan.packs()
        );
        assert_eq!(3, plan.excess_over(25));
        assert_eq!(0, plan.excess_over(30));
    }

    #[test]
    fn test_empty_plan() {
        let plan = PackPlan::from_counts([]);
        assert!(plan.is_empty());
        assert_eq!(0, plan.total_items());
        assert_eq!(0, plan.total_packs());
    }
}
