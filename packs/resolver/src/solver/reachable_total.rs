use crate::error::{InvariantViolation, ResolveError};
use crate::plan::PackSizes;

// Finds the smallest total >= order that some combination of packs adds up to.
//
// Every total in order..order+smallest is within one smallest pack of the
// order, and ceil(order / smallest) smallest packs land in that window, so the
// table never needs to extend past `order + smallest - 1`.
//
// reachable[i] is true when i items can be made from whole packs. Sizes are the
// outer loop and totals ascend in the inner loop, so reachable[i - size] may
// already include this size and a size can be used any number of times.
pub fn minimal_total(order: u32, sizes: &PackSizes) -> Result<usize, ResolveError> {
    let order_idx = order as usize;
    let max_total = order_idx + sizes.smallest() as usize - 1;

    let mut reachable = vec![false; max_total + 1];
    // zero items is the empty combination
    reachable[0] = true;

    for size in sizes.iter() {
        let size = size as usize;
        for i in size..=max_total {
            if reachable[i - size] {
                reachable[i] = true;
            }
        }
    }

    (order_idx..=max_total)
        .find(|&i| reachable[i])
        .ok_or_else(|| InvariantViolation::NoReachableTotal { order, max_total }.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(s: &[u32]) -> PackSizes {
        PackSizes::new(s.iter().copied()).unwrap()
    }

    #[test]
    fn test_exact_total_reachable() {
        assert_eq!(10, minimal_total(10, &sizes(&[3, 5])).unwrap());
        assert_eq!(8, minimal_total(8, &sizes(&[3, 5])).unwrap());
        assert_eq!(28, minimal_total(28, &sizes(&[3, 5, 10])).unwrap());
    }

    #[test]
    fn test_rounds_up_to_next_reachable() {
        // 4 and 7 are gaps for {3, 5}
        assert_eq!(5, minimal_total(4, &sizes(&[3, 5])).unwrap());
        assert_eq!(8, minimal_total(7, &sizes(&[3, 5])).unwrap());
        assert_eq!(
            12250,
            minimal_total(12001, &sizes(&[250, 500, 1000, 2000, 5000])).unwrap()
        );
    }

    #[test]
    fn test_bound_is_tight_for_single_size() {
        // 11 needs 3 packs of 4; max_total is 11 + 4 - 1 = 14
        assert_eq!(12, minimal_total(11, &sizes(&[4])).unwrap());
        assert_eq!(12, minimal_total(9, &sizes(&[4])).unwrap());
    }
}
