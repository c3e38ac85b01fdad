use std::collections::BTreeMap;

use crate::error::{InvariantViolation, ResolveError};
use crate::plan::PackSizes;

// Sentinel for totals that cannot be built from whole packs.
const IMPOSSIBLE: usize = usize::MAX;

// Fewest packs adding up to exactly `target`, returned as size -> count.
//
// Builds solutions for totals 1..=target one at a time. For each total i every
// size is tried as the "last pack": if i - size can be made then i can be made
// with one more pack.
//
//   tally[i] = min(tally[i], tally[i - size] + 1)
//
// last_used[i] remembers which size produced tally[i] so the plan can be
// walked back from target to zero. Sizes are scanned ascending and a size that
// ties the current minimum replaces the earlier choice, so among equally short
// plans the one ending in the largest size wins.
pub fn minimal_pack_counts(
    target: usize,
    sizes: &PackSizes,
) -> Result<BTreeMap<u32, u64>, ResolveError> {
    let mut counts = BTreeMap::new();
    if target == 0 {
        return Ok(counts);
    }

    let mut tally = vec![IMPOSSIBLE; target + 1];
    let mut last_used = vec![0u32; target + 1];
    tally[0] = 0;

    for current in 1..=target {
        for size in sizes.iter() {
            let step = size as usize;
            if step > current {
                // ascending, nothing further fits either
                break;
            }
            let tally_remainder = tally[current - step];
            if tally_remainder != IMPOSSIBLE {
                let candidate = tally_remainder + 1;
                if candidate <= tally[current] {
                    tally[current] = candidate;
                    last_used[current] = size;
                }
            }
        }
    }

    let mut remaining = target;
    while remaining > 0 {
        let size = last_used[remaining];
        if size == 0 {
            return Err(InvariantViolation::BrokenReconstruction { target, remaining }.into());
        }
        *counts.entry(size).or_insert(0) += 1;
        remaining -= size as usize;
    }

    Ok(counts)
}
