// Two-phase optimisation: first the smallest shippable total, then the fewest
// packs for exactly that total.

pub mod minimizing_packs;
pub mod reachable_total;

use log::debug;

use crate::error::ResolveError;
use crate::plan::{PackPlan, PackSizes};

pub use minimizing_packs::minimal_pack_counts;
pub use reachable_total::minimal_total;

/// Resolves the optimal plan for `order_quantity` from raw pack sizes.
///
/// The sizes may arrive in any order. An empty list is reported as
/// [`ResolveError::NoPackSizes`].
pub fn resolve(order_quantity: u32, pack_sizes: &[u32]) -> Result<PackPlan, ResolveError> {
    let sizes = PackSizes::new(pack_sizes.iter().copied())?;
    resolve_sizes(order_quantity, &sizes)
}

/// Resolves the optimal plan for `order_quantity` from validated sizes.
///
/// The plan ships the fewest items that cover the order and, among the plans
/// shipping that many items, uses the fewest packs. The function is pure and
/// can be called from any number of threads at once.
pub fn resolve_sizes(order_quantity: u32, sizes: &PackSizes) -> Result<PackPlan, ResolveError> {
    if let Some(plan) = fast_path(order_quantity, sizes) {
        debug!(
            "order {} fits in one pack of {}",
            order_quantity,
            sizes.smallest()
        );
        return Ok(plan);
    }

    let target = minimal_total(order_quantity, sizes)?;
    let counts = minimal_pack_counts(target, sizes)?;
    let plan = PackPlan::from_counts(counts);
    debug!(
        "order {} resolved to {} items in {} packs",
        order_quantity,
        plan.total_items(),
        plan.total_packs()
    );
    Ok(plan)
}

/// One smallest pack when the order does not exceed it, zero included.
pub fn fast_path(order_quantity: u32, sizes: &PackSizes) -> Option<PackPlan> {
    let smallest = sizes.smallest();
    (order_quantity <= smallest).then(|| PackPlan::single(smallest))
}
