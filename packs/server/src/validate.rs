use std::collections::HashSet;

use pack_resolver::PackSizes;

use crate::processor::ProcessError;

/// Upper bound on the number of sizes in one configuration.
pub const MAX_PACK_SIZES: usize = 64;

/// Accepts a positive order no larger than `max`.
pub fn order_quantity(raw: i64, max: u32) -> Result<u32, ProcessError> {
    if raw <= 0 {
        return Err(ProcessError::Validation(
            "order quantity must be a positive integer".to_string(),
        ));
    }
    if raw > max as i64 {
        return Err(ProcessError::Validation(format!(
            "order quantity exceeds maximum of {}",
            max
        )));
    }
    Ok(raw as u32)
}

/// Accepts a non-empty list of distinct positive sizes.
pub fn pack_sizes(raw: &[i64]) -> Result<PackSizes, ProcessError> {
    if raw.is_empty() {
        return Err(ProcessError::Validation(
            "pack sizes cannot be empty".to_string(),
        ));
    }
    if raw.len() > MAX_PACK_SIZES {
        return Err(ProcessError::Validation(format!(
            "too many pack sizes, at most {} allowed",
            MAX_PACK_SIZES
        )));
    }
    if raw.iter().any(|&size| size <= 0 || size > u32::MAX as i64) {
        return Err(ProcessError::Validation(
            "pack sizes must be positive integers".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(raw.len());
    if !raw.iter().all(|size| seen.insert(*size)) {
        return Err(ProcessError::Validation(
            "pack sizes must not contain duplicates".to_string(),
        ));
    }

    Ok(PackSizes::new(raw.iter().map(|&size| size as u32))?)
}
