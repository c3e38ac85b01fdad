use sha2::{Digest, Sha256};

use crate::plan::PackSizes;

/// Content identity of a set of pack sizes.
///
/// SHA-256 over the sizes in ascending order joined with `,`, rendered as
/// lowercase hex. The same set supplied in any order yields the same value, so
/// it can key cached results.
pub fn signature(sizes: &PackSizes) -> String {
    let canonical = sizes
        .iter()
        .map(|size| size.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let hash = Sha256::digest(canonical.as_bytes());
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
