use thiserror::Error;

/// Errors returned by the resolver.
///
/// `NoPackSizes` and `ZeroPackSize` are precondition errors caused by the
/// caller. `Invariant` is a defect in the resolver itself and should never be
/// observed; callers are expected to surface it loudly rather than recover.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no pack sizes provided")]
    NoPackSizes,

    #[error("pack sizes must be positive")]
    ZeroPackSize,

    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl ResolveError {
    /// True for internal invariant violations, false for caller errors.
    pub fn is_defect(&self) -> bool {
        matches!(self, ResolveError::Invariant(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("no reachable total in {order}..={max_total}")]
    NoReachableTotal { order: u32, max_total: usize },

    #[error("reconstruction of {target} stalled with {remaining} remaining")]
    BrokenReconstruction { target: usize, remaining: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defect_classification() {
        assert!(!ResolveError::NoPackSizes.is_defect());
        assert!(!ResolveError::ZeroPackSize.is_defect());

        let err: ResolveError = InvariantViolation::BrokenReconstruction {
            target: 10,
            remaining: 4,
        }
        .into();
        assert!(err.is_defect());
        assert_eq!(
            "internal invariant violated: reconstruction of 10 stalled with 4 remaining",
            err.to_string()
        );
    }
}
