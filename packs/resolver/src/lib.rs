pub mod error;
pub mod plan;
pub mod signature;
pub mod solver;

pub use error::{InvariantViolation, ResolveError};
pub use plan::{PackCount, PackPlan, PackSizes};
pub use signature::signature;
pub use solver::{resolve, resolve_sizes};
