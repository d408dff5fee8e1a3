//! Decomposition analysis.
//!
//! 1. **Plan** ([`DecompositionPlan`]): which measures are estimated under
//!    the given mediator and confounder sets
//! 2. **Placeholders** ([`fill`]): aliased, zero, and undefined tables
//! 3. **Replicates** ([`ReplicateRunner`]): one outer bootstrap replicate,
//!    from resampling to the ten measure tables

mod placeholder;
mod plan;
mod replicate;

pub use placeholder::{fill, Fill};
pub use plan::{DecompositionPlan, Derivation};
pub use replicate::ReplicateRunner;
