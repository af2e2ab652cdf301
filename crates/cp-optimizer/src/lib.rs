//! # cp-optimizer
//!
//! Placement search for Coverplace.
//!
//! Provides the coverage objective and separation constraint over flattened
//! placement vectors, a bounded projected-gradient solver behind the
//! [`ConstrainedProblem`] seam, the [`PlacementOptimizer`] driver that seeds,
//! bounds and runs a search, and [`PlacementSweep`] for evaluating independent
//! configurations in parallel.

mod objective;
mod optimizer;
mod solver;
mod sweep;

pub use objective::{min_pairwise_distance, PlacementObjective, SeparationConstraint};
pub use optimizer::{optimize, InitialLayout, PlacementOptimizer, PlacementProblem};
pub use solver::{
    clamp_to_bounds, finite_difference_gradient, ConstrainedProblem, ProjectedGradient,
    SolverOptions, SolverOutcome,
};
pub use sweep::{PlacementSweep, SweepConfig, SweepEntry, SweepId, SweepState, SweepStatus};
