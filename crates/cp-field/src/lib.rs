//! # cp-field
//!
//! The coverage field model for Coverplace.
//!
//! A [`CoverageKernel`] gives one emitter's Gaussian influence at a point, the
//! [`FieldAggregator`] keeps the strongest influence over an emitter set, and the
//! [`GridIntegrator`] samples that field on a unit raster over the room and sums
//! it into a single coverage score.

mod aggregator;
mod integrator;
mod kernel;

pub use aggregator::{max_influence, FieldAggregator};
pub use integrator::{CoverageGrid, GridIntegrator, Integration};
pub use kernel::CoverageKernel;
