//! Placement vectors and optimization outcomes.

use serde::{Deserialize, Serialize};

use crate::errors::CpResult;
use crate::geometry::Point2D;

/// Ordered emitter positions for one run.
///
/// The solver works on the flattened form `[x0, y0, x1, y1, ...]`; the
/// emitter count never changes after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementVector {
    points: Vec<Point2D>,
}

impl PlacementVector {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Decode a flattened coordinate slice.
    pub fn from_flat(flat: &[f64]) -> CpResult<Self> {
        if flat.len() % 2 != 0 {
            return Err(crate::internal_error!(
                "flattened placement has odd length {}",
                flat.len()
            ));
        }
        Ok(Self {
            points: unflatten(flat),
        })
    }

    pub fn to_flat(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Decode `[x0, y0, x1, y1, ...]` into points. A trailing odd coordinate is ignored.
pub fn unflatten(flat: &[f64]) -> Vec<Point2D> {
    flat.chunks_exact(2)
        .map(|pair| Point2D::new(pair[0], pair[1]))
        .collect()
}

/// How the constrained search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// Relative improvement fell below tolerance at a feasible point.
    Converged,
    /// Iteration budget exhausted at a feasible point.
    IterationLimit,
    /// The separation constraint does not hold at the returned placement.
    Infeasible,
}

impl ConvergenceStatus {
    pub fn is_feasible(&self) -> bool {
        !matches!(self, Self::Infeasible)
    }
}

/// Result of a single placement optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub placements: PlacementVector,
    /// Riemann sum of the coverage field at `placements` (positive).
    pub coverage: f64,
    pub status: ConvergenceStatus,
    pub iterations: usize,
    pub objective_evaluations: usize,
    pub constraint_evaluations: usize,
    /// Separation constraint value at `placements`; negative means overlap.
    /// `None` when there is no pair to separate.
    pub separation: Option<f64>,
}

impl OptimizationResult {
    /// Coverage credited to each optimizer-controlled emitter.
    pub fn coverage_per_emitter(&self) -> f64 {
        if self.placements.is_empty() {
            0.0
        } else {
            self.coverage / self.placements.len() as f64
        }
    }
}
