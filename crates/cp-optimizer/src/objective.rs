//! Objective and constraint functions over flattened placement vectors.

use cp_field::{CoverageKernel, FieldAggregator, GridIntegrator, Integration};
use cp_types::{unflatten, AxisBounds, CpResult, PlacementConfig, Point2D, RoomDimensions};

/// Negative coverage of a candidate placement.
///
/// Accepts any candidate, including ones outside the bounds or with
/// overlapping emitters; those simply score whatever coverage they produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementObjective {
    integrator: GridIntegrator,
}

impl PlacementObjective {
    pub fn new(
        room: RoomDimensions,
        radius: f64,
        scale: f64,
        presentation_corner: bool,
    ) -> CpResult<Self> {
        let kernel = CoverageKernel::new(radius, scale)?;
        let aggregator = FieldAggregator::new(kernel, presentation_corner);
        Ok(Self {
            integrator: GridIntegrator::new(room, aggregator),
        })
    }

    pub fn from_config(config: &PlacementConfig) -> CpResult<Self> {
        Self::new(
            config.room,
            config.radius,
            config.scale,
            config.presentation_corner,
        )
    }

    pub fn integrator(&self) -> &GridIntegrator {
        &self.integrator
    }

    /// `-sum` of the coverage grid for the decoded placement.
    pub fn evaluate(&self, flat: &[f64]) -> f64 {
        -self.integrator.coverage_sum(&unflatten(flat))
    }

    /// The grid and sum the objective is derived from.
    pub fn integrate(&self, flat: &[f64]) -> Integration {
        self.integrator.integrate(&unflatten(flat))
    }

    /// Gradient of [`evaluate`](Self::evaluate) with respect to each coordinate.
    ///
    /// Each sample cell contributes only through the emitter that wins it; cells
    /// won by the presentation corner contribute nothing.
    pub fn gradient(&self, flat: &[f64]) -> Vec<f64> {
        let free = unflatten(flat);
        let aggregator = self.integrator.aggregator();
        let kernel = aggregator.kernel();
        let emitters = aggregator.emitter_set(&free);

        let mut grad = vec![0.0; flat.len()];
        for point in self.integrator.sample_points() {
            if let Some((idx, _)) = aggregator.winner_at(point, &emitters) {
                if idx < free.len() {
                    let (gx, gy) = kernel.emitter_gradient(point, emitters[idx]);
                    grad[2 * idx] -= gx;
                    grad[2 * idx + 1] -= gy;
                }
            }
        }
        grad
    }
}

/// Smallest distance between any two points, `+inf` with fewer than two.
pub fn min_pairwise_distance(points: &[Point2D]) -> f64 {
    let mut min_sq = f64::INFINITY;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            min_sq = min_sq.min(a.distance_squared(b));
        }
    }
    min_sq.sqrt()
}

/// Non-overlap requirement between optimizer-controlled emitters.
///
/// The constraint value is `min pairwise distance - 2 * radius`; the placement
/// is feasible iff it is non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeparationConstraint {
    radius: f64,
}

/// Extra clearance added when pushing a pair apart so rounding cannot leave it
/// just short of the required distance.
const SEPARATION_SLACK: f64 = 1e-9;

/// Golden angle, used to pick distinct escape directions for coincident pairs.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

impl SeparationConstraint {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    pub fn required_distance(&self) -> f64 {
        2.0 * self.radius
    }

    pub fn evaluate(&self, flat: &[f64]) -> f64 {
        self.evaluate_points(&unflatten(flat))
    }

    pub fn evaluate_points(&self, points: &[Point2D]) -> f64 {
        min_pairwise_distance(points) - self.required_distance()
    }

    pub fn is_satisfied(&self, flat: &[f64]) -> bool {
        self.evaluate(flat) >= 0.0
    }

    /// Push overlapping pairs apart along the line joining them, keeping every
    /// coordinate inside `bounds`, until no pair overlaps or `max_passes` sweeps
    /// over all pairs have been made.
    ///
    /// Returns `true` if the constraint holds afterwards.
    pub fn separate(&self, flat: &mut [f64], bounds: &[AxisBounds], max_passes: usize) -> bool {
        let n = flat.len() / 2;
        let required = self.required_distance();

        for _ in 0..max_passes {
            let mut moved = false;
            for i in 0..n {
                for j in (i + 1)..n {
                    let dx = flat[2 * j] - flat[2 * i];
                    let dy = flat[2 * j + 1] - flat[2 * i + 1];
                    let dist = (dx * dx + dy * dy).sqrt();
                    if dist >= required {
                        continue;
                    }

                    let (ux, uy) = if dist > f64::EPSILON {
                        (dx / dist, dy / dist)
                    } else {
                        let angle = (i * n + j) as f64 * GOLDEN_ANGLE;
                        (angle.cos(), angle.sin())
                    };
                    let push = 0.5 * (required - dist) + SEPARATION_SLACK;

                    flat[2 * i] -= ux * push;
                    flat[2 * i + 1] -= uy * push;
                    flat[2 * j] += ux * push;
                    flat[2 * j + 1] += uy * push;
                    clamp_point(flat, i, bounds);
                    clamp_point(flat, j, bounds);
                    moved = true;
                }
            }
            if !moved {
                return true;
            }
        }
        self.is_satisfied(flat)
    }
}

fn clamp_point(flat: &mut [f64], idx: usize, bounds: &[AxisBounds]) {
    for axis in 0..2 {
        let k = 2 * idx + axis;
        if let Some(b) = bounds.get(k) {
            flat[k] = b.clamp(flat[k]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn objective(corner: bool) -> PlacementObjective {
        PlacementObjective::new(RoomDimensions::new(20.0, 25.0), 2.0, 2.0, corner).unwrap()
    }

    #[test]
    fn objective_is_negated_integral() {
        for corner in [false, true] {
            let obj = objective(corner);
            let flat = [4.0, 5.0, 11.5, 13.25, 16.0, 21.0];
            let integral = obj.integrator().integrate(&unflatten(&flat)).sum;
            assert_eq!(obj.evaluate(&flat), -integral);
            assert_eq!(obj.integrate(&flat).sum, integral);
        }
    }

    #[test]
    fn objective_tolerates_infeasible_candidates() {
        let obj = objective(false);
        let overlapping = [5.0, 5.0, 5.0, 5.0];
        let outside = [-30.0, 80.0, 100.0, -4.0];
        assert!(obj.evaluate(&overlapping).is_finite());
        assert!(obj.evaluate(&outside).is_finite());
        assert!(obj.evaluate(&outside) > obj.evaluate(&overlapping));
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let obj = objective(true);
        let flat = [6.3, 7.1, 13.4, 17.8];
        let grad = obj.gradient(&flat);
        let h = 1e-5;
        for k in 0..flat.len() {
            let mut up = flat;
            let mut down = flat;
            up[k] += h;
            down[k] -= h;
            let fd = (obj.evaluate(&up) - obj.evaluate(&down)) / (2.0 * h);
            assert_relative_eq!(grad[k], fd, max_relative = 1e-3, epsilon = 1e-6);
        }
    }

    #[test]
    fn constraint_sign_tracks_overlap() {
        let c = SeparationConstraint::new(2.0);
        assert_abs_diff_eq!(c.evaluate(&[0.0, 0.0, 5.0, 0.0]), 1.0);
        assert_abs_diff_eq!(c.evaluate(&[0.0, 0.0, 4.0, 0.0]), 0.0);
        assert!(c.evaluate(&[0.0, 0.0, 3.0, 0.0]) < 0.0);
        assert!(c.is_satisfied(&[0.0, 0.0, 3.0, 4.0]));
    }

    #[test]
    fn constraint_uses_closest_pair() {
        let c = SeparationConstraint::new(1.0);
        let flat = [0.0, 0.0, 10.0, 0.0, 10.0, 1.5];
        assert_abs_diff_eq!(c.evaluate(&flat), -0.5);
    }

    #[test]
    fn single_emitter_is_trivially_separated() {
        let c = SeparationConstraint::new(2.0);
        assert_eq!(c.evaluate(&[3.0, 4.0]), f64::INFINITY);
        assert!(c.is_satisfied(&[3.0, 4.0]));
        assert_eq!(min_pairwise_distance(&[]), f64::INFINITY);
    }

    #[test]
    fn separate_resolves_overlaps_inside_bounds() {
        let c = SeparationConstraint::new(2.0);
        let (bx, by) = RoomDimensions::new(20.0, 25.0).bounds_for(2.0);
        let bounds = [bx, by, bx, by, bx, by];
        let mut flat = [10.0, 10.0, 11.0, 10.0, 10.0, 10.0];

        assert!(c.separate(&mut flat, &bounds, 100));
        assert!(c.evaluate(&flat) >= 0.0);
        for (k, b) in bounds.iter().enumerate() {
            assert!(b.contains(flat[k]));
        }
    }

    #[test]
    fn separate_reports_impossible_layouts() {
        let c = SeparationConstraint::new(4.0);
        let (bx, by) = RoomDimensions::new(10.0, 10.0).bounds_for(4.0);
        let bounds = [bx, by, bx, by];
        let mut flat = [4.0, 4.0, 6.0, 4.0];

        assert!(!c.separate(&mut flat, &bounds, 50));
        assert!(c.evaluate(&flat) < 0.0);
        for (k, b) in bounds.iter().enumerate() {
            assert!(b.contains(flat[k]));
        }
    }
}
