//! Gaussian influence of a single emitter.

use cp_types::{config_error, CpResult, Point2D};
use serde::{Deserialize, Serialize};

/// Radially symmetric Gaussian falloff around an emitter.
///
/// `influence = exp(-d² / (scale² · radius²))`, so the value is exactly 1 at the
/// emitter and decays with distance. `scale` controls how far the influence
/// reaches beyond the physical radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageKernel {
    /// `1 / (scale² · radius²)`, always finite and positive.
    inv_spread: f64,
}

impl CoverageKernel {
    pub fn new(radius: f64, scale: f64) -> CpResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(config_error!("kernel radius must be positive, got {radius}"));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(config_error!("kernel scale must be positive, got {scale}"));
        }
        let inv_spread = 1.0 / (scale * scale * radius * radius);
        if !(inv_spread.is_finite() && inv_spread > 0.0) {
            return Err(config_error!(
                "kernel spread (scale {scale} x radius {radius}) is outside f64 range"
            ));
        }
        Ok(Self { inv_spread })
    }

    /// `scale² · radius²`.
    pub fn spread_squared(&self) -> f64 {
        1.0 / self.inv_spread
    }

    /// Influence of `emitter` at `point`.
    #[inline]
    pub fn influence(&self, point: Point2D, emitter: Point2D) -> f64 {
        self.influence_at_distance_squared(point.distance_squared(&emitter))
    }

    #[inline]
    pub fn influence_at_distance_squared(&self, distance_squared: f64) -> f64 {
        (-distance_squared * self.inv_spread).exp()
    }

    /// Influence of one emitter over a batch of evaluation points.
    pub fn influence_batch(&self, points: &[Point2D], emitter: Point2D) -> Vec<f64> {
        points.iter().map(|p| self.influence(*p, emitter)).collect()
    }

    /// Gradient of the influence with respect to the emitter position.
    ///
    /// Moving the emitter toward `point` increases the influence there.
    pub fn emitter_gradient(&self, point: Point2D, emitter: Point2D) -> (f64, f64) {
        let value = self.influence(point, emitter);
        let factor = 2.0 * value * self.inv_spread;
        (factor * (point.x - emitter.x), factor * (point.y - emitter.y))
    }
}
