//! Pointwise "best server wins" aggregation over an emitter set.

use cp_types::Point2D;

use crate::kernel::CoverageKernel;

/// Maximum influence over `emitters` at `point`, or 0 for an empty set.
pub fn max_influence(kernel: &CoverageKernel, point: Point2D, emitters: &[Point2D]) -> f64 {
    emitters
        .iter()
        .map(|e| kernel.influence(point, *e))
        .fold(0.0, f64::max)
}

/// Combines per-emitter influence into one coverage value.
///
/// When the presentation corner is enabled a fixed emitter at the origin is
/// always part of the field, in addition to the emitters passed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldAggregator {
    kernel: CoverageKernel,
    presentation_corner: bool,
}

impl FieldAggregator {
    pub fn new(kernel: CoverageKernel, presentation_corner: bool) -> Self {
        Self {
            kernel,
            presentation_corner,
        }
    }

    pub fn kernel(&self) -> &CoverageKernel {
        &self.kernel
    }

    /// The full emitter set contributing to the field: `free` plus the corner.
    ///
    /// The corner, when present, is always the last element.
    pub fn emitter_set(&self, free: &[Point2D]) -> Vec<Point2D> {
        let mut set = Vec::with_capacity(free.len() + 1);
        set.extend_from_slice(free);
        if self.presentation_corner {
            set.push(Point2D::ORIGIN);
        }
        set
    }

    /// Coverage at `point` from the free emitters (and the corner, if enabled).
    pub fn coverage_at(&self, point: Point2D, free: &[Point2D]) -> f64 {
        let free_max = max_influence(&self.kernel, point, free);
        if self.presentation_corner {
            free_max.max(self.kernel.influence(point, Point2D::ORIGIN))
        } else {
            free_max
        }
    }

    /// Index into `emitters` of the strongest emitter at `point` and its value.
    ///
    /// Ties go to the lowest index. `None` for an empty set.
    pub fn winner_at(&self, point: Point2D, emitters: &[Point2D]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, e) in emitters.iter().enumerate() {
            let value = self.kernel.influence(point, *e);
            match best {
                Some((_, current)) if value <= current => {}
                _ => best = Some((idx, value)),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel() -> CoverageKernel {
        CoverageKernel::new(2.0, 2.0).unwrap()
    }

    #[test]
    fn empty_set_has_no_coverage() {
        let agg = FieldAggregator::new(kernel(), false);
        assert_eq!(agg.coverage_at(Point2D::new(3.0, 3.0), &[]), 0.0);
        assert!(agg.winner_at(Point2D::new(3.0, 3.0), &[]).is_none());
    }

    #[test]
    fn takes_maximum_not_sum() {
        let k = kernel();
        let agg = FieldAggregator::new(k, false);
        let p = Point2D::new(5.0, 5.0);
        let emitters = [Point2D::new(4.0, 5.0), Point2D::new(7.0, 5.0), Point2D::new(5.0, 9.0)];

        let expected = emitters
            .iter()
            .map(|e| k.influence(p, *e))
            .fold(f64::MIN, f64::max);
        assert_eq!(agg.coverage_at(p, &emitters), expected);
        assert!(agg.coverage_at(p, &emitters) <= 1.0);
    }

    #[test]
    fn corner_joins_the_field() {
        let k = kernel();
        let with_corner = FieldAggregator::new(k, true);
        let without = FieldAggregator::new(k, false);
        let far = [Point2D::new(18.0, 23.0)];
        let near_origin = Point2D::new(1.0, 1.0);

        let corner = with_corner.coverage_at(near_origin, &far);
        assert!(corner > without.coverage_at(near_origin, &far));
        assert_eq!(with_corner.coverage_at(Point2D::ORIGIN, &[]), 1.0);
        assert_eq!(with_corner.emitter_set(&far), vec![far[0], Point2D::ORIGIN]);
        assert_eq!(without.emitter_set(&far), far.to_vec());
    }

    #[test]
    fn winner_prefers_closest() {
        let agg = FieldAggregator::new(kernel(), false);
        let emitters = [Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)];
        let (idx, value) = agg.winner_at(Point2D::new(8.0, 0.0), &emitters).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(value, agg.coverage_at(Point2D::new(8.0, 0.0), &emitters));
    }
}
