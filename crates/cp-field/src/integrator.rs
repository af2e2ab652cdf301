//! Unit-raster sampling and Riemann-sum integration of the coverage field.

use cp_types::{Point2D, RoomDimensions};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::aggregator::{max_influence, FieldAggregator};

/// Coverage sampled at every integer point of the room.
///
/// Indexed `[[x, y]]`: shape is `(columns, rows)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGrid {
    cells: Array2<f64>,
}

impl CoverageGrid {
    pub fn columns(&self) -> usize {
        self.cells.nrows()
    }

    pub fn rows(&self) -> usize {
        self.cells.ncols()
    }

    pub fn value(&self, x: usize, y: usize) -> Option<f64> {
        self.cells.get((x, y)).copied()
    }

    pub fn sum(&self) -> f64 {
        self.cells.sum()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.cells
    }

    /// Row-major copy with `rows[y][x]`, the layout image renderers expect.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.cells.t().outer_iter().map(|row| row.to_vec()).collect()
    }
}

/// A coverage grid together with its scalar sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    pub grid: CoverageGrid,
    pub sum: f64,
}

/// Samples the aggregated field once per unit of room length and sums it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridIntegrator {
    room: RoomDimensions,
    aggregator: FieldAggregator,
}

impl GridIntegrator {
    pub fn new(room: RoomDimensions, aggregator: FieldAggregator) -> Self {
        Self { room, aggregator }
    }

    pub fn aggregator(&self) -> &FieldAggregator {
        &self.aggregator
    }

    /// Every sample point, x-major.
    pub fn sample_points(&self) -> impl Iterator<Item = Point2D> {
        let rows = self.room.rows();
        (0..self.room.columns())
            .flat_map(move |x| (0..rows).map(move |y| Point2D::new(x as f64, y as f64)))
    }

    /// Build the coverage grid for `free` emitters and sum it.
    pub fn integrate(&self, free: &[Point2D]) -> Integration {
        let emitters = self.aggregator.emitter_set(free);
        let kernel = *self.aggregator.kernel();

        let mut cells = Array2::<f64>::zeros((self.room.columns(), self.room.rows()));
        Zip::indexed(&mut cells).for_each(|(x, y), cell| {
            *cell = max_influence(&kernel, Point2D::new(x as f64, y as f64), &emitters);
        });

        let grid = CoverageGrid { cells };
        let sum = grid.sum();
        Integration { grid, sum }
    }

    pub fn coverage_sum(&self, free: &[Point2D]) -> f64 {
        self.integrate(free).sum
    }
}
