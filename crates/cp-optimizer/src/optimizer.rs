//! The placement driver: seed, bounds, constrained search, decode.

use cp_field::{CoverageKernel, Integration};
use cp_types::{
    AxisBounds, CpResult, OptimizationResult, PlacementConfig, PlacementVector, Point2D,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::objective::{PlacementObjective, SeparationConstraint};
use crate::solver::{clamp_to_bounds, ConstrainedProblem, ProjectedGradient, SolverOptions};

/// Sweeps over all pairs allowed when pushing overlapping emitters apart.
const SEPARATION_PASSES: usize = 100;

/// How the starting placement is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InitialLayout {
    /// Emitter `i` at `((i mod 2 + 1) * width / 3, (i div 2 + 1) * height / 3)`.
    #[default]
    Grid,
    /// The grid layout with every coordinate shifted by up to one radius,
    /// reproducible from `seed`.
    Jittered { seed: u64 },
}

/// The placement search as seen by the solver.
#[derive(Debug, Clone)]
pub struct PlacementProblem {
    objective: PlacementObjective,
    constraint: SeparationConstraint,
    bounds: Vec<AxisBounds>,
}

impl PlacementProblem {
    pub fn new(config: &PlacementConfig) -> CpResult<Self> {
        let (bx, by) = config.room.bounds_for(config.radius);
        Ok(Self {
            objective: PlacementObjective::from_config(config)?,
            constraint: SeparationConstraint::new(config.radius),
            bounds: (0..config.emitters).flat_map(|_| [bx, by]).collect(),
        })
    }
}

impl ConstrainedProblem for PlacementProblem {
    fn bounds(&self) -> &[AxisBounds] {
        &self.bounds
    }

    fn objective(&self, x: &[f64]) -> f64 {
        self.objective.evaluate(x)
    }

    fn constraint(&self, x: &[f64]) -> f64 {
        self.constraint.evaluate(x)
    }

    fn gradient(&self, x: &[f64]) -> Vec<f64> {
        self.objective.gradient(x)
    }

    fn project(&self, x: &mut [f64]) {
        clamp_to_bounds(x, &self.bounds);
        self.constraint.separate(x, &self.bounds, SEPARATION_PASSES);
    }
}

/// Drives one placement run for a validated configuration.
#[derive(Debug, Clone)]
pub struct PlacementOptimizer {
    config: PlacementConfig,
    options: SolverOptions,
    layout: InitialLayout,
}

impl PlacementOptimizer {
    /// Fails with `InvalidConfiguration` before any work if `config` is unusable.
    pub fn new(config: PlacementConfig) -> CpResult<Self> {
        config.validate()?;
        CoverageKernel::new(config.radius, config.scale)?;
        Ok(Self {
            config,
            options: SolverOptions::default(),
            layout: InitialLayout::default(),
        })
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_layout(mut self, layout: InitialLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Per-coordinate bounds, in flattened order.
    pub fn bounds(&self) -> Vec<AxisBounds> {
        let (bx, by) = self.config.room.bounds_for(self.config.radius);
        (0..self.config.emitters).flat_map(|_| [bx, by]).collect()
    }

    /// The starting placement, clamped into the bounds. It may overlap.
    pub fn initial_placement(&self) -> PlacementVector {
        let room = self.config.room;
        let (bx, by) = room.bounds_for(self.config.radius);

        let mut points: Vec<Point2D> = (0..self.config.emitters)
            .map(|i| {
                Point2D::new(
                    ((i % 2) as f64 + 1.0) * room.width / 3.0,
                    ((i / 2) as f64 + 1.0) * room.height / 3.0,
                )
            })
            .collect();

        if let InitialLayout::Jittered { seed } = self.layout {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let r = self.config.radius;
            for p in &mut points {
                p.x += rng.gen_range(-r..=r);
                p.y += rng.gen_range(-r..=r);
            }
        }

        PlacementVector::new(
            points
                .into_iter()
                .map(|p| Point2D::new(bx.clamp(p.x), by.clamp(p.y)))
                .collect(),
        )
    }

    /// Run the constrained search.
    pub fn run(&self) -> CpResult<OptimizationResult> {
        self.options.validate()?;
        let config = &self.config;
        info!(
            "Optimizing {} emitters (radius {}, scale {}) in room {}{}",
            config.emitters,
            config.radius,
            config.scale,
            config.room,
            if config.presentation_corner {
                " with presentation corner"
            } else {
                ""
            }
        );

        let problem = PlacementProblem::new(config)?;
        let seed = self.initial_placement();
        debug!("Initial layout {:?}: {:?}", self.layout, seed.points());

        let outcome =
            ProjectedGradient::new(self.options.clone()).minimize(&problem, &seed.to_flat());
        let placements = PlacementVector::from_flat(&outcome.x)?;
        let coverage = -outcome.objective;

        if outcome.status.is_feasible() {
            info!(
                "Placement finished ({:?}) after {} iterations: coverage {:.4}",
                outcome.status, outcome.iterations, coverage
            );
        } else {
            warn!(
                "No separated placement found after {} iterations (separation {:.4}); returning best effort",
                outcome.iterations, outcome.constraint
            );
        }

        Ok(OptimizationResult {
            placements,
            coverage,
            status: outcome.status,
            iterations: outcome.iterations,
            objective_evaluations: outcome.objective_evaluations,
            constraint_evaluations: outcome.constraint_evaluations,
            separation: outcome.constraint.is_finite().then_some(outcome.constraint),
        })
    }

    /// Coverage grid for `placements` under this run's field settings, for
    /// handing to a renderer alongside the placement list.
    pub fn coverage_grid(&self, placements: &PlacementVector) -> CpResult<Integration> {
        let objective = PlacementObjective::from_config(&self.config)?;
        Ok(objective.integrator().integrate(placements.points()))
    }
}

/// Validate `config` and run a default search.
pub fn optimize(config: &PlacementConfig) -> CpResult<OptimizationResult> {
    PlacementOptimizer::new(config.clone())?.run()
}
