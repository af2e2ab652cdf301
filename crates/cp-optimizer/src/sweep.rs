//! Parallel sweeps over independent placement configurations.
//!
//! Each entry of a sweep is a full, independent optimization run; entries share
//! nothing, so they are fanned out over the rayon pool.

use chrono::{DateTime, Utc};
use cp_types::{CpResult, OptimizationResult, PlacementConfig};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::{info, warn};
use uuid::Uuid;

use crate::optimizer::{InitialLayout, PlacementOptimizer};
use crate::solver::SolverOptions;

/// Unique sweep identifier.
pub type SweepId = Uuid;

/// Which configurations a sweep evaluates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub id: SweepId,
    pub name: String,

    /// Room, radius, scale and corner shared by every entry.
    pub base: PlacementConfig,

    /// One run per emitter count.
    pub emitter_counts: Vec<usize>,

    pub options: SolverOptions,
    pub layout: InitialLayout,
    pub created_at: DateTime<Utc>,
}

impl SweepConfig {
    pub fn new(name: impl Into<String>, base: PlacementConfig) -> Self {
        let emitter_counts = vec![base.emitters];
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            base,
            emitter_counts,
            options: SolverOptions::default(),
            layout: InitialLayout::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_emitter_range(mut self, range: RangeInclusive<usize>) -> Self {
        self.emitter_counts = range.collect();
        self
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_layout(mut self, layout: InitialLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// Lifecycle state for a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepState {
    Pending,
    Running,
    Completed,
}

/// Outcome of one configuration in a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub emitters: usize,
    pub result: Option<OptimizationResult>,
    pub error: Option<String>,
}

impl SweepEntry {
    fn from_run(emitters: usize, run: CpResult<OptimizationResult>) -> Self {
        match run {
            Ok(result) => Self {
                emitters,
                result: Some(result),
                error: None,
            },
            Err(e) => Self {
                emitters,
                result: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn feasible_result(&self) -> Option<&OptimizationResult> {
        self.result.as_ref().filter(|r| r.status.is_feasible())
    }
}

/// Aggregate status of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepStatus {
    pub id: SweepId,
    pub config: SweepConfig,
    pub state: SweepState,
    pub entries: Vec<SweepEntry>,
    /// Index into `entries` of the feasible run with the most coverage per emitter.
    pub best: Option<usize>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SweepStatus {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            id: config.id,
            config,
            state: SweepState::Pending,
            entries: Vec::new(),
            best: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = SweepState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = SweepState::Completed;
        self.finished_at = Some(Utc::now());
    }

    /// Append an entry and update `best` if it improves on the current best.
    pub fn record(&mut self, entry: SweepEntry) {
        let current = self.best_entry().and_then(SweepEntry::feasible_result);
        let improves = match (entry.feasible_result(), current) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(candidate), Some(current)) => {
                candidate.coverage_per_emitter() > current.coverage_per_emitter()
            }
        };
        self.entries.push(entry);
        if improves {
            self.best = Some(self.entries.len() - 1);
        }
    }

    pub fn best_entry(&self) -> Option<&SweepEntry> {
        self.best.and_then(|idx| self.entries.get(idx))
    }
}

/// Runs every configuration of a [`SweepConfig`] concurrently.
#[derive(Debug, Clone)]
pub struct PlacementSweep {
    config: SweepConfig,
}

impl PlacementSweep {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> SweepStatus {
        let mut status = SweepStatus::new(self.config.clone());
        status.mark_running();
        info!(
            "Starting sweep '{}' over {} configurations",
            self.config.name,
            self.config.emitter_counts.len()
        );

        let entries: Vec<SweepEntry> = self
            .config
            .emitter_counts
            .par_iter()
            .map(|&emitters| {
                let run = PlacementOptimizer::new(self.config.base.clone().with_emitters(emitters))
                    .and_then(|opt| {
                        opt.with_options(self.config.options.clone())
                            .with_layout(self.config.layout)
                            .run()
                    });
                match &run {
                    Ok(result) => info!(
                        "Sweep entry {} emitters: coverage {:.4} ({:?})",
                        emitters, result.coverage, result.status
                    ),
                    Err(e) => warn!("Sweep entry {} emitters failed: {}", emitters, e),
                }
                SweepEntry::from_run(emitters, run)
            })
            .collect();

        for entry in entries {
            status.record(entry);
        }
        status.mark_completed();
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_types::{ConvergenceStatus, PlacementVector, Point2D, RoomDimensions};

    fn result(emitters: usize, coverage: f64, status: ConvergenceStatus) -> OptimizationResult {
        OptimizationResult {
            placements: PlacementVector::new(vec![Point2D::new(5.0, 5.0); emitters]),
            coverage,
            status,
            iterations: 10,
            objective_evaluations: 30,
            constraint_evaluations: 30,
            separation: None,
        }
    }

    fn entry(emitters: usize, coverage: f64, status: ConvergenceStatus) -> SweepEntry {
        SweepEntry::from_run(emitters, Ok(result(emitters, coverage, status)))
    }

    fn base() -> PlacementConfig {
        PlacementConfig::new(RoomDimensions::new(12.0, 12.0), 1)
            .with_radius(1.5)
            .with_scale(2.0)
            .with_presentation_corner(false)
    }

    #[test]
    fn status_lifecycle() {
        let mut status = SweepStatus::new(SweepConfig::new("lifecycle", base()));
        assert_eq!(status.state, SweepState::Pending);
        assert!(status.started_at.is_none());

        status.mark_running();
        assert_eq!(status.state, SweepState::Running);
        assert!(status.started_at.is_some());

        status.mark_completed();
        assert_eq!(status.state, SweepState::Completed);
        assert!(status.finished_at.is_some());
    }

    #[test]
    fn best_tracks_coverage_per_emitter() {
        let mut status = SweepStatus::new(SweepConfig::new("best", base()));

        status.record(entry(1, 40.0, ConvergenceStatus::Converged));
        assert_eq!(status.best, Some(0));

        status.record(entry(2, 90.0, ConvergenceStatus::IterationLimit));
        assert_eq!(status.best, Some(1));

        // More total coverage but less per emitter.
        status.record(entry(3, 120.0, ConvergenceStatus::Converged));
        assert_eq!(status.best, Some(1));
    }

    #[test]
    fn infeasible_and_failed_entries_never_win() {
        let mut status = SweepStatus::new(SweepConfig::new("infeasible", base()));
        status.record(entry(2, 500.0, ConvergenceStatus::Infeasible));
        status.record(SweepEntry::from_run(
            0,
            Err(cp_types::config_error!("at least one emitter is required")),
        ));
        assert_eq!(status.best, None);

        status.record(entry(1, 10.0, ConvergenceStatus::Converged));
        assert_eq!(status.best, Some(2));
        assert_eq!(status.best_entry().unwrap().emitters, 1);
    }

    #[test]
    fn sweep_runs_each_count() {
        let config = SweepConfig::new("range", base())
            .with_emitter_range(1..=3)
            .with_options(SolverOptions::default().with_max_iterations(10));
        let status = PlacementSweep::new(config).run();

        assert_eq!(status.state, SweepState::Completed);
        assert_eq!(status.entries.len(), 3);
        let counts: Vec<usize> = status.entries.iter().map(|e| e.emitters).collect();
        assert_eq!(counts, vec![1, 2, 3]);
        for e in &status.entries {
            let r = e.result.as_ref().expect("every count is a valid configuration");
            assert_eq!(r.placements.len(), e.emitters);
        }
        assert!(status.best.is_some());
    }

    #[test]
    fn invalid_entries_are_recorded_not_fatal() {
        let mut config = SweepConfig::new("with-zero", base()).with_emitter_range(0..=1);
        config.options = SolverOptions::default().with_max_iterations(5);
        let status = PlacementSweep::new(config).run();

        assert_eq!(status.entries.len(), 2);
        assert!(status.entries[0].result.is_none());
        assert!(status.entries[0].error.as_deref().unwrap().contains("Invalid configuration"));
        assert!(status.entries[1].result.is_some());
    }

    #[test]
    fn sweep_status_serializes() {
        let mut status = SweepStatus::new(SweepConfig::new("json", base()));
        status.record(entry(1, 40.0, ConvergenceStatus::Converged));
        let json = serde_json::to_string(&status).unwrap();
        let back: SweepStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
