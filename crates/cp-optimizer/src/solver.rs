//! Bounded, constrained local minimization.
//!
//! [`ProjectedGradient`] minimizes any [`ConstrainedProblem`]: it takes gradient
//! steps, maps every candidate back through the problem's projection, and
//! backtracks until the objective improves. Every candidate is scored with both
//! the objective and the constraint.

use cp_types::{AxisBounds, ConvergenceStatus, CpResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A minimization problem with box bounds and one inequality constraint
/// (`constraint(x) >= 0` at a feasible point).
pub trait ConstrainedProblem {
    /// One interval per decision variable.
    fn bounds(&self) -> &[AxisBounds];

    fn objective(&self, x: &[f64]) -> f64;

    fn constraint(&self, x: &[f64]) -> f64;

    /// Gradient of the objective. Defaults to central finite differences.
    fn gradient(&self, x: &[f64]) -> Vec<f64> {
        finite_difference_gradient(|v| self.objective(v), x)
    }

    /// Map a candidate back onto the admissible set. Defaults to clamping into
    /// the bounds.
    fn project(&self, x: &mut [f64]) {
        clamp_to_bounds(x, self.bounds());
    }
}

/// Clamp each coordinate into its interval; coordinates without one are left alone.
pub fn clamp_to_bounds(x: &mut [f64], bounds: &[AxisBounds]) {
    for (value, b) in x.iter_mut().zip(bounds) {
        *value = b.clamp(*value);
    }
}

/// Central-difference gradient of `f` at `x`.
pub fn finite_difference_gradient<F>(f: F, x: &[f64]) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut shifted = x.to_vec();
    let mut grad = Vec::with_capacity(x.len());
    for k in 0..x.len() {
        let h = 1e-6 * x[k].abs().max(1.0);
        shifted[k] = x[k] + h;
        let up = f(&shifted);
        shifted[k] = x[k] - h;
        let down = f(&shifted);
        shifted[k] = x[k];
        grad.push((up - down) / (2.0 * h));
    }
    grad
}

/// Termination and step-control settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Iteration budget.
    pub max_iterations: usize,

    /// Stop once the relative objective improvement of an iteration drops below this.
    pub ftol: f64,

    /// Length of the first step, measured as the largest single-coordinate move.
    pub initial_step: f64,

    /// Sufficient-decrease coefficient for backtracking.
    pub armijo: f64,

    /// Maximum step halvings per iteration.
    pub max_backtracks: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            ftol: 1e-6,
            initial_step: 1.0,
            armijo: 1e-4,
            max_backtracks: 30,
        }
    }
}

impl SolverOptions {
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    pub fn validate(&self) -> CpResult<()> {
        if !(self.ftol.is_finite() && self.ftol >= 0.0) {
            return Err(cp_types::config_error!(
                "ftol must be a non-negative number, got {}",
                self.ftol
            ));
        }
        if !(self.initial_step.is_finite() && self.initial_step > 0.0) {
            return Err(cp_types::config_error!(
                "initial step must be positive, got {}",
                self.initial_step
            ));
        }
        if !(self.armijo.is_finite() && self.armijo > 0.0 && self.armijo < 1.0) {
            return Err(cp_types::config_error!(
                "armijo coefficient must lie in (0, 1), got {}",
                self.armijo
            ));
        }
        Ok(())
    }
}

/// What the solver hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub x: Vec<f64>,
    pub objective: f64,
    pub constraint: f64,
    pub status: ConvergenceStatus,
    pub iterations: usize,
    pub objective_evaluations: usize,
    pub constraint_evaluations: usize,
}

/// Projected-gradient descent with backtracking.
#[derive(Debug, Clone, Default)]
pub struct ProjectedGradient {
    options: SolverOptions,
}

struct Counted<'a, P: ?Sized> {
    problem: &'a P,
    objective_evaluations: usize,
    constraint_evaluations: usize,
}

impl<'a, P: ConstrainedProblem + ?Sized> Counted<'a, P> {
    fn score(&mut self, x: &[f64]) -> (f64, f64) {
        self.objective_evaluations += 1;
        self.constraint_evaluations += 1;
        (self.problem.objective(x), self.problem.constraint(x))
    }
}

struct Step {
    x: Vec<f64>,
    objective: f64,
    constraint: f64,
    length: f64,
}

impl ProjectedGradient {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Search for a local minimizer starting from `x0`.
    ///
    /// Never fails on an infeasible problem: the last iterate is returned with
    /// [`ConvergenceStatus::Infeasible`].
    pub fn minimize<P>(&self, problem: &P, x0: &[f64]) -> SolverOutcome
    where
        P: ConstrainedProblem + ?Sized,
    {
        let opts = &self.options;
        let mut counted = Counted {
            problem,
            objective_evaluations: 0,
            constraint_evaluations: 0,
        };

        let mut x = x0.to_vec();
        problem.project(&mut x);
        let (mut fx, mut cx) = counted.score(&x);

        let max_step = problem
            .bounds()
            .iter()
            .map(AxisBounds::width)
            .fold(opts.initial_step, f64::max);
        let mut step = opts.initial_step;
        let mut status = ConvergenceStatus::IterationLimit;
        let mut iterations = 0;

        while iterations < opts.max_iterations {
            iterations += 1;

            let grad = problem.gradient(&x);
            let norm = grad.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if norm == 0.0 || !norm.is_finite() {
                debug!(iteration = iterations, "gradient vanished");
                status = ConvergenceStatus::Converged;
                break;
            }

            let Some(accepted) =
                self.line_search(&mut counted, &x, fx, &grad, norm, step, max_step)
            else {
                debug!(iteration = iterations, objective = fx, "no descent step found");
                status = ConvergenceStatus::Converged;
                break;
            };

            let improvement =
                (fx - accepted.objective) / fx.abs().max(accepted.objective.abs()).max(1.0);
            debug!(
                iteration = iterations,
                objective = accepted.objective,
                constraint = accepted.constraint,
                step = accepted.length,
                improvement,
                "accepted step"
            );

            step = accepted.length;
            x = accepted.x;
            fx = accepted.objective;
            cx = accepted.constraint;

            if improvement < opts.ftol {
                status = ConvergenceStatus::Converged;
                break;
            }
        }

        if !(cx >= 0.0) {
            status = ConvergenceStatus::Infeasible;
        }

        SolverOutcome {
            x,
            objective: fx,
            constraint: cx,
            status,
            iterations,
            objective_evaluations: counted.objective_evaluations,
            constraint_evaluations: counted.constraint_evaluations,
        }
    }

    /// Find a step along `-grad` that lowers the objective, then keep moving the
    /// step length (doubling if the first try worked, halving otherwise) while
    /// that lowers it further.
    #[allow(clippy::too_many_arguments)]
    fn line_search<P>(
        &self,
        counted: &mut Counted<'_, P>,
        x: &[f64],
        fx: f64,
        grad: &[f64],
        norm: f64,
        initial: f64,
        max_step: f64,
    ) -> Option<Step>
    where
        P: ConstrainedProblem + ?Sized,
    {
        let opts = &self.options;
        let mut try_length = |length: f64| -> Option<Step> {
            let candidate = self.trial_point(counted.problem, x, grad, length / norm);
            let (fc, cc) = counted.score(&candidate);
            let predicted: f64 = grad
                .iter()
                .zip(x.iter().zip(&candidate))
                .map(|(g, (a, b))| g * (a - b))
                .sum();
            let sufficient =
                fc.is_finite() && fc < fx && fc <= fx - opts.armijo * predicted.max(0.0);
            sufficient.then_some(Step {
                x: candidate,
                objective: fc,
                constraint: cc,
                length,
            })
        };

        let mut length = initial;
        let mut best = None;
        let mut halvings = 0;
        while halvings <= opts.max_backtracks {
            if let Some(step) = try_length(length) {
                best = Some(step);
                break;
            }
            length *= 0.5;
            halvings += 1;
        }
        let mut best = best?;

        if halvings == 0 {
            while best.length < max_step {
                match try_length((best.length * 2.0).min(max_step)) {
                    Some(step) if step.objective < best.objective => best = step,
                    _ => break,
                }
            }
        } else {
            while halvings < opts.max_backtracks {
                halvings += 1;
                match try_length(best.length * 0.5) {
                    Some(step) if step.objective < best.objective => best = step,
                    _ => break,
                }
            }
        }
        Some(best)
    }

    fn trial_point<P>(&self, problem: &P, x: &[f64], grad: &[f64], t: f64) -> Vec<f64>
    where
        P: ConstrainedProblem + ?Sized,
    {
        let mut candidate: Vec<f64> = x.iter().zip(grad).map(|(v, g)| v - t * g).collect();
        problem.project(&mut candidate);
        candidate
    }
}
