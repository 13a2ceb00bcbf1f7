//! Reallocation of the controllable share of net demand within one day.
//!
//! The problem for a window of net demand `n` and prices `p` is
//!
//! ```text
//! minimize   sum_i max(p[i] * (fixed[i] + x[i]), 0) + lambda * sum_i |x[i] - baseline[i]|
//! subject to sum_i x[i] == controllable_total
//!            x[i] >= 0
//! ```
//!
//! where `fixed = (1 - f) * n`, `baseline = f * n` and `controllable_total =
//! sum(baseline)` for the controllable fraction `f`. Negative hourly cost is
//! clamped to zero: exporting never earns money.

/// Exact solver filling piecewise-linear cost segments.
pub mod segment;
/// Iterative projected subgradient solver.
pub mod subgradient;

use std::fmt;

use serde::Serialize;

use crate::config::OptimizerConfig;
use crate::series::{DailyWindow, HOURS_PER_DAY};

pub use segment::SegmentSolver;
pub use subgradient::SubgradientSolver;

/// Default L1 regularization weight.
pub const DEFAULT_LAMBDA: f64 = 0.005;
/// Default share of net demand occupants can shift.
pub const DEFAULT_CONTROLLABLE_FRACTION: f64 = 0.1;

/// Inputs of one window's optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowProblem {
    net_demand: [f64; HOURS_PER_DAY],
    price: [f64; HOURS_PER_DAY],
    controllable_fraction: f64,
    lambda: f64,
}

impl WindowProblem {
    /// Creates a problem with the default split and regularization weight.
    pub fn new(net_demand: [f64; HOURS_PER_DAY], price: [f64; HOURS_PER_DAY]) -> Self {
        Self {
            net_demand,
            price,
            controllable_fraction: DEFAULT_CONTROLLABLE_FRACTION,
            lambda: DEFAULT_LAMBDA,
        }
    }

    /// Creates a problem from a selected day window.
    pub fn from_window(window: &DailyWindow) -> Self {
        Self::new(window.net_demand, window.price)
    }

    #[must_use]
    pub fn with_controllable_fraction(mut self, fraction: f64) -> Self {
        self.controllable_fraction = fraction;
        self
    }

    #[must_use]
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn net_demand(&self) -> &[f64; HOURS_PER_DAY] {
        &self.net_demand
    }

    pub fn price(&self) -> &[f64; HOURS_PER_DAY] {
        &self.price
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn controllable_fraction(&self) -> f64 {
        self.controllable_fraction
    }

    /// Non-shiftable load of each hour.
    pub fn fixed_load(&self) -> [f64; HOURS_PER_DAY] {
        let fixed_share = 1.0 - self.controllable_fraction;
        self.net_demand.map(|n| fixed_share * n)
    }

    /// Unshifted controllable load of each hour.
    pub fn baseline(&self) -> [f64; HOURS_PER_DAY] {
        self.net_demand.map(|n| self.controllable_fraction * n)
    }

    /// Energy that must be reallocated across the window (signed).
    pub fn controllable_total(&self) -> f64 {
        self.baseline().iter().sum()
    }

    /// Whether the non-negativity bound admits the conservation target.
    pub fn is_feasible(&self) -> bool {
        self.controllable_total() >= 0.0
    }

    /// Whether all inputs are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.net_demand.iter().chain(&self.price).all(|v| v.is_finite())
            && self.controllable_fraction.is_finite()
            && self.lambda.is_finite()
    }

    /// Energy cost of `x`, each hour clamped at zero.
    pub fn cost(&self, x: &[f64; HOURS_PER_DAY]) -> f64 {
        let fixed = self.fixed_load();
        (0..HOURS_PER_DAY)
            .map(|i| (self.price[i] * (fixed[i] + x[i])).max(0.0))
            .sum()
    }

    /// L1 penalty of `x` against the baseline allocation.
    pub fn regularization(&self, x: &[f64; HOURS_PER_DAY]) -> f64 {
        let baseline = self.baseline();
        self.lambda
            * x.iter()
                .zip(&baseline)
                .map(|(xi, bi)| (xi - bi).abs())
                .sum::<f64>()
    }

    pub fn objective(&self, x: &[f64; HOURS_PER_DAY]) -> f64 {
        self.cost(x) + self.regularization(x)
    }

    /// `sum(x) - controllable_total`; zero when energy is conserved.
    pub fn conservation_residual(&self, x: &[f64; HOURS_PER_DAY]) -> f64 {
        x.iter().sum::<f64>() - self.controllable_total()
    }
}

/// Termination state of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// Constraints hold and the stopping criterion was met.
    Converged,
    /// The iteration cap was hit, or progress stalled, before the stopping
    /// criterion was met; `x` is the best iterate found.
    MaxIterations,
    /// The conservation target is negative, so no `x >= 0` can meet it.
    /// `x` solves the problem without the non-negativity bound.
    Infeasible,
    /// Inputs contain NaN or infinities; `x` is the initial guess.
    InvalidInput,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Converged => "converged",
            Self::MaxIterations => "iteration limit reached",
            Self::Infeasible => "infeasible (non-negativity relaxed)",
            Self::InvalidInput => "invalid input",
        })
    }
}

/// Solver output. Check [`OptimizationResult::is_success`] before trusting `x`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    /// Reallocated controllable load per hour.
    pub x: [f64; HOURS_PER_DAY],
    pub status: SolverStatus,
    /// Objective value at `x`.
    pub objective: f64,
    pub iterations: usize,
}

impl OptimizationResult {
    pub fn is_success(&self) -> bool {
        self.status == SolverStatus::Converged
    }

    pub(crate) fn invalid_input(problem: &WindowProblem, x0: &[f64; HOURS_PER_DAY]) -> Self {
        Self {
            x: *x0,
            status: SolverStatus::InvalidInput,
            objective: problem.objective(x0),
            iterations: 0,
        }
    }
}

/// Common interface of the window solvers.
///
/// Solvers hold only their tuning parameters, so a single instance can
/// solve independent windows from several threads.
pub trait Solver {
    /// Minimizes the window objective starting from `x0`.
    ///
    /// Never fails: problems are reported through the result status.
    fn solve(&self, problem: &WindowProblem, x0: &[f64; HOURS_PER_DAY]) -> OptimizationResult;

    /// Returns a human-readable solver name.
    fn name(&self) -> &'static str;
}

/// Solver selected by configuration.
#[derive(Debug, Clone)]
pub enum AnySolver {
    Segment(SegmentSolver),
    Subgradient(SubgradientSolver),
}

impl AnySolver {
    /// Builds the configured solver. Unknown names fall back to the exact
    /// solver; [`crate::config::ScenarioConfig::validate`] rejects them earlier.
    pub fn from_config(config: &OptimizerConfig) -> Self {
        match config.solver.as_str() {
            "subgradient" => Self::Subgradient(SubgradientSolver::new(
                config.max_iterations,
                config.tolerance,
            )),
            _ => Self::Segment(SegmentSolver),
        }
    }
}

impl Solver for AnySolver {
    fn solve(&self, problem: &WindowProblem, x0: &[f64; HOURS_PER_DAY]) -> OptimizationResult {
        match self {
            Self::Segment(s) => s.solve(problem, x0),
            Self::Subgradient(s) => s.solve(problem, x0),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Segment(s) => s.name(),
            Self::Subgradient(s) => s.name(),
        }
    }
}
