//! End-to-end pipeline: load, net demand, window, optimize, normalize.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::config::{OptimizerConfig, ScenarioConfig};
use crate::error::{Error, Result};
use crate::io::loader::load_series;
use crate::optimizer::{AnySolver, OptimizationResult, Solver, SolverStatus, WindowProblem};
use crate::series::{DailyWindow, HOURS_PER_DAY, HourlySeries};
use crate::signal::Signal;
use crate::summary::RunSummary;

/// Everything produced for one window.
#[derive(Debug, Clone)]
pub struct SignalRun {
    /// PV capacity used for the net demand.
    pub pv_size: f64,
    pub window: DailyWindow,
    pub problem: WindowProblem,
    pub result: OptimizationResult,
    pub signal: Signal,
    pub summary: RunSummary,
}

impl SignalRun {
    /// Load after reallocation: fixed share plus `x`.
    pub fn shifted_load(&self) -> [f64; HOURS_PER_DAY] {
        let fixed = self.problem.fixed_load();
        std::array::from_fn(|i| fixed[i] + self.result.x[i])
    }
}

/// Runs the scenario against the CSV file named in its configuration.
///
/// # Errors
///
/// Fails on unreadable or malformed input, an out-of-range day, a window
/// with non-finite values, or a zero reallocation. Solver non-convergence is reported in the result status.
pub fn run_scenario(config: &ScenarioConfig) -> Result<SignalRun> {
    let series = load_series(&config.data.path, &config.data)?;
    info!(path = %config.data.path.display(), hours = series.len(), "loaded hourly data");
    run_series(&series, config)
}

/// Runs the scenario against already loaded series.
///
/// # Errors
///
/// See [`run_scenario`].
pub fn run_series(series: &HourlySeries, config: &ScenarioConfig) -> Result<SignalRun> {
    let pv_size = config.building.pv_size;
    let net = series.net_demand(pv_size);
    let window = DailyWindow::select(
        series,
        &net,
        config.window.day,
        config.window.start_hour_offset,
    )?;
    debug!(day = window.day, start = window.start, "selected window");

    let problem = WindowProblem::from_window(&window)
        .with_controllable_fraction(config.building.controllable_fraction)
        .with_lambda(config.optimizer.lambda);
    let solver = AnySolver::from_config(&config.optimizer);
    let (result, attempts) = solve_with_retries(&solver, &problem, &config.optimizer);

    if result.status == SolverStatus::InvalidInput {
        return Err(Error::NonFiniteInput { day: window.day });
    }
    if result.is_success() {
        info!(
            solver = solver.name(),
            objective = result.objective,
            iterations = result.iterations,
            "optimized window"
        );
    } else {
        warn!(
            solver = solver.name(),
            status = %result.status,
            objective = result.objective,
            residual = problem.conservation_residual(&result.x),
            "solver did not succeed; reallocation is approximate"
        );
    }

    let signal = Signal::from_reallocation(&result.x)?;
    let summary = RunSummary::new(&problem, &result, solver.name(), attempts);
    Ok(SignalRun {
        pv_size,
        window,
        problem,
        result,
        signal,
        summary,
    })
}

/// Solves from the zero vector, retrying from perturbed starting points
/// while the solver runs out of iterations.
///
/// Returns the last result and the number of attempts made.
pub fn solve_with_retries(
    solver: &impl Solver,
    problem: &WindowProblem,
    config: &OptimizerConfig,
) -> (OptimizationResult, usize) {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let amplitude = config.perturbation * problem.controllable_total().abs() / HOURS_PER_DAY as f64;

    let mut x0 = [0.0; HOURS_PER_DAY];
    let mut result = solver.solve(problem, &x0);
    let mut attempts = 1;
    while result.status == SolverStatus::MaxIterations && attempts <= config.retries {
        for v in &mut x0 {
            *v = amplitude * rng.random_range(-1.0..=1.0);
        }
        debug!(attempt = attempts + 1, "retrying from perturbed start");
        result = solver.solve(problem, &x0);
        attempts += 1;
    }
    (result, attempts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::SubgradientSolver;

    fn wavy_problem() -> WindowProblem {
        let mut net = [0.0; HOURS_PER_DAY];
        let mut price = [0.0; HOURS_PER_DAY];
        for i in 0..HOURS_PER_DAY {
            let t = i as f64;
            net[i] = 8.0 + 3.0 * (t * 0.26).sin();
            price[i] = 0.15 + 0.1 * (t * 0.26).cos();
        }
        WindowProblem::new(net, price)
    }

    #[test]
    fn non_finite_window_is_reported_as_such() {
        let hours = 72;
        let mut price = vec![0.2; hours];
        price[30] = f64::NAN;
        let series = HourlySeries::new(price, vec![0.0; hours], vec![5.0; hours]).unwrap();
        let mut config = ScenarioConfig::baseline();
        config.window.day = 1;
        let err = run_series(&series, &config).unwrap_err();
        assert!(matches!(err, Error::NonFiniteInput { day: 1 }), "got {err:?}");
    }

    #[test]
    fn converged_first_attempt_is_not_retried() {
        let problem = WindowProblem::new([10.0; HOURS_PER_DAY], [0.1; HOURS_PER_DAY]);
        let (result, attempts) =
            solve_with_retries(&SubgradientSolver::default(), &problem, &OptimizerConfig::default());
        assert!(result.is_success());
        assert_eq!(attempts, 1);
    }

    #[test]
    fn exhausted_solver_is_retried() {
        let config = OptimizerConfig {
            retries: 2,
            ..OptimizerConfig::default()
        };
        let solver = SubgradientSolver::new(1, 1e-12);
        let (result, attempts) = solve_with_retries(&solver, &wavy_problem(), &config);
        assert_eq!(result.status, SolverStatus::MaxIterations);
        assert_eq!(attempts, 3);
    }

    #[test]
    fn retries_are_deterministic_for_a_seed() {
        let config = OptimizerConfig {
            retries: 2,
            ..OptimizerConfig::default()
        };
        let solver = SubgradientSolver::new(3, 1e-12);
        let (a, _) = solve_with_retries(&solver, &wavy_problem(), &config);
        let (b, _) = solve_with_retries(&solver, &wavy_problem(), &config);
        assert_eq!(a, b);
    }
}
