use tracing::trace;

use crate::series::HOURS_PER_DAY;

use super::{OptimizationResult, Solver, SolverStatus, WindowProblem};

/// Iterations between two checks of the best objective.
const STALL_WINDOW: usize = 100;

/// Projected subgradient descent.
///
/// Each iterate is projected back onto `{x >= 0, sum(x) = total}`, so every
/// iterate is feasible. The optimal objective is bounded from below by the
/// Lagrangian dual; steps follow Polyak's rule against that bound, or
/// `scale / k` when no bound exists.
///
/// The run is `Converged` only once the best objective is within
/// `tolerance` (relative, at least absolute) of the dual bound. A run whose
/// best objective stops improving over a stall window ends early with
/// `MaxIterations`, the same as one that exhausts `max_iterations`.
///
/// For infeasible problems the projection drops the non-negativity bound.
#[derive(Debug, Clone)]
pub struct SubgradientSolver {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for SubgradientSolver {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            tolerance: 1e-6,
        }
    }
}

impl SubgradientSolver {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    /// One subgradient of the objective at `x`.
    fn subgradient(problem: &WindowProblem, x: &[f64; HOURS_PER_DAY]) -> [f64; HOURS_PER_DAY] {
        let price = problem.price();
        let fixed = problem.fixed_load();
        let baseline = problem.baseline();
        let lambda = problem.lambda();
        let mut g = [0.0; HOURS_PER_DAY];
        for i in 0..HOURS_PER_DAY {
            let cost = if price[i] * (fixed[i] + x[i]) > 0.0 {
                price[i]
            } else {
                0.0
            };
            let deviation = x[i] - baseline[i];
            let penalty = if deviation > 0.0 {
                lambda
            } else if deviation < 0.0 {
                -lambda
            } else {
                0.0
            };
            g[i] = cost + penalty;
        }
        g
    }

    fn gap_limit(&self, objective: f64) -> f64 {
        self.tolerance * objective.abs().max(1.0)
    }
}

/// Lower bound on the optimal objective from the Lagrangian dual.
///
/// For a multiplier `mu`, minimizing `sum_i f_i(x_i) - mu * (sum_i x_i - total)`
/// hour by hour bounds the constrained optimum from below. Each hourly term
/// is piecewise linear, so its minimum sits at a kink or at the lower bound,
/// and the dual, being concave and piecewise linear in `mu`, peaks at one of
/// the segment slopes. With `bounded` the hours are restricted to `x >= 0`.
///
/// Returns `f64::NEG_INFINITY` when no multiplier keeps every hour bounded.
fn dual_bound(problem: &WindowProblem, bounded: bool) -> f64 {
    let price = problem.price();
    let fixed = problem.fixed_load();
    let baseline = problem.baseline();
    let lambda = problem.lambda();
    let total = problem.controllable_total();

    let term = |i: usize, t: f64| {
        (price[i] * (fixed[i] + t)).max(0.0) + lambda * (t - baseline[i]).abs()
    };

    let mut points: Vec<Vec<f64>> = Vec::with_capacity(HOURS_PER_DAY);
    let mut slopes = Vec::with_capacity(4 * HOURS_PER_DAY);
    let mut lowest = f64::NEG_INFINITY;
    let mut highest = f64::INFINITY;
    for i in 0..HOURS_PER_DAY {
        let mut kinks = vec![-fixed[i], baseline[i]];
        if bounded {
            kinks.retain(|&t| t > 0.0);
            kinks.push(0.0);
        }
        kinks.sort_by(f64::total_cmp);
        kinks.dedup();

        let (first, last) = (kinks[0], kinks[kinks.len() - 1]);
        let right = term(i, last + 1.0) - term(i, last);
        highest = highest.min(right);
        if !bounded {
            let left = term(i, first) - term(i, first - 1.0);
            lowest = lowest.max(left);
            slopes.push(left);
        }
        for w in kinks.windows(2) {
            slopes.push((term(i, w[1]) - term(i, w[0])) / (w[1] - w[0]));
        }
        slopes.push(right);
        points.push(kinks);
    }

    slopes
        .iter()
        .filter(|&&mu| mu >= lowest && mu <= highest)
        .map(|&mu| {
            let inner: f64 = points
                .iter()
                .enumerate()
                .map(|(i, kinks)| {
                    kinks
                        .iter()
                        .map(|&t| term(i, t) - mu * t)
                        .fold(f64::INFINITY, f64::min)
                })
                .sum();
            mu * total + inner
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Euclidean projection onto `{x >= 0, sum(x) = total}` for `total >= 0`.
fn project_simplex(y: &[f64; HOURS_PER_DAY], total: f64) -> [f64; HOURS_PER_DAY] {
    if total <= 0.0 {
        return [0.0; HOURS_PER_DAY];
    }
    let mut sorted = *y;
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (k, &u) in sorted.iter().enumerate() {
        cumulative += u;
        let candidate = (cumulative - total) / (k + 1) as f64;
        if u - candidate > 0.0 {
            theta = candidate;
        }
    }
    y.map(|v| (v - theta).max(0.0))
}

/// Euclidean projection onto `{sum(x) = total}`.
fn project_hyperplane(y: &[f64; HOURS_PER_DAY], total: f64) -> [f64; HOURS_PER_DAY] {
    let shift = (total - y.iter().sum::<f64>()) / HOURS_PER_DAY as f64;
    y.map(|v| v + shift)
}

impl Solver for SubgradientSolver {
    fn solve(&self, problem: &WindowProblem, x0: &[f64; HOURS_PER_DAY]) -> OptimizationResult {
        if !problem.is_finite() || x0.iter().any(|v| !v.is_finite()) {
            return OptimizationResult::invalid_input(problem, x0);
        }

        let total = problem.controllable_total();
        let feasible = problem.is_feasible();
        let project = |y: &[f64; HOURS_PER_DAY]| {
            if feasible {
                project_simplex(y, total)
            } else {
                project_hyperplane(y, total)
            }
        };
        let bound = dual_bound(problem, feasible);
        let scale = total.abs().max(self.tolerance);

        let mut x = project(x0);
        let mut best_x = x;
        let mut best = problem.objective(&x);
        let mut checkpoint = best;
        let mut converged = best - bound <= self.gap_limit(best);
        let mut iterations = 0;

        while !converged && iterations < self.max_iterations {
            iterations += 1;
            // steps stay on the hyperplane, so only the tangent part matters
            let mut g = Self::subgradient(problem, &x);
            let mean = g.iter().sum::<f64>() / HOURS_PER_DAY as f64;
            for gi in &mut g {
                *gi -= mean;
            }
            let norm_sq = g.iter().map(|v| v * v).sum::<f64>();
            if norm_sq == 0.0 {
                break;
            }

            let value = problem.objective(&x);
            let step = if bound.is_finite() {
                (value - bound).max(0.0) / norm_sq
            } else {
                scale / iterations as f64 / norm_sq.sqrt()
            };
            let mut y = x;
            for (yi, gi) in y.iter_mut().zip(&g) {
                *yi -= step * gi;
            }
            x = project(&y);

            let value = problem.objective(&x);
            if value < best {
                best = value;
                best_x = x;
            }
            converged = best - bound <= self.gap_limit(best);
            if !converged && iterations % STALL_WINDOW == 0 {
                if checkpoint - best <= self.gap_limit(best) {
                    trace!(iterations, best, bound, "subgradient stalled");
                    break;
                }
                trace!(iterations, best, bound, "subgradient progress");
                checkpoint = best;
            }
        }

        let status = match (feasible, converged) {
            (false, _) => SolverStatus::Infeasible,
            (true, true) => SolverStatus::Converged,
            (true, false) => SolverStatus::MaxIterations,
        };
        OptimizationResult {
            x: best_x,
            status,
            objective: best,
            iterations,
        }
    }

    fn name(&self) -> &'static str {
        "subgradient"
    }
}
