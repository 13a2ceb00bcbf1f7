use std::cmp::Ordering;

use tracing::trace;

use crate::series::HOURS_PER_DAY;

use super::{OptimizationResult, Solver, SolverStatus, WindowProblem};

/// Exact solver for the window problem.
///
/// Every hour's term is convex and piecewise linear in `x[i]`, with kinks
/// where the hour's load crosses zero and where `x[i]` crosses its baseline.
/// Starting from the lower bounds, the conservation budget is poured into
/// the hourly segments in ascending order of marginal cost. Segments with
/// equal marginal cost share the remaining budget evenly, so hours that
/// are interchangeable end up with the same load.
///
/// The initial guess is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentSolver;

/// Linear piece of one hour's objective term.
#[derive(Debug, Clone, Copy)]
struct Segment {
    hour: usize,
    slope: f64,
    /// `f64::INFINITY` for the last piece.
    length: f64,
}

impl SegmentSolver {
    /// Splits the objective term of `hour` into linear pieces above `lower`.
    fn segments(problem: &WindowProblem, hour: usize, lower: f64, out: &mut Vec<Segment>) {
        let price = problem.price()[hour];
        let fixed = problem.fixed_load()[hour];
        let baseline = problem.baseline()[hour];
        let lambda = problem.lambda();

        let mut kinks = Vec::with_capacity(2);
        if price != 0.0 {
            kinks.push(-fixed);
        }
        if lambda != 0.0 {
            kinks.push(baseline);
        }
        kinks.retain(|&k| k > lower);
        kinks.sort_by(f64::total_cmp);
        kinks.dedup();

        let slope_at = |t: f64| {
            let cost = if price * (fixed + t) > 0.0 { price } else { 0.0 };
            let penalty = match t.partial_cmp(&baseline) {
                Some(Ordering::Greater) => lambda,
                Some(Ordering::Less) => -lambda,
                _ => 0.0,
            };
            cost + penalty
        };

        let first = out.len();
        let mut start = lower;
        for &kink in &kinks {
            out.push(Segment {
                hour,
                slope: slope_at(0.5 * (start + kink)),
                length: kink - start,
            });
            start = kink;
        }
        // beyond every kink: load is positive, x is above baseline
        out.push(Segment {
            hour,
            slope: price.max(0.0) + lambda,
            length: f64::INFINITY,
        });

        // merge neighbours with equal slope so each hour appears once per slope group
        let mut k = first + 1;
        while k < out.len() {
            if out[k].slope == out[k - 1].slope {
                out[k - 1].length += out[k].length;
                out.remove(k);
            } else {
                k += 1;
            }
        }
    }
}

/// Splits `amount` over bins of the given capacities as evenly as the
/// capacities allow. `amount` must not exceed their sum.
fn water_fill(capacities: &[f64], amount: f64) -> Vec<f64> {
    let mut order: Vec<usize> = (0..capacities.len()).collect();
    order.sort_by(|&a, &b| capacities[a].total_cmp(&capacities[b]));

    let mut fill = vec![0.0; capacities.len()];
    let mut remaining = amount;
    for (k, &i) in order.iter().enumerate() {
        let share = remaining / (order.len() - k) as f64;
        if capacities[i] <= share {
            fill[i] = capacities[i];
            remaining -= capacities[i];
        } else {
            for &j in &order[k..] {
                fill[j] = share;
            }
            break;
        }
    }
    fill
}

impl Solver for SegmentSolver {
    fn solve(&self, problem: &WindowProblem, x0: &[f64; HOURS_PER_DAY]) -> OptimizationResult {
        if !problem.is_finite() {
            return OptimizationResult::invalid_input(problem, x0);
        }

        let feasible = problem.is_feasible();
        let baseline = problem.baseline();
        let fixed = problem.fixed_load();

        // Without the non-negativity bound every hour's term is flat or
        // rising to the left of its leftmost kink, so the relaxed optimum
        // never goes below it.
        let mut x = [0.0; HOURS_PER_DAY];
        if !feasible {
            for i in 0..HOURS_PER_DAY {
                x[i] = baseline[i].min(-fixed[i]);
            }
        }

        let mut segments = Vec::with_capacity(3 * HOURS_PER_DAY);
        for (hour, &lower) in x.iter().enumerate() {
            Self::segments(problem, hour, lower, &mut segments);
        }
        // stable: pieces of one hour keep their left-to-right order on ties
        segments.sort_by(|a, b| a.slope.total_cmp(&b.slope));

        let mut remaining = problem.controllable_total() - x.iter().sum::<f64>();
        let mut groups = 0;
        let mut rest = segments.as_slice();
        while remaining > 0.0 && !rest.is_empty() {
            let slope = rest[0].slope;
            let len = rest.iter().take_while(|s| s.slope == slope).count();
            let (group, tail) = rest.split_at(len);
            rest = tail;
            groups += 1;

            let capacity: f64 = group.iter().map(|s| s.length).sum();
            if capacity <= remaining {
                for s in group {
                    x[s.hour] += s.length;
                }
                remaining -= capacity;
            } else {
                let lengths: Vec<f64> = group.iter().map(|s| s.length).collect();
                for (s, amount) in group.iter().zip(water_fill(&lengths, remaining)) {
                    x[s.hour] += amount;
                }
                remaining = 0.0;
            }
            trace!(slope, pieces = len, remaining, "filled slope group");
        }

        OptimizationResult {
            x,
            status: if feasible {
                SolverStatus::Converged
            } else {
                SolverStatus::Infeasible
            },
            objective: problem.objective(&x),
            iterations: groups,
        }
    }

    fn name(&self) -> &'static str {
        "segment"
    }
}
