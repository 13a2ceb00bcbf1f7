//! Post-hoc cost figures for one optimized window.

use std::fmt;

use serde::Serialize;

use crate::optimizer::{OptimizationResult, SolverStatus, WindowProblem};

/// Cost comparison between the unshifted baseline and the optimized allocation.
///
/// Computed from the problem and the solver result so the reported numbers
/// always match the vector that produced the signal.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub solver: &'static str,
    pub status: SolverStatus,
    pub iterations: usize,
    /// Solver attempts including retries.
    pub attempts: usize,
    /// Energy reallocated across the window (kWh, signed).
    pub controllable_total_kwh: f64,
    /// Clamped energy cost with the baseline allocation.
    pub baseline_cost: f64,
    /// Clamped energy cost with the optimized allocation.
    pub optimized_cost: f64,
    /// Regularization penalty of the optimized allocation.
    pub penalty: f64,
    /// Energy moved away from its baseline hour (kWh, half the L1 deviation).
    pub shifted_kwh: f64,
    /// Hour within the window receiving the most flexible load.
    pub peak_hour: usize,
}

impl RunSummary {
    /// Computes all figures for a solved window.
    pub fn new(
        problem: &WindowProblem,
        result: &OptimizationResult,
        solver: &'static str,
        attempts: usize,
    ) -> Self {
        let baseline = problem.baseline();
        let deviation: f64 = result
            .x
            .iter()
            .zip(&baseline)
            .map(|(x, b)| (x - b).abs())
            .sum();
        let peak_hour = result
            .x
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i);

        Self {
            solver,
            status: result.status,
            iterations: result.iterations,
            attempts,
            controllable_total_kwh: problem.controllable_total(),
            baseline_cost: problem.cost(&baseline),
            optimized_cost: problem.cost(&result.x),
            penalty: problem.regularization(&result.x),
            shifted_kwh: deviation / 2.0,
            peak_hour,
        }
    }

    /// Baseline cost minus optimized cost.
    pub fn savings(&self) -> f64 {
        self.baseline_cost - self.optimized_cost
    }

    /// Savings relative to the baseline cost, 0 when the baseline is free.
    pub fn savings_pct(&self) -> f64 {
        if self.baseline_cost > 0.0 {
            100.0 * self.savings() / self.baseline_cost
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Window Summary ---")?;
        writeln!(
            f,
            "Solver:                {} ({}, {} iterations, {} attempts)",
            self.solver, self.status, self.iterations, self.attempts
        )?;
        writeln!(f, "Controllable energy:   {:.3} kWh", self.controllable_total_kwh)?;
        writeln!(f, "Shifted energy:        {:.3} kWh", self.shifted_kwh)?;
        writeln!(f, "Baseline cost:         {:.4}", self.baseline_cost)?;
        writeln!(f, "Optimized cost:        {:.4}", self.optimized_cost)?;
        writeln!(
            f,
            "Savings:               {:.4} ({:.2}%)",
            self.savings(),
            self.savings_pct()
        )?;
        writeln!(f, "Shift penalty:         {:.4}", self.penalty)?;
        write!(f, "Peak flexible hour:    {}", self.peak_hour)
    }
}
