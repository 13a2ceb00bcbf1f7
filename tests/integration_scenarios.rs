//! Reference optimization scenarios, checked against both solvers.

use approx::assert_abs_diff_eq;
use occupant_signal::Error;
use occupant_signal::optimizer::{
    SegmentSolver, Solver, SolverStatus, SubgradientSolver, WindowProblem,
};
use occupant_signal::series::HOURS_PER_DAY;
use occupant_signal::signal::Signal;

fn solvers() -> Vec<Box<dyn Solver>> {
    vec![
        Box::new(SegmentSolver),
        Box::new(SubgradientSolver::default()),
    ]
}

const X0: [f64; HOURS_PER_DAY] = [0.0; HOURS_PER_DAY];

#[test]
fn constant_demand_and_price_keep_baseline() {
    let problem = WindowProblem::new([10.0; HOURS_PER_DAY], [0.1; HOURS_PER_DAY]);
    for solver in solvers() {
        let result = solver.solve(&problem, &X0);
        assert!(result.is_success(), "{} should converge", solver.name());
        for (xi, bi) in result.x.iter().zip(problem.baseline()) {
            assert_abs_diff_eq!(*xi, bi, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(problem.regularization(&result.x), 0.0, epsilon = 1e-6);
    }
}

#[test]
fn single_cheap_hour_attracts_load() {
    let mut price = [0.5; HOURS_PER_DAY];
    price[13] = 0.01;
    let problem = WindowProblem::new([10.0; HOURS_PER_DAY], price);
    for solver in solvers() {
        let result = solver.solve(&problem, &X0);
        assert!(result.is_success(), "{} should converge", solver.name());
        assert!(result.x.iter().all(|&x| x >= -1e-9));
        assert_abs_diff_eq!(
            problem.conservation_residual(&result.x),
            0.0,
            epsilon = 1e-9
        );
        let max_other = (0..HOURS_PER_DAY)
            .filter(|&h| h != 13)
            .map(|h| result.x[h])
            .fold(f64::MIN, f64::max);
        assert!(result.x[13] > problem.baseline()[13]);
        assert!(result.x[13] > max_other);

        let signal = Signal::from_reallocation(&result.x).unwrap();
        assert_abs_diff_eq!(signal.values()[13], 1.0, epsilon = 1e-6);
    }
}

#[test]
fn net_export_window_costs_only_regularization() {
    let problem = WindowProblem::new([-6.0; HOURS_PER_DAY], [0.25; HOURS_PER_DAY]);
    assert!(!problem.is_feasible());
    for solver in solvers() {
        let result = solver.solve(&problem, &X0);
        assert_eq!(result.status, SolverStatus::Infeasible);
        assert!(!result.is_success());
        assert_abs_diff_eq!(
            problem.conservation_residual(&result.x),
            0.0,
            epsilon = 1e-9
        );
        assert_eq!(problem.cost(&result.x), 0.0);
        assert_abs_diff_eq!(
            result.objective,
            problem.regularization(&result.x),
            epsilon = 1e-12
        );
    }
}

#[test]
fn solvers_are_shareable_across_threads() {
    let solver = SegmentSolver;
    let problems: Vec<WindowProblem> = (1..=4)
        .map(|k| WindowProblem::new([k as f64; HOURS_PER_DAY], [0.1 * k as f64; HOURS_PER_DAY]))
        .collect();
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = problems
            .iter()
            .map(|p| s.spawn(move || solver.solve(p, &X0)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for (problem, result) in problems.iter().zip(&results) {
        assert_eq!(*result, solver.solve(problem, &X0));
    }
}

#[test]
fn zero_vector_has_no_signal() {
    assert!(matches!(
        Signal::from_reallocation(&[0.0; HOURS_PER_DAY]),
        Err(Error::DegenerateSignal)
    ));
}
