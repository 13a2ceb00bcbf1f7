//! Integration tests for the load → window → optimize → signal pipeline.

mod common;

use approx::assert_abs_diff_eq;
use occupant_signal::Error;
use occupant_signal::config::DataConfig;
use occupant_signal::io::export::export_csv;
use occupant_signal::io::loader::read_series;
use occupant_signal::runner::{run_scenario, run_series};
use occupant_signal::series::{HOURS_PER_DAY, HourlySeries};

#[test]
fn full_run_from_file_produces_unit_signal() {
    let path = common::write_temp("full_run.csv", &common::synthetic_csv());
    let run = run_scenario(&common::scenario_for(path)).expect("pipeline should succeed");

    assert!(run.result.is_success());
    assert_eq!(run.signal.values().len(), HOURS_PER_DAY);
    assert_abs_diff_eq!(run.signal.norm(), 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(
        run.problem.conservation_residual(&run.result.x),
        0.0,
        epsilon = 1e-9
    );
    assert!(run.result.x.iter().all(|&x| x >= -1e-9));
}

#[test]
fn window_is_aligned_with_source_rows() {
    let series = read_series(common::synthetic_csv().as_bytes(), &DataConfig::default()).unwrap();
    let config = common::scenario_for("unused.csv".into());
    let run = run_series(&series, &config).unwrap();

    assert_eq!(run.window.start, 24 * 2 - 5);
    for h in 0..HOURS_PER_DAY {
        let i = run.window.start + h;
        assert_eq!(run.window.price[h], common::price_at(i));
        assert_abs_diff_eq!(run.window.pv[h], common::pv_wh_at(i) * 0.001, epsilon = 1e-12);
        assert_eq!(run.window.demand[h], common::demand_at(i).unwrap_or(0.0));
        assert_abs_diff_eq!(
            run.window.net_demand[h],
            run.window.demand[h] - 5.0 * run.window.pv[h],
            epsilon = 1e-9
        );
    }
}

#[test]
fn flexible_load_moves_to_cheap_or_exporting_hours() {
    let series = read_series(common::synthetic_csv().as_bytes(), &DataConfig::default()).unwrap();
    let run = run_series(&series, &common::scenario_for("unused.csv".into())).unwrap();

    // night tariff hours, plus daytime hours whose missing demand turns PV into export
    let absorbed: f64 = (0..HOURS_PER_DAY)
        .filter(|&h| run.window.price[h] < 0.1 || run.window.net_demand[h] < 0.0)
        .map(|h| run.result.x[h])
        .sum();
    assert_abs_diff_eq!(absorbed, run.problem.controllable_total(), epsilon = 1e-9);
    assert!(run.summary.savings() > 0.0);
    for h in 0..HOURS_PER_DAY {
        if run.window.price[h] > 0.3 {
            assert_eq!(run.result.x[h], 0.0);
        }
    }
}

#[test]
fn day_past_end_of_data_is_out_of_range() {
    let path = common::write_temp("out_of_range.csv", &common::synthetic_csv());
    let mut config = common::scenario_for(path);
    config.window.day = 45;
    let err = run_scenario(&config).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { day: 45, .. }));
}

#[test]
fn malformed_price_aborts_run() {
    let mut csv = common::synthetic_csv();
    csv.push_str("t_bad,0,free,0,5.0,3.0\n");
    let path = common::write_temp("bad_price.csv", &csv);
    let err = run_scenario(&common::scenario_for(path)).unwrap_err();
    assert!(matches!(err, Error::Parse { line, .. } if line == common::HOURS + 2));
}

#[test]
fn nan_price_inside_window_is_parse_error() {
    // sample 50 lies in the day-2 window [43, 67)
    let csv: String = common::synthetic_csv()
        .lines()
        .enumerate()
        .map(|(n, row)| {
            if n == 51 {
                let mut fields: Vec<&str> = row.split(',').collect();
                fields[2] = "NaN";
                fields.join(",") + "\n"
            } else {
                format!("{row}\n")
            }
        })
        .collect();
    let path = common::write_temp("nan_price.csv", &csv);
    match run_scenario(&common::scenario_for(path)).unwrap_err() {
        Error::Parse { line, column, .. } => {
            assert_eq!(line, 52);
            assert_eq!(column, "price");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_io_error() {
    let config = common::scenario_for("/nonexistent/building_data.csv".into());
    assert!(matches!(run_scenario(&config), Err(Error::Io(_))));
}

#[test]
fn zero_reallocation_is_degenerate_signal() {
    // day 1 window covers samples 19..43: twelve hours of 5 kWh load, then
    // twelve hours of 5 kWh net export
    let len = 48;
    let demand = (0..len).map(|i| if (19..31).contains(&i) { 5.0 } else { 0.0 }).collect();
    let pv = (0..len).map(|i| if (19..31).contains(&i) { 0.0 } else { 1.0 }).collect();
    let series = HourlySeries::new(vec![0.2; len], pv, demand).unwrap();
    let mut config = common::scenario_for("unused.csv".into());
    config.window.day = 1;

    let err = run_series(&series, &config).unwrap_err();
    assert!(matches!(err, Error::DegenerateSignal));
}

#[test]
fn export_writes_window_rows() {
    let series = read_series(common::synthetic_csv().as_bytes(), &DataConfig::default()).unwrap();
    let run = run_series(&series, &common::scenario_for("unused.csv".into())).unwrap();
    let path = common::write_temp("export.csv", "");
    export_csv(&run, &path).expect("export should succeed");

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written.lines().count(), HOURS_PER_DAY + 1);
}
