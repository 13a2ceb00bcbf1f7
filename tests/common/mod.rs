//! Shared fixtures for integration tests.

use std::fs;
use std::path::PathBuf;

use occupant_signal::config::ScenarioConfig;
use occupant_signal::series::HOURS_PER_DAY;

/// Hours of synthetic data (five days, starting at 05:00).
pub const HOURS: usize = 5 * HOURS_PER_DAY;

/// Hour of day of sample `i`, given the recording starts at 05:00.
pub fn hour_of_day(i: usize) -> usize {
    (i + 5) % HOURS_PER_DAY
}

/// Time-of-use price: cheap at night, expensive in the evening.
pub fn price_at(i: usize) -> f64 {
    match hour_of_day(i) {
        0..=5 => 0.08,
        17..=20 => 0.35,
        _ => 0.18,
    }
}

/// PV production in Wh per unit of capacity.
pub fn pv_wh_at(i: usize) -> f64 {
    match hour_of_day(i) {
        h @ 8..=16 => (600.0 - 50.0 * (h as f64 - 12.0).powi(2)).max(0.0),
        _ => 0.0,
    }
}

/// Office demand in kWh; every 7th sample is missing.
pub fn demand_at(i: usize) -> Option<f64> {
    if i % 7 == 3 {
        return None;
    }
    Some(match hour_of_day(i) {
        8..=18 => 9.0,
        _ => 4.0,
    })
}

/// Building data CSV in the default column layout.
pub fn synthetic_csv() -> String {
    let mut out = String::from("timestamp,hour,price,pv_wh,outdoor_c,demand_kwh\n");
    for i in 0..HOURS {
        let demand = demand_at(i).map(|d| d.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "t{i},{},{},{},5.0,{demand}\n",
            hour_of_day(i),
            price_at(i),
            pv_wh_at(i)
        ));
    }
    out
}

/// Writes `contents` to a uniquely named file in the temp directory.
pub fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "occupant-signal-{}-{name}",
        std::process::id()
    ));
    fs::write(&path, contents).expect("temp file should be writable");
    path
}

/// Baseline scenario pointed at `path`, selecting a day inside the fixture.
pub fn scenario_for(path: PathBuf) -> ScenarioConfig {
    let mut config = ScenarioConfig::baseline();
    config.data.path = path;
    config.window.day = 2;
    config
}
