use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use occupant_signal::config::{ConfigError, ScenarioConfig};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Scenario TOML file.
    #[arg(long, env = "OCCUPANT_SIGNAL_SCENARIO", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in preset: baseline, flexible, or iterative.
    #[arg(long)]
    pub preset: Option<String>,

    /// Hourly CSV file, overrides `data.path`.
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Zero-based day index, overrides `window.day`.
    #[arg(long)]
    pub day: Option<usize>,

    /// Installed PV capacity, overrides `building.pv_size`.
    #[arg(long)]
    pub pv_size: Option<f64>,

    /// Regularization weight, overrides `optimizer.lambda`.
    #[arg(long)]
    pub lambda: Option<f64>,

    /// Solver, overrides `optimizer.solver`.
    #[arg(long)]
    pub solver: Option<String>,

    /// Write the window series to this CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Exit with an error unless the solver converged.
    #[arg(long)]
    pub require_convergence: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One signal value per line followed by the summary.
    Text,
    /// A single JSON document.
    Json,
}

impl Args {
    /// Resolves the scenario source (file, preset, or baseline) and applies
    /// the command-line overrides.
    pub fn scenario_config(&self) -> Result<ScenarioConfig, ConfigError> {
        let mut config = if let Some(path) = &self.scenario {
            ScenarioConfig::from_toml_file(path)?
        } else if let Some(name) = &self.preset {
            ScenarioConfig::from_preset(name)?
        } else {
            ScenarioConfig::baseline()
        };

        if let Some(path) = &self.data {
            config.data.path.clone_from(path);
        }
        if let Some(day) = self.day {
            config.window.day = day;
        }
        if let Some(pv_size) = self.pv_size {
            config.building.pv_size = pv_size;
        }
        if let Some(lambda) = self.lambda {
            config.optimizer.lambda = lambda;
        }
        if let Some(solver) = &self.solver {
            config.optimizer.solver.clone_from(solver);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_baseline() {
        let args = Args::try_parse_from(["occupant-signal"]).unwrap();
        let config = args.scenario_config().unwrap();
        assert_eq!(config.window.day, 45);
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn overrides_apply_on_top_of_preset() {
        let args = Args::try_parse_from([
            "occupant-signal",
            "--preset",
            "flexible",
            "--day",
            "3",
            "--pv-size",
            "2.5",
            "--solver",
            "subgradient",
            "--data",
            "office.csv",
        ])
        .unwrap();
        let config = args.scenario_config().unwrap();
        assert_eq!(config.building.controllable_fraction, 0.3);
        assert_eq!(config.window.day, 3);
        assert_eq!(config.building.pv_size, 2.5);
        assert_eq!(config.optimizer.solver, "subgradient");
        assert_eq!(config.data.path, PathBuf::from("office.csv"));
    }

    #[test]
    fn scenario_and_preset_are_exclusive() {
        let result = Args::try_parse_from([
            "occupant-signal",
            "--scenario",
            "a.toml",
            "--preset",
            "baseline",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_preset_is_config_error() {
        let args = Args::try_parse_from(["occupant-signal", "--preset", "nope"]).unwrap();
        let err = args.scenario_config().unwrap_err();
        assert_eq!(err.field, "preset");
    }

    #[test]
    fn json_format_parses() {
        let args = Args::try_parse_from(["occupant-signal", "--format", "json"]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
    }
}
