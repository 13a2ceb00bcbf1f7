//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Input file location and schema.
    #[serde(default)]
    pub data: DataConfig,
    /// Building assumptions: PV capacity and flexible load share.
    #[serde(default)]
    pub building: BuildingConfig,
    /// Day window selection.
    #[serde(default)]
    pub window: WindowConfig,
    /// Solver choice and tuning.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

/// Input file location and column schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Path of the hourly CSV file.
    pub path: PathBuf,
    /// Field delimiter (single ASCII character).
    pub delimiter: char,
    /// Multiplier converting the PV column to kWh (the source is in Wh).
    pub pv_scale: f64,
    /// Column mapping for the required fields.
    pub columns: ColumnMap,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("building_data.csv"),
            delimiter: ',',
            pv_scale: 0.001,
            columns: ColumnMap::default(),
        }
    }
}

/// Reference to a CSV column, either by zero-based position or header name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Where each required field lives in the source rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMap {
    /// Energy price (currency per kWh).
    pub price: ColumnRef,
    /// PV production per unit of installed capacity (Wh).
    pub pv: ColumnRef,
    /// Building demand (kWh, may be blank).
    pub demand: ColumnRef,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            price: ColumnRef::Index(2),
            pv: ColumnRef::Index(3),
            demand: ColumnRef::Index(5),
        }
    }
}

/// Building assumptions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildingConfig {
    /// Assumed installed PV capacity multiplying the per-unit PV series.
    pub pv_size: f64,
    /// Share of each hour's net demand that occupants can shift (0.0–1.0].
    pub controllable_fraction: f64,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            pv_size: 5.0,
            controllable_fraction: 0.1,
        }
    }
}

/// Day window selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    /// Zero-based day index.
    pub day: usize,
    /// Hour of day at which the recording starts; windows are shifted back by this much.
    pub start_hour_offset: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            day: 45,
            start_hour_offset: 5,
        }
    }
}

/// Solver choice and tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Solver type: `"segment"` (exact) or `"subgradient"` (iterative).
    pub solver: String,
    /// L1 regularization weight against shifting away from the baseline.
    pub lambda: f64,
    /// Constraint and convergence tolerance.
    pub tolerance: f64,
    /// Iteration cap for the iterative solver.
    pub max_iterations: usize,
    /// Extra attempts from a perturbed initial guess after non-convergence.
    pub retries: usize,
    /// Perturbation magnitude, relative to the mean hourly controllable load.
    pub perturbation: f64,
    /// Seed for the perturbation RNG.
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            solver: "segment".to_string(),
            lambda: 0.005,
            tolerance: 1e-6,
            max_iterations: 50_000,
            retries: 3,
            perturbation: 0.1,
            seed: 42,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"window.day"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "flexible", "iterative"];

    /// Returns the baseline scenario: 5 units of PV, 10% flexible load, day 45.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the flexible preset: a third of the load is shiftable and
    /// occupants are less reluctant to move it.
    pub fn flexible() -> Self {
        Self {
            building: BuildingConfig {
                controllable_fraction: 0.3,
                ..BuildingConfig::default()
            },
            optimizer: OptimizerConfig {
                lambda: 0.001,
                ..OptimizerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the iterative preset: baseline data with the subgradient solver.
    pub fn iterative() -> Self {
        Self {
            optimizer: OptimizerConfig {
                solver: "subgradient".to_string(),
                ..OptimizerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "flexible" => Ok(Self::flexible()),
            "iterative" => Ok(Self::iterative()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let d = &self.data;
        if !d.delimiter.is_ascii() {
            errors.push(ConfigError::new("data.delimiter", "must be an ASCII character"));
        }
        if !d.pv_scale.is_finite() || d.pv_scale < 0.0 {
            errors.push(ConfigError::new("data.pv_scale", "must be finite and >= 0"));
        }
        let c = &d.columns;
        if c.price == c.pv || c.price == c.demand || c.pv == c.demand {
            errors.push(ConfigError::new(
                "data.columns",
                "price, pv, and demand must refer to distinct columns",
            ));
        }

        let b = &self.building;
        if !b.pv_size.is_finite() || b.pv_size < 0.0 {
            errors.push(ConfigError::new("building.pv_size", "must be finite and >= 0"));
        }
        if !(b.controllable_fraction > 0.0 && b.controllable_fraction <= 1.0) {
            errors.push(ConfigError::new(
                "building.controllable_fraction",
                "must be in (0.0, 1.0]",
            ));
        }

        let o = &self.optimizer;
        if o.solver != "segment" && o.solver != "subgradient" {
            errors.push(ConfigError::new(
                "optimizer.solver",
                format!("must be \"segment\" or \"subgradient\", got \"{}\"", o.solver),
            ));
        }
        if !o.lambda.is_finite() || o.lambda < 0.0 {
            errors.push(ConfigError::new("optimizer.lambda", "must be finite and >= 0"));
        }
        if !(o.tolerance.is_finite() && o.tolerance > 0.0) {
            errors.push(ConfigError::new("optimizer.tolerance", "must be finite and > 0"));
        }
        if o.max_iterations == 0 {
            errors.push(ConfigError::new("optimizer.max_iterations", "must be > 0"));
        }
        if !o.perturbation.is_finite() || o.perturbation < 0.0 {
            errors.push(ConfigError::new(
                "optimizer.perturbation",
                "must be finite and >= 0",
            ));
        }

        errors
    }
}
