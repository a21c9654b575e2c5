use crate::core::params::EnsembleSettings;
use crate::core::time::SimulationTime;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Settings for one complete pipeline run.
///
/// Only the input path, output directory, and duration are user-facing
/// requirements; everything else carries a protocol default that a settings
/// file may override.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub time: SimulationTime,
    /// Force field passed to `pdb2gmx -ff`.
    pub force_field: String,
    /// Water model passed to `pdb2gmx -water`.
    pub water_model: String,
    /// Solute-to-box-edge distance in nm (`editconf -d`).
    pub box_distance: f64,
    /// Positive ion name for `genion -pname`.
    pub positive_ion: String,
    /// Negative ion name for `genion -nname`.
    pub negative_ion: String,
    pub ensemble: EnsembleSettings,
    /// Explicit path to the `gmx` executable; `None` means locate it.
    pub gmx_binary: Option<PathBuf>,
}

#[derive(Debug, Default, Clone)]
pub struct SimulationConfigBuilder {
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    time: Option<SimulationTime>,
    force_field: Option<String>,
    water_model: Option<String>,
    box_distance: Option<f64>,
    positive_ion: Option<String>,
    negative_ion: Option<String>,
    temperature: Option<f64>,
    pressure: Option<f64>,
    gmx_binary: Option<PathBuf>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, path: PathBuf) -> Self {
        self.input = Some(path);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn time(mut self, time: SimulationTime) -> Self {
        self.time = Some(time);
        self
    }
    pub fn force_field(mut self, name: impl Into<String>) -> Self {
        self.force_field = Some(name.into());
        self
    }
    pub fn water_model(mut self, name: impl Into<String>) -> Self {
        self.water_model = Some(name.into());
        self
    }
    pub fn box_distance(mut self, nm: f64) -> Self {
        self.box_distance = Some(nm);
        self
    }
    pub fn positive_ion(mut self, name: impl Into<String>) -> Self {
        self.positive_ion = Some(name.into());
        self
    }
    pub fn negative_ion(mut self, name: impl Into<String>) -> Self {
        self.negative_ion = Some(name.into());
        self
    }
    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn pressure(mut self, bar: f64) -> Self {
        self.pressure = Some(bar);
        self
    }
    pub fn gmx_binary(mut self, path: PathBuf) -> Self {
        self.gmx_binary = Some(path);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        Ok(SimulationConfig {
            input: self.input.ok_or(ConfigError::MissingParameter("input"))?,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output-dir"))?,
            time: self.time.ok_or(ConfigError::MissingParameter("time"))?,
            force_field: self.force_field.unwrap_or_else(|| "amber99sb".to_string()),
            water_model: self.water_model.unwrap_or_else(|| "tip3p".to_string()),
            box_distance: self.box_distance.unwrap_or(1.0),
            positive_ion: self.positive_ion.unwrap_or_else(|| "NA".to_string()),
            negative_ion: self.negative_ion.unwrap_or_else(|| "CL".to_string()),
            ensemble: EnsembleSettings {
                temperature: self.temperature.unwrap_or(300.0),
                pressure: self.pressure.unwrap_or(1.0),
            },
            gmx_binary: self.gmx_binary,
        })
    }
}
