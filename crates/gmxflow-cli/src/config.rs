use crate::cli::Cli;
use crate::error::{CliError, Result};
use gmxflow::core::time::SimulationTime;
use gmxflow::engine::config::{SimulationConfig, SimulationConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Duration used when neither `-t` nor the settings file specifies one.
const DEFAULT_DURATION: &str = "10ns";

/// Optional TOML settings file; every key is an override on top of the
/// built-in protocol defaults, and CLI flags win over the file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SettingsFile {
    #[serde(default)]
    pub topology: TopologySection,
    #[serde(default, rename = "box")]
    pub simulation_box: BoxSection,
    #[serde(default)]
    pub ions: IonsSection,
    #[serde(default)]
    pub simulation: SimulationSection,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TopologySection {
    pub force_field: Option<String>,
    pub water_model: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct BoxSection {
    /// Solute-to-box-edge distance in nm.
    pub distance: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct IonsSection {
    pub positive: Option<String>,
    pub negative: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SimulationSection {
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub time: Option<String>,
}

impl SettingsFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::SettingsFile {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        let settings: Self = toml::from_str(&content).map_err(|e| CliError::SettingsFile {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        debug!(?settings, "Loaded settings file");
        Ok(settings)
    }
}

/// Merges CLI arguments over the settings file over the protocol defaults.
pub fn build_config(cli: &Cli, settings: &SettingsFile) -> Result<SimulationConfig> {
    let duration = cli
        .time
        .as_deref()
        .or(settings.simulation.time.as_deref())
        .unwrap_or(DEFAULT_DURATION);
    let time: SimulationTime = duration
        .parse()
        .map_err(|e| CliError::Argument(format!("{}", e)))?;

    let mut builder = SimulationConfigBuilder::new()
        .input(cli.input.clone())
        .output_dir(cli.output.clone())
        .time(time);

    if let Some(ff) = &settings.topology.force_field {
        builder = builder.force_field(ff.clone());
    }
    if let Some(water) = &settings.topology.water_model {
        builder = builder.water_model(water.clone());
    }
    if let Some(distance) = settings.simulation_box.distance {
        builder = builder.box_distance(distance);
    }
    if let Some(positive) = &settings.ions.positive {
        builder = builder.positive_ion(positive.clone());
    }
    if let Some(negative) = &settings.ions.negative {
        builder = builder.negative_ion(negative.clone());
    }
    if let Some(temperature) = settings.simulation.temperature {
        builder = builder.temperature(temperature);
    }
    if let Some(pressure) = settings.simulation.pressure {
        builder = builder.pressure(pressure);
    }
    if let Some(gmx) = &cli.gmx {
        builder = builder.gmx_binary(gmx.clone());
    }

    builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["gmxflow"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults_apply_without_a_settings_file() {
        let cli = cli(&["-i", "protein.pdb", "-o", "run"]);
        let config = build_config(&cli, &SettingsFile::default()).unwrap();

        assert_eq!(config.time.as_nanoseconds(), 10.0);
        assert_eq!(config.time.production_steps(), 5_000_000);
        assert_eq!(config.force_field, "amber99sb");
    }

    #[test]
    fn cli_duration_wins_over_the_settings_file() {
        let cli = cli(&["-i", "protein.pdb", "-o", "run", "-t", "100ns"]);
        let settings: SettingsFile = toml::from_str("[simulation]\ntime = \"1ns\"\n").unwrap();

        let config = build_config(&cli, &settings).unwrap();
        assert_eq!(config.time.production_steps(), 50_000_000);
    }

    #[test]
    fn settings_file_duration_wins_over_the_default() {
        let cli = cli(&["-i", "protein.pdb", "-o", "run"]);
        let settings: SettingsFile = toml::from_str("[simulation]\ntime = \"500ps\"\n").unwrap();

        let config = build_config(&cli, &settings).unwrap();
        assert_eq!(config.time.as_nanoseconds(), 0.5);
    }

    #[test]
    fn settings_file_overrides_protocol_defaults() {
        let cli = cli(&["-i", "protein.pdb", "-o", "run"]);
        let settings: SettingsFile = toml::from_str(
            r#"
            [topology]
            force-field = "charmm36"
            water-model = "spce"

            [box]
            distance = 1.2

            [ions]
            positive = "K"

            [simulation]
            temperature = 310.0
            "#,
        )
        .unwrap();

        let config = build_config(&cli, &settings).unwrap();
        assert_eq!(config.force_field, "charmm36");
        assert_eq!(config.water_model, "spce");
        assert_eq!(config.box_distance, 1.2);
        assert_eq!(config.positive_ion, "K");
        assert_eq!(config.negative_ion, "CL");
        assert_eq!(config.ensemble.temperature, 310.0);
    }

    #[test]
    fn invalid_duration_is_an_argument_error() {
        let cli = cli(&["-i", "protein.pdb", "-o", "run", "-t", "10lightyears"]);
        let err = build_config(&cli, &SettingsFile::default()).unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }

    #[test]
    fn unknown_settings_keys_are_rejected() {
        assert!(toml::from_str::<SettingsFile>("[simulation]\nfoo = 1\n").is_err());
        assert!(toml::from_str::<SettingsFile>("[unknown-section]\n").is_err());
    }

    #[test]
    fn settings_files_round_trip_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[simulation]\ntime = \"2us\"\n").unwrap();

        let settings = SettingsFile::from_file(&path).unwrap();
        assert_eq!(settings.simulation.time.as_deref(), Some("2us"));

        let missing = SettingsFile::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(CliError::SettingsFile { .. })));
    }
}
