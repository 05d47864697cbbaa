use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{IrrigationError, Result};
use crate::processor::RunParameters;
use crate::scheduler::Tolerances;

/// Run configuration, read from a TOML file such as `irrigation.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Locations of the input tables.
    pub input: InputFiles,

    /// Period range, spreading period and efficiency.
    pub run: RunParameters,

    /// Numerical tolerances; defaults apply when the section is missing.
    #[serde(default)]
    pub tolerances: Tolerances,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputFiles {
    pub environmental: PathBuf, // ET0, effective rainfall and percolation per period
    pub crop_calendar: PathBuf, // Duration, Kc, special requirement and depletion per stage
}

impl RunConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Reads a configuration file. Relative input paths are taken relative
    /// to the directory of the file.
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = fs::read_to_string(path).map_err(|source| IrrigationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&toml_str)?;
        if let Some(dir) = path.parent() {
            config.input.environmental = dir.join(&config.input.environmental);
            config.input.crop_calendar = dir.join(&config.input.crop_calendar);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[input]
environmental = "data/enviro.txt"
crop_calendar = "data/calendar.csv"

[run]
first_period = 1
last_period = 12
spreading_period = 1.5
efficiency = 0.65

[tolerances]
epsilon = 1e-9
duration_sum = 0.05
"#;

    #[test]
    fn parses_full_config() {
        let config = RunConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.input.crop_calendar, PathBuf::from("data/calendar.csv"));
        assert_eq!(config.run.last_period, 12);
        assert_eq!(config.run.spreading_period, 1.5);
        assert_eq!(config.tolerances.epsilon, 1e-9);
        assert_eq!(config.tolerances.duration_sum, 0.05);
    }

    #[test]
    fn tolerances_default_when_missing() {
        let toml_str = FULL.split("[tolerances]").next().unwrap();
        let config = RunConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.tolerances, Tolerances::default());
    }

    #[test]
    fn rejects_unknown_and_missing_keys() {
        let unknown = FULL.replace("efficiency = 0.65", "efficiency = 0.65\nfoo = 1");
        assert!(matches!(
            RunConfig::from_toml_str(&unknown),
            Err(IrrigationError::Config(_))
        ));
        let missing = FULL.replace("spreading_period = 1.5\n", "");
        assert!(matches!(
            RunConfig::from_toml_str(&missing),
            Err(IrrigationError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = RunConfig::load(Path::new("does/not/exist.toml"));
        assert!(matches!(result, Err(IrrigationError::Io { .. })));
    }
}
