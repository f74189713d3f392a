//! Settings resolution for the command-line host.
//!
//! Defaults, then an optional JSON settings file, then `LENTICULE_*`
//! environment overrides.

use std::path::Path;

use lenticule_core::{CalibrationSettings, JobSettings, MarkStyle, PhysicsSettings, SimulationConfig};
use serde::{Deserialize, Serialize};

/// Overrides the simulation column stride.
const ENV_SIM_STRIDE: &str = "LENTICULE_SIM_STRIDE";
/// Overrides the post-processing pixel budget.
const ENV_POSTFX_BUDGET: &str = "LENTICULE_POSTFX_BUDGET";

/// Everything a run needs, as stored in a settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CliConfig {
    pub job: JobSettings,
    pub calibration: CalibrationSettings,
    pub physics: PhysicsSettings,
    pub simulation: SimulationConfig,
    pub marks: MarkStyle,
}

/// Errors while reading a settings file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

impl CliConfig {
    /// Resolve the run configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Apply environment overrides read through `lookup`. Unparsable values
    /// are ignored with a warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(ENV_SIM_STRIDE) {
            match raw.parse() {
                Ok(stride) => self.simulation.column_stride = stride,
                Err(_) => tracing::warn!("ignoring {ENV_SIM_STRIDE}={raw}: not an integer"),
            }
        }
        if let Some(raw) = lookup(ENV_POSTFX_BUDGET) {
            match raw.parse() {
                Ok(budget) => self.simulation.postfx_pixel_budget = budget,
                Err(_) => tracing::warn!("ignoring {ENV_POSTFX_BUDGET}={raw}: not an integer"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lenticule_core::{AlignmentMode, Direction};

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CliConfig::from_json(
            r#"{ "job": { "lpi": 75.5, "direction": "RL", "alignment": "edgeCentered" } }"#,
        )
        .unwrap();
        assert_eq!(config.job.lpi, 75.5);
        assert_eq!(config.job.direction, Direction::RightToLeft);
        assert_eq!(config.job.alignment, AlignmentMode::EdgeCentered);
        assert_eq!(config.job.ppi_x, JobSettings::default().ppi_x);
        assert_eq!(config.physics, PhysicsSettings::default());
    }

    #[test]
    fn test_env_overrides_simulation() {
        let mut config = CliConfig::default();
        config.apply_env(|key| match key {
            ENV_SIM_STRIDE => Some("8".into()),
            ENV_POSTFX_BUDGET => Some("not-a-number".into()),
            _ => None,
        });
        assert_eq!(config.simulation.column_stride, 8);
        assert_eq!(
            config.simulation.postfx_pixel_budget,
            SimulationConfig::default().postfx_pixel_budget
        );
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(CliConfig::from_json("{ job: 1 }").is_err());
    }
}
