//! Session configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::{DEFAULT_REGION, REPORT_METHODOLOGY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for one calculator session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Factor table location; absent or malformed files fall back to defaults
    pub factors_path: PathBuf,
    /// Reporting region printed in report metadata
    pub region: String,
    /// Methodology printed in report metadata
    pub methodology: String,
    /// Where `write_report` puts the JSON snapshot
    pub report_path: PathBuf,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            factors_path: PathBuf::from("data/emission_factors/factors.json"),
            region: DEFAULT_REGION.to_string(),
            methodology: REPORT_METHODOLOGY.to_string(),
            report_path: PathBuf::from("emissions_report.json"),
        }
    }
}

impl CalculatorConfig {
    /// Create a config reading factors from `path`.
    pub fn with_factors_path(path: impl Into<PathBuf>) -> Self {
        Self {
            factors_path: path.into(),
            ..Default::default()
        }
    }

    /// Load config from JSON; missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Load config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(Self::from_json_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let c = CalculatorConfig::from_json_str(r#"{ "region": "Dubai" }"#).unwrap();
        assert_eq!(c.region, "Dubai");
        assert_eq!(c.factors_path, PathBuf::from("data/emission_factors/factors.json"));
        assert_eq!(c.methodology, REPORT_METHODOLOGY);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghg.json");
        fs::write(&path, r#"{ "report_path": "out/report.json" }"#).unwrap();
        let c = CalculatorConfig::from_file(&path).unwrap();
        assert_eq!(c.report_path, PathBuf::from("out/report.json"));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(CalculatorConfig::from_file(&path), Err(ConfigError::Json(_))));

        assert!(matches!(
            CalculatorConfig::from_file(dir.path().join("absent.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
