// Data-driven fitting configuration.
//
// Every tunable number the optimizer uses lives in `TempoMapConfig`, loaded
// from JSON. Fields left out of the file keep their defaults, so a config can
// override just the knobs it cares about:
//
//     { "anneal": { "max_iterations": 4000, "variation": 0.5 } }

use crate::error::Result;
use crate::sa::AnnealConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoMapConfig {
    pub anneal: AnnealConfig,
}

impl TempoMapConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TempoMapError;

    #[test]
    fn empty_object_is_default() {
        let config = TempoMapConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TempoMapConfig::default());
    }

    #[test]
    fn partial_override() {
        let config =
            TempoMapConfig::from_json_str(r#"{"anneal": {"variation": 0.5, "max_iterations": 10}}"#)
                .unwrap();
        assert_eq!(config.anneal.variation, 0.5);
        assert_eq!(config.anneal.max_iterations, 10);
        assert_eq!(config.anneal.cooling_rate, 0.995);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = TempoMapConfig::from_json_str("{ anneal: ").unwrap_err();
        assert!(matches!(err, TempoMapError::ConfigParse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("tempo_map_config_does_not_exist.json");
        let err = TempoMapConfig::load(&path).unwrap_err();
        assert!(matches!(err, TempoMapError::ConfigIo(_)));
    }

    #[test]
    fn load_round_trips_through_file() {
        let path = std::env::temp_dir().join(format!("tempo_map_config_{}.json", std::process::id()));
        let config = TempoMapConfig {
            anneal: AnnealConfig {
                initial_temp: 42.0,
                ..Default::default()
            },
        };
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
        let loaded = TempoMapConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
