//! Tunables for model building and layout, loadable from TOML.

use crate::layout::{GroupMetrics, LayeredParams, OracleParams, PlacementParams};
use crate::measure::TextMetrics;
use crate::model::ModelOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Every section is optional; missing keys keep their defaults.
///
/// ```toml
/// [hub]
/// hub_entity = "Link"
///
/// [placement]
/// iterations = 200
/// gap = 80.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub hub: ModelOptions,
    pub metrics: TextMetrics,
    pub group: GroupMetrics,
    pub placement: PlacementParams,
    pub oracle: OracleParams,
    pub layered: LayeredParams,
}

impl LayoutConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(LayoutConfig::from_toml_str("").unwrap(), LayoutConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = LayoutConfig::from_toml_str(
            r#"
            [hub]
            hub_entity = "Link"

            [placement]
            iterations = 200
            gap = 80.0

            [oracle]
            budget_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.hub.hub_entity, "Link");
        assert_eq!(config.hub.inbound_field, "subject_id");
        assert_eq!(config.placement.iterations, 200);
        assert_eq!(config.placement.gap, 80.0);
        assert_eq!(config.placement.damping_floor, 0.1);
        assert_eq!(config.oracle.budget_ms, Some(500));
        assert_eq!(config.layered, LayeredParams::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = LayoutConfig::from_toml_str("[placement]\niterations = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = LayoutConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
