// src/config.rs
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::generator::GeneratorConfig;
use crate::graph::{DataKey, GridParams, RegistryPolicy, ScopeParams};

/// Every recognized option of a graph. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub accept_data: bool,
    pub auto_commit_on_tick: bool,
    pub accept_unregistered_keys: bool,
    pub scope: ScopeParams,
    pub grid: GridParams,
    /// Channels registered up front, in order.
    pub channels: Vec<ChannelSpec>,
    /// Demo producers driven by the viewer.
    pub generators: Vec<GeneratorConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub key: DataKey,
    pub name: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        let policy = RegistryPolicy::default();
        Self {
            accept_data: policy.accept_data,
            auto_commit_on_tick: true,
            accept_unregistered_keys: policy.accept_unregistered_keys,
            scope: ScopeParams::default(),
            grid: GridParams::default(),
            channels: Vec::new(),
            generators: Vec::new(),
        }
    }
}

impl GraphConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: GraphConfig = serde_json::from_str(text).context("failed to parse config")?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize config")
    }

    /// Numeric options clamped into their valid ranges.
    pub fn sanitized(&self) -> Self {
        Self {
            scope: self.scope.clamped(),
            grid: self.grid.clamped(),
            generators: self
                .generators
                .iter()
                .map(|g| GeneratorConfig {
                    params: g.params.sanitized(),
                    ..g.clone()
                })
                .collect(),
            ..self.clone()
        }
    }

    pub fn policy(&self) -> RegistryPolicy {
        RegistryPolicy {
            accept_data: self.accept_data,
            accept_unregistered_keys: self.accept_unregistered_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MIN_EXTENT;

    #[test]
    fn defaults_match_a_fresh_graph() {
        let config = GraphConfig::default();
        assert!(config.accept_data);
        assert!(config.auto_commit_on_tick);
        assert!(!config.accept_unregistered_keys);
        assert_eq!(config.scope.width, 5.0);
        assert_eq!(config.scope.height, 200.0);
        assert!(config.scope.follow_latest);
        assert_eq!(config.grid.cell_width, 1.0);
        assert_eq!(config.grid.cell_height, 10.0);
        assert_eq!(config.grid.subdivision_x, 10);
    }

    #[test]
    fn partial_json_fills_defaults_and_clamps() {
        let config = GraphConfig::from_json(
            r#"{
                "accept_unregistered_keys": true,
                "scope": { "width": 0.0, "unsigned": true },
                "grid": { "subdivision_y": 0 },
                "channels": [ { "key": 1, "name": "speed" } ]
            }"#,
        )
        .unwrap();
        assert!(config.accept_unregistered_keys);
        assert!(config.accept_data);
        assert_eq!(config.scope.width, MIN_EXTENT);
        assert_eq!(config.scope.height, 200.0);
        assert!(config.scope.unsigned);
        assert_eq!(config.grid.subdivision_y, 1);
        assert_eq!(config.channels[0].name, "speed");
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = GraphConfig::from_json("{ \"scope\": 3 }").unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn missing_file_mentions_path() {
        let err = GraphConfig::load("/nonexistent/graph.json").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/graph.json"));
    }

    #[test]
    fn json_round_trip_keeps_policy() {
        let config = GraphConfig {
            accept_data: false,
            ..GraphConfig::default()
        };
        let back = GraphConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
        assert!(!back.policy().accept_data);
    }
}
