//! CLI configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use spatium_core::{GraphConfig, RelationType, Weight};

/// Default config file location
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spatium")
        .join("config.toml")
}

/// Default graph file location
pub fn default_graph_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spatium")
        .join("graph.json")
}

/// Configuration for the CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Graph file used when `--graph` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_file: Option<PathBuf>,

    #[serde(default)]
    pub graph: GraphConfig,
}

const KEYS: &[&str] = &[
    "graph_file",
    "entity_merge_weight",
    "relationship_merge_weight",
    "match_threshold",
    "tag_overlap_threshold",
    "default_context_radius",
    "default_path_types",
];

impl Config {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.graph.validate()?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        KEYS
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let graph = &self.graph;
        let value = match key {
            "graph_file" => self.graph_file.as_ref()?.display().to_string(),
            "entity_merge_weight" => graph.entity_merge_weight.value().to_string(),
            "relationship_merge_weight" => graph.relationship_merge_weight.value().to_string(),
            "match_threshold" => graph.match_threshold.to_string(),
            "tag_overlap_threshold" => graph.tag_overlap_threshold.to_string(),
            "default_context_radius" => graph.default_context_radius.to_string(),
            "default_path_types" => graph
                .default_path_types
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(","),
            _ => return None,
        };
        Some(value)
    }

    /// Parse and set one key; the resulting configuration must validate
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut updated = self.clone();
        let graph = &mut updated.graph;

        match key {
            "graph_file" => updated.graph_file = Some(PathBuf::from(value)),
            "entity_merge_weight" => graph.entity_merge_weight = Weight::new(value.parse()?)?,
            "relationship_merge_weight" => {
                graph.relationship_merge_weight = Weight::new(value.parse()?)?
            }
            "match_threshold" => graph.match_threshold = value.parse()?,
            "tag_overlap_threshold" => graph.tag_overlap_threshold = value.parse()?,
            "default_context_radius" => graph.default_context_radius = value.parse()?,
            "default_path_types" => {
                graph.default_path_types = value
                    .split(',')
                    .map(|s| s.trim().parse::<RelationType>())
                    .collect::<Result<_, _>>()?
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Available keys: {}",
                key,
                KEYS.join(", ")
            ),
        }

        updated.graph.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("none.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("graph_file", "/tmp/graph.json").unwrap();
        config.set("match_threshold", "0.85").unwrap();
        config.set("default_path_types", "on, in").unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.get("default_path_types").unwrap(), "on,in");
    }

    #[test]
    fn test_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[graph]\ndefault_context_radius = 3\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.graph.default_context_radius, 3);
        assert_eq!(config.graph.match_threshold, 0.7);
        assert!(config.graph_file.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        assert!(config.set("entity_merge_weight", "1.5").is_err());
        assert!(config.set("default_context_radius", "0").is_err());
        assert!(config.set("default_path_types", "on,floating").is_err());
        assert!(config.set("colour", "red").is_err());
        assert_eq!(config, Config::default());
    }
}
