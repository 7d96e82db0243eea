//! Tunables for identity resolution, merging and queries

use crate::confidence::Weight;
use crate::error::{Error, Result};
use crate::limits::validate_hops;
use crate::merge::MergeEngine;
use crate::relation::RelationType;
use crate::resolver::{IdentityResolver, DEFAULT_MATCH_THRESHOLD, DEFAULT_TAG_OVERLAP};
use serde::{Deserialize, Serialize};

/// Graph configuration
///
/// Every field has a default, so a partial TOML/JSON table is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Blend factor for a repeated entity observation
    #[serde(default)]
    pub entity_merge_weight: Weight,

    /// Reinforcement factor for a repeated relationship observation
    #[serde(default)]
    pub relationship_merge_weight: Weight,

    /// Cosine similarity an embedding pair must exceed to match
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,

    /// Jaccard overlap a tag pair must exceed to match
    #[serde(default = "default_tag_overlap")]
    pub tag_overlap_threshold: f64,

    #[serde(default = "default_context_radius")]
    pub default_context_radius: u32,

    /// Relation types `find_path` follows when the caller does not say
    #[serde(default = "default_path_types")]
    pub default_path_types: Vec<RelationType>,
}

fn default_match_threshold() -> f32 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_tag_overlap() -> f64 {
    DEFAULT_TAG_OVERLAP
}

fn default_context_radius() -> u32 {
    2
}

fn default_path_types() -> Vec<RelationType> {
    RelationType::DEFAULT_PATH_TYPES.to_vec()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            entity_merge_weight: Weight::default(),
            relationship_merge_weight: Weight::default(),
            match_threshold: default_match_threshold(),
            tag_overlap_threshold: default_tag_overlap(),
            default_context_radius: default_context_radius(),
            default_path_types: default_path_types(),
        }
    }
}

impl GraphConfig {
    /// Check ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.match_threshold) {
            return Err(Error::validation(format!(
                "match_threshold {} is out of range [-1.0, 1.0]",
                self.match_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.tag_overlap_threshold) {
            return Err(Error::validation(format!(
                "tag_overlap_threshold {} is out of range [0.0, 1.0]",
                self.tag_overlap_threshold
            )));
        }
        validate_hops(self.default_context_radius)?;
        if self.default_path_types.is_empty() {
            return Err(Error::validation("default_path_types cannot be empty"));
        }
        Ok(())
    }

    pub fn resolver(&self) -> IdentityResolver {
        IdentityResolver::new(self.match_threshold, self.tag_overlap_threshold)
    }

    pub fn merge_engine(&self) -> MergeEngine {
        MergeEngine::new(self.entity_merge_weight, self.relationship_merge_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.entity_merge_weight.value(), 0.3);
        assert_eq!(config.relationship_merge_weight.value(), 0.3);
        assert_eq!(config.match_threshold, 0.7);
        assert_eq!(config.default_context_radius, 2);
        assert_eq!(config.default_path_types.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: GraphConfig =
            serde_json::from_str(r#"{"match_threshold":0.9,"default_path_types":["on","in"]}"#)
                .unwrap();
        assert_eq!(config.match_threshold, 0.9);
        assert_eq!(config.default_path_types, vec![RelationType::On, RelationType::In]);
        assert_eq!(config.entity_merge_weight.value(), 0.3);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(serde_json::from_str::<GraphConfig>(r#"{"entity_merge_weight":1.5}"#).is_err());

        let config = GraphConfig {
            default_context_radius: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = GraphConfig {
            default_path_types: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
