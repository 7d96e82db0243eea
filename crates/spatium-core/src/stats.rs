//! Graph summary statistics

use crate::entity::EntityType;
use crate::entity_store::EntityStore;
use crate::relation_store::RelationshipStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts and density of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_entities: usize,
    pub total_relationships: usize,

    /// Only types with at least one entity appear
    #[serde(default)]
    pub entities_by_type: BTreeMap<EntityType, usize>,

    pub spatial_relationships: usize,

    /// `|E| / (|V| * (|V| - 1))`, 0 for fewer than two entities
    pub graph_density: f64,
}

impl GraphStats {
    pub fn collect(entities: &EntityStore, relationships: &RelationshipStore) -> Self {
        let total_entities = entities.len();
        let total_relationships = relationships.len();

        Self {
            total_entities,
            total_relationships,
            entities_by_type: entities.type_counts().collect(),
            spatial_relationships: relationships.iter().filter(|r| r.is_spatial()).count(),
            graph_density: density(total_entities, total_relationships),
        }
    }
}

fn density(nodes: usize, edges: usize) -> f64 {
    if nodes < 2 {
        return 0.0;
    }
    let n = nodes as f64;
    edges as f64 / (n * (n - 1.0))
}
