//! Spatium Core - semantic memory graph for the physical world
//!
//! Entities (objects, spaces, surfaces, ...) and typed directed
//! relationships between them, observed repeatedly by many devices. Repeated
//! sightings of the same thing are resolved to one record and merged.
//!
//! ```
//! use spatium_core::{Entity, EntityType, RelationType, Relationship, SemanticGraph};
//!
//! let mut graph = SemanticGraph::new();
//! let cup = graph.add_entity(Entity::new(EntityType::Object, "Cup"), true).unwrap().id;
//! let table = graph.add_entity(Entity::new(EntityType::Surface, "Table"), true).unwrap().id;
//! graph.add_relationship(Relationship::new(RelationType::On, cup, table), true).unwrap();
//!
//! let hits = graph.query_spatial(&cup, None, 1).unwrap();
//! assert_eq!(hits[0].entity.name, "Table");
//! ```

pub mod codec;
pub mod confidence;
pub mod config;
pub mod entity;
pub mod entity_store;
pub mod error;
pub mod graph;
pub mod limits;
pub mod merge;
pub mod observation;
pub mod relation;
pub mod relation_store;
pub mod resolver;
pub mod stats;
pub mod traversal;

pub use codec::{ExportDocument, ExportMetadata};
pub use confidence::{Confidence, Weight};
pub use config::GraphConfig;
pub use entity::{Entity, EntityId, EntityType, SemanticAttributes, VisualFeatures};
pub use entity_store::EntityStore;
pub use error::{Error, Result};
pub use graph::SemanticGraph;
pub use merge::{MergeEngine, Outcome};
pub use observation::{
    Extraction, ExtractionInput, Extractor, IngestReport, Observation, ObservationId, SourceType,
};
pub use relation::{RelationCategory, RelationId, RelationType, Relationship, SpatialProperties};
pub use relation_store::RelationshipStore;
pub use resolver::IdentityResolver;
pub use stats::GraphStats;
pub use traversal::{EntityContext, GraphPath, QueryEngine, SpatialHit};
