//! The semantic graph: stores, resolution, merging and queries behind one API

use crate::codec::{ExportDocument, ExportMetadata};
use crate::config::GraphConfig;
use crate::entity::{Entity, EntityId, EntityType};
use crate::entity_store::EntityStore;
use crate::error::{Error, Result};
use crate::limits::{validate_batch, validate_entity_name, validate_observation_count};
use crate::merge::{MergeEngine, Outcome};
use crate::observation::{IngestReport, Observation};
use crate::relation::{RelationId, RelationType, Relationship};
use crate::relation_store::RelationshipStore;
use crate::resolver::IdentityResolver;
use crate::stats::GraphStats;
use crate::traversal::{EntityContext, GraphPath, QueryEngine, SpatialHit};
use chrono::Utc;
use std::collections::{HashMap, HashSet};

/// In-memory semantic graph of physical entities and their relationships
///
/// All mutation goes through `&mut self`, so one instance has one writer.
/// Every write either fully applies or leaves the graph untouched.
#[derive(Debug, Clone)]
pub struct SemanticGraph {
    config: GraphConfig,
    resolver: IdentityResolver,
    merger: MergeEngine,
    entities: EntityStore,
    relationships: RelationshipStore,
}

impl Default for SemanticGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticGraph {
    /// Empty graph with default tunables
    pub fn new() -> Self {
        let config = GraphConfig::default();
        Self {
            resolver: config.resolver(),
            merger: config.merge_engine(),
            config,
            entities: EntityStore::new(),
            relationships: RelationshipStore::new(),
        }
    }

    /// Empty graph with the given tunables
    pub fn with_config(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolver: config.resolver(),
            merger: config.merge_engine(),
            config,
            entities: EntityStore::new(),
            relationships: RelationshipStore::new(),
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entity Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an entity and return the stored record
    ///
    /// With `merge`, a candidate that resolves to a stored entity is folded
    /// into it and the returned record is the merged one, carrying the stored
    /// id rather than the candidate's.
    pub fn add_entity(&mut self, entity: Entity, merge: bool) -> Result<&Entity> {
        let id = self.upsert_entity(entity, merge)?.id();
        self.entities.get(&id).ok_or(Error::EntityNotFound(id))
    }

    /// Like [`add_entity`](Self::add_entity), reporting whether a merge happened
    pub fn upsert_entity(&mut self, entity: Entity, merge: bool) -> Result<Outcome<EntityId>> {
        check_entity(&entity)?;

        if merge {
            let matched = self
                .resolver
                .find_match(&self.entities, &entity)
                .map(|existing| existing.id);

            if let Some(id) = matched {
                let merger = self.merger;
                self.entities
                    .update(&id, |existing| merger.merge_entity(existing, &entity));
                return Ok(Outcome::Merged(id));
            }
        }

        let stored = self.entities.insert(entity)?;
        Ok(Outcome::Inserted(stored.id))
    }

    pub fn get_entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// All entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn find_entities_by_type(&self, entity_type: EntityType) -> Vec<&Entity> {
        self.entities.by_type(entity_type)
    }

    /// Case-insensitive name lookup; `fuzzy` switches to substring matching
    pub fn find_entities_by_name(&self, name: &str, fuzzy: bool) -> Vec<&Entity> {
        if fuzzy {
            self.entities.by_name_fuzzy(name)
        } else {
            self.entities.by_name_exact(name)
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Relationship Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a relationship and return the stored record
    ///
    /// Both endpoints must already be stored. With `merge`, an existing edge
    /// with the same source, target and type absorbs the observation.
    pub fn add_relationship(&mut self, relationship: Relationship, merge: bool) -> Result<&Relationship> {
        let id = self.upsert_relationship(relationship, merge)?.id();
        self.relationships
            .get(&id)
            .ok_or(Error::RelationshipNotFound(id))
    }

    pub fn upsert_relationship(
        &mut self,
        relationship: Relationship,
        merge: bool,
    ) -> Result<Outcome<RelationId>> {
        check_relationship(&relationship)?;
        let merger = merge.then_some(&self.merger);
        self.relationships
            .insert(&self.entities, relationship, merger)
    }

    pub fn get_relationship(&self, id: &RelationId) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    /// All relationships in insertion order
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter()
    }

    /// Relationships filtered by source, target and type (each optional)
    pub fn get_relationships(
        &self,
        source: Option<&EntityId>,
        target: Option<&EntityId>,
        relation_type: Option<RelationType>,
    ) -> Vec<&Relationship> {
        self.relationships.query(source, target, relation_type)
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    fn engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.entities, &self.relationships)
    }

    /// See [`QueryEngine::query_spatial`]
    pub fn query_spatial(
        &self,
        entity_id: &EntityId,
        relation_type: Option<RelationType>,
        max_hops: u32,
    ) -> Result<Vec<SpatialHit<'_>>> {
        self.engine().query_spatial(entity_id, relation_type, max_hops)
    }

    /// Shortest path following `allowed` types, or the configured defaults
    pub fn find_path(
        &self,
        source: &EntityId,
        target: &EntityId,
        allowed: Option<&[RelationType]>,
    ) -> Option<GraphPath<'_>> {
        let allowed = allowed.unwrap_or(self.config.default_path_types.as_slice());
        self.engine().find_path(source, target, allowed)
    }

    /// Context within `radius` hops, or the configured default radius
    pub fn get_context(&self, entity_id: &EntityId, radius: Option<u32>) -> Result<Option<EntityContext<'_>>> {
        let radius = radius.unwrap_or(self.config.default_context_radius);
        self.engine().get_context(entity_id, radius)
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats::collect(&self.entities, &self.relationships)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ingestion
    // ─────────────────────────────────────────────────────────────────────────

    /// Ingest one observation with merging enabled
    ///
    /// The whole batch is checked before anything is written: names, batch
    /// size, ids unique within the batch, and every relationship endpoint
    /// being either a candidate of this batch or a stored entity. Candidates
    /// whose id is already stored merge into that record, unless the stored
    /// record has a different (known) entity type or relation type, which
    /// fails the batch with [`Error::DuplicateId`]. Relationship
    /// endpoints naming a candidate are rewritten to the id the candidate
    /// ended up under.
    pub fn ingest(&mut self, observation: Observation) -> Result<IngestReport> {
        self.validate_observation(&observation)?;

        let mut report = IngestReport::new(observation.id);
        let mut remap: HashMap<EntityId, EntityId> = HashMap::new();
        let merger = self.merger;

        for entity in observation.entities {
            let candidate_id = entity.id;
            let outcome = if self.entities.contains(&candidate_id) {
                self.entities
                    .update(&candidate_id, |existing| merger.merge_entity(existing, &entity));
                Outcome::Merged(candidate_id)
            } else {
                self.upsert_entity(entity, true)?
            };

            remap.insert(candidate_id, outcome.id());
            match outcome {
                Outcome::Inserted(id) => report.entities_created.push(id),
                Outcome::Merged(id) => report.entities_merged.push(id),
            }
        }

        for mut relationship in observation.relationships {
            if let Some(id) = remap.get(&relationship.source_id) {
                relationship.source_id = *id;
            }
            if let Some(id) = remap.get(&relationship.target_id) {
                relationship.target_id = *id;
            }

            if let Some(stored) = self.relationships.get(&relationship.id) {
                if stored.source_id != relationship.source_id
                    || stored.target_id != relationship.target_id
                {
                    tracing::warn!(
                        "Relationship {} re-observed between {} and {}, keeping stored endpoints {} and {}",
                        relationship.id,
                        relationship.source_id,
                        relationship.target_id,
                        stored.source_id,
                        stored.target_id
                    );
                }
            }

            let stored = self
                .relationships
                .merge_into(&relationship.id, &relationship, &merger);
            let outcome = match stored {
                Some(outcome) => outcome,
                None => self
                    .relationships
                    .insert(&self.entities, relationship, Some(&merger))?,
            };

            match outcome {
                Outcome::Inserted(id) => report.relationships_created.push(id),
                Outcome::Merged(id) => report.relationships_merged.push(id),
            }
        }

        tracing::info!(
            "Ingested observation {} from {}: {} entities created, {} merged; {} relationships created, {} merged",
            report.observation_id,
            observation.device_id,
            report.entities_created.len(),
            report.entities_merged.len(),
            report.relationships_created.len(),
            report.relationships_merged.len()
        );

        Ok(report)
    }

    fn validate_observation(&self, observation: &Observation) -> Result<()> {
        validate_batch(observation.entities.len(), observation.relationships.len())?;

        let mut candidates: HashSet<EntityId> = HashSet::new();
        for entity in &observation.entities {
            check_entity(entity)?;
            if !candidates.insert(entity.id) {
                return Err(Error::DuplicateId(entity.id.to_string()));
            }
            if let Some(stored) = self.entities.get(&entity.id) {
                if stored.entity_type.is_known()
                    && entity.entity_type.is_known()
                    && stored.entity_type != entity.entity_type
                {
                    tracing::warn!(
                        "Rejected observation {}: entity {} is stored as {}, not {}",
                        observation.id,
                        entity.id,
                        stored.entity_type,
                        entity.entity_type
                    );
                    return Err(Error::DuplicateId(entity.id.to_string()));
                }
            }
        }

        let mut relationship_ids: HashSet<RelationId> = HashSet::new();
        for relationship in &observation.relationships {
            check_relationship(relationship)?;
            if !relationship_ids.insert(relationship.id) {
                return Err(Error::DuplicateId(relationship.id.to_string()));
            }
            if let Some(stored) = self.relationships.get(&relationship.id) {
                if stored.relation_type != relationship.relation_type {
                    tracing::warn!(
                        "Rejected observation {}: relationship {} is stored as {}, not {}",
                        observation.id,
                        relationship.id,
                        stored.relation_type,
                        relationship.relation_type
                    );
                    return Err(Error::DuplicateId(relationship.id.to_string()));
                }
            }
            for endpoint in [&relationship.source_id, &relationship.target_id] {
                if !candidates.contains(endpoint) && !self.entities.contains(endpoint) {
                    tracing::warn!(
                        "Rejected observation {}: relationship {} references unknown entity {}",
                        observation.id,
                        relationship.id,
                        endpoint
                    );
                    return Err(Error::EntityNotFound(*endpoint));
                }
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export / Import
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot every record plus export metadata
    pub fn export(&self) -> ExportDocument {
        let doc = ExportDocument {
            entities: self.entities.iter().cloned().collect(),
            relationships: self.relationships.iter().cloned().collect(),
            metadata: Some(ExportMetadata {
                exported_at: Utc::now(),
                stats: self.stats(),
            }),
        };

        tracing::info!(
            "Exported {} entities and {} relationships",
            doc.entities.len(),
            doc.relationships.len()
        );
        doc
    }

    /// Rebuild a graph from an export document, keeping every id
    ///
    /// Records are inserted as-is without resolution or merging. A duplicate
    /// id, a relationship with a missing endpoint, or a record that could not
    /// be added directly (blank or overlong name, zero observation count)
    /// fails the whole import.
    pub fn import(doc: ExportDocument, config: GraphConfig) -> Result<Self> {
        let mut graph = Self::with_config(config)?;

        for entity in doc.entities {
            check_entity(&entity)?;
            graph.entities.insert(entity)?;
        }
        for relationship in doc.relationships {
            check_relationship(&relationship)?;
            graph
                .relationships
                .insert(&graph.entities, relationship, None)?;
        }

        tracing::info!(
            "Imported {} entities and {} relationships",
            graph.entities.len(),
            graph.relationships.len()
        );
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String> {
        self.export().to_json()
    }

    pub fn from_json(json: &str, config: GraphConfig) -> Result<Self> {
        Self::import(ExportDocument::from_json(json)?, config)
    }

    /// Drop every record, keeping the configuration
    pub fn clear(&mut self) {
        self.entities.clear();
        self.relationships.clear();
        tracing::debug!("Cleared graph");
    }
}

/// Record-level checks shared by inserts, ingestion and import
fn check_entity(entity: &Entity) -> Result<()> {
    validate_entity_name(&entity.name)?;
    validate_observation_count(&entity.id.to_string(), entity.observation_count)?;
    Ok(())
}

fn check_relationship(relationship: &Relationship) -> Result<()> {
    validate_observation_count(&relationship.id.to_string(), relationship.observation_count)?;
    Ok(())
}
